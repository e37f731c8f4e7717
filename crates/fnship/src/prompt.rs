//! Terminal prompts

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use fnship_cloud::{CloudError, Prompter, Result};

/// [`Prompter`] backed by interactive terminal menus.
///
/// Esc or `q` cancels a prompt, which aborts the deploy.
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn choose_one(&self, label: &str, options: &[String]) -> Result<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(label)
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(|e| CloudError::Prompt(e.to_string()))?
            .ok_or(CloudError::UserAborted)
    }

    fn confirm(&self, label: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(label)
            .default(true)
            .interact_opt()
            .map_err(|e| CloudError::Prompt(e.to_string()))?
            .ok_or(CloudError::UserAborted)
    }
}
