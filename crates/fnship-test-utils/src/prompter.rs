//! Scripted operator answers.

use fnship_cloud::{CloudError, Prompter, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A prompt shown to the fake operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented {
    /// Prompt label.
    pub label: String,
    /// Options in presentation order (empty for confirmations).
    pub options: Vec<String>,
}

/// Answers prompts from queues. An empty queue aborts like Ctrl-C would.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    choices: Mutex<VecDeque<String>>,
    confirms: Mutex<VecDeque<bool>>,
    presented: Mutex<Vec<Presented>>,
}

impl ScriptedPrompter {
    /// Creates a prompter with no queued answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a selection by option label.
    pub fn pick(self, option: &str) -> Self {
        self.choices.lock().unwrap().push_back(option.to_string());
        self
    }

    /// Queue a yes/no answer.
    pub fn answer(self, yes: bool) -> Self {
        self.confirms.lock().unwrap().push_back(yes);
        self
    }

    /// Everything that was shown, in order.
    pub fn presented(&self) -> Vec<Presented> {
        self.presented.lock().unwrap().clone()
    }

    /// Options of the most recent selection prompt.
    pub fn last_options(&self) -> Option<Vec<String>> {
        self.presented
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|p| !p.options.is_empty())
            .map(|p| p.options.clone())
    }
}

impl Prompter for ScriptedPrompter {
    fn choose_one(&self, label: &str, options: &[String]) -> Result<usize> {
        self.presented.lock().unwrap().push(Presented {
            label: label.to_string(),
            options: options.to_vec(),
        });
        let choice = self
            .choices
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CloudError::UserAborted)?;
        options
            .iter()
            .position(|o| *o == choice)
            .ok_or_else(|| CloudError::Prompt(format!("`{choice}` was not offered")))
    }

    fn confirm(&self, label: &str) -> Result<bool> {
        self.presented.lock().unwrap().push(Presented {
            label: label.to_string(),
            options: Vec::new(),
        });
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CloudError::UserAborted)
    }
}
