use crate::ConfigCommands;
use colored::Colorize;
use fnship_config::{Settings, config_path};

pub fn handle(cmd: ConfigCommands, settings: &Settings) -> anyhow::Result<()> {
    let path = config_path()?;

    match cmd {
        ConfigCommands::Show => {
            println!("{} {}", "#".dimmed(), path.display().to_string().dimmed());
            print!("{}", settings.to_yaml()?);
        }
        ConfigCommands::Set { key, value } => {
            Settings::store(&path, &key, &value)?;
            println!(
                "{} {} = {}",
                "✓".green().bold(),
                key.cyan(),
                if value.is_empty() { "(unset)" } else { value.as_str() }
            );
        }
    }

    Ok(())
}
