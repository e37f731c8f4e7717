use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Home directory not found; set FNSHIP_CONFIG_PATH")]
    HomeDirNotFound,

    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to write settings to {path}: {source}")]
    Save {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to render settings: {0}")]
    Render(serde_yaml::Error),

    #[error("Unknown setting '{key}' (known: {known})")]
    UnknownKey { key: String, known: String },

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error(
        "Project manifest not found: {}\n\
        Run fnship from a project directory or pass its path",
        .0.display()
    )]
    ManifestNotFound(PathBuf),

    #[error("Invalid project manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Project manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
