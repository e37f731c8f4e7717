//! Local settings store
//!
//! Settings live in a single YAML file (`~/.fnship.yaml` unless
//! `FNSHIP_CONFIG_PATH` says otherwise). Any key can be overridden with an
//! `FNSHIP_<KEY>` environment variable, e.g. `FNSHIP_REGION=eu-west-1`.

use crate::error::{ConfigError, Result};
use config::{Config, Environment, File, FileFormat, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "FNSHIP_CONFIG_PATH";
pub const CONFIG_FILE_NAME: &str = ".fnship.yaml";
pub const ENV_PREFIX: &str = "FNSHIP";

pub const DEFAULT_RUNTIME: &str = "python3.9";

/// Keys accepted by `fnship config set`
pub const KEYS: &[&str] = &[
    "deployment_type",
    "runtime",
    "rest_api_id",
    "region",
    "gcp_project",
    "follow_ups",
    "wait_timeout_secs",
    "debug",
];

/// Which function platform a project deploys to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentType {
    #[default]
    AwsLambda,
    GoogleCloudFunction,
}

impl DeploymentType {
    pub const ALL: [DeploymentType; 2] = [Self::AwsLambda, Self::GoogleCloudFunction];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsLambda => "aws-lambda",
            Self::GoogleCloudFunction => "google-cloud-function",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "expected one of: {}",
                    Self::ALL.map(|t| t.as_str()).join(", ")
                )
            })
    }
}

/// Persisted defaults, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub deployment_type: DeploymentType,
    pub runtime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_api_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp_project: Option<String>,
    /// Opt-in post-create hooks, by id
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timeout_secs: Option<u64>,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deployment_type: DeploymentType::default(),
            runtime: DEFAULT_RUNTIME.to_string(),
            rest_api_id: None,
            region: None,
            gcp_project: None,
            follow_ups: Vec::new(),
            wait_timeout_secs: None,
            debug: false,
        }
    }
}

fn file_source(path: &Path) -> impl Source + Send + Sync + 'static {
    File::from(path.to_path_buf())
        .format(FileFormat::Yaml)
        .required(false)
}

/// Resolve the settings file path
///
/// `FNSHIP_CONFIG_PATH` wins; otherwise `~/.fnship.yaml`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::HomeDirNotFound)
}

impl Settings {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load from `path` (optional) layered under `FNSHIP_*` variables
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading settings from {}", path.display());

        let settings = Config::builder()
            .add_source(file_source(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("follow_ups"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Change one key in the settings file at `path`.
    ///
    /// Only the file is read back, so `FNSHIP_*` overrides are never persisted.
    pub fn store(path: &Path, key: &str, value: &str) -> Result<Self> {
        let mut settings: Self = Config::builder()
            .add_source(file_source(path))
            .build()?
            .try_deserialize()?;
        settings.set(key, value)?;
        settings.save_to(path)?;
        Ok(settings)
    }

    /// Write to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|source| ConfigError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, yaml)?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Set one key from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        match key {
            "deployment_type" => self.deployment_type = value.parse().map_err(invalid)?,
            "runtime" => {
                self.runtime = optional(value)
                    .ok_or_else(|| invalid("must not be empty".to_string()))?
            }
            "rest_api_id" => self.rest_api_id = optional(value),
            "region" => self.region = optional(value),
            "gcp_project" => self.gcp_project = optional(value),
            "follow_ups" => {
                self.follow_ups = value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "wait_timeout_secs" => {
                self.wait_timeout_secs = match optional(value) {
                    Some(secs) => Some(secs.parse().map_err(|e| invalid(format!("{}", e)))?),
                    None => None,
                }
            }
            "debug" => self.debug = value.parse().map_err(|e| invalid(format!("{}", e)))?,
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                    known: KEYS.join(", "),
                });
            }
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_secs.map(Duration::from_secs)
    }

    /// Render as YAML for `fnship config show`
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ConfigError::Render)
    }
}
