//! Project manifest (`fnship.yaml`)

use crate::error::{ConfigError, Result};
use crate::settings::{DeploymentType, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "fnship.yaml";

/// Per-project description of the function to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<DeploymentType>,
}

impl ProjectManifest {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Read and validate `fnship.yaml` from a project directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Err(ConfigError::ManifestNotFound(path));
        }

        tracing::debug!("Loading manifest {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        let manifest: Self = serde_yaml::from_str(&content).map_err(|source| {
            ConfigError::Manifest {
                path: path.clone(),
                source,
            }
        })?;
        manifest.validate(&path)?;
        Ok(manifest)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| ConfigError::InvalidManifest {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.name.contains(char::is_whitespace) {
            return Err(invalid("name must not contain whitespace"));
        }
        if self.entry_point.trim().is_empty() {
            return Err(invalid("entry_point must not be empty"));
        }
        Ok(())
    }

    /// Manifest runtime, else the configured default
    pub fn runtime_or<'a>(&'a self, settings: &'a Settings) -> &'a str {
        self.runtime.as_deref().unwrap_or(settings.runtime.as_str())
    }

    /// Manifest platform, else the configured default
    pub fn deployment_type_or(&self, settings: &Settings) -> DeploymentType {
        self.deployment_type.unwrap_or(settings.deployment_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_manifest(content: &str) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(MANIFEST_FILE), content).unwrap();
        temp_dir
    }

    #[test]
    fn test_load_minimal_manifest() {
        let dir = write_manifest("name: hello\nentry_point: handler\n");

        let manifest = ProjectManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name, "hello");
        assert_eq!(manifest.entry_point, "handler");
        assert!(manifest.handler_module.is_none());

        let settings = Settings::default();
        assert_eq!(manifest.runtime_or(&settings), "python3.9");
        assert_eq!(
            manifest.deployment_type_or(&settings),
            DeploymentType::AwsLambda
        );
    }

    #[test]
    fn test_manifest_overrides_settings() {
        let dir = write_manifest(
            "name: hello\n\
             entry_point: handler\n\
             runtime: python3.12\n\
             handler_module: app\n\
             execution_role: arn:aws:iam::123456789012:role/custom\n\
             deployment_type: google-cloud-function\n",
        );

        let manifest = ProjectManifest::load(dir.path()).unwrap();
        let settings = Settings::default();
        assert_eq!(manifest.runtime_or(&settings), "python3.12");
        assert_eq!(manifest.handler_module.as_deref(), Some("app"));
        assert_eq!(
            manifest.deployment_type_or(&settings),
            DeploymentType::GoogleCloudFunction
        );
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = ProjectManifest::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ManifestNotFound(_)));
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = write_manifest("name: [not, a, name]\n");
        assert!(matches!(
            ProjectManifest::load(dir.path()),
            Err(ConfigError::Manifest { .. })
        ));

        let dir = write_manifest("name: my function\nentry_point: handler\n");
        assert!(matches!(
            ProjectManifest::load(dir.path()),
            Err(ConfigError::InvalidManifest { .. })
        ));

        let dir = write_manifest("name: hello\nentry_point: ''\n");
        assert!(matches!(
            ProjectManifest::load(dir.path()),
            Err(ConfigError::InvalidManifest { .. })
        ));
    }
}
