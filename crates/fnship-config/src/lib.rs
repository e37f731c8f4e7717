//! fnship configuration
//!
//! Two sources feed a deploy: the user's settings store (`~/.fnship.yaml`
//! plus `FNSHIP_*` environment overrides) and the per-project `fnship.yaml`
//! manifest.

pub mod error;
pub mod manifest;
pub mod settings;

pub use error::*;
pub use manifest::{MANIFEST_FILE, ProjectManifest};
pub use settings::{DeploymentType, KEYS, Settings, config_path};
