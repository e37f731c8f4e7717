//! Deployment targets and remote resources

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Default module that holds the entry point
pub const DEFAULT_HANDLER_MODULE: &str = "main";

/// The function to deploy. Built once per deploy and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    /// Function name in the cloud account
    pub name: String,

    /// Directory whose contents are shipped
    pub source_dir: PathBuf,

    /// Runtime identifier (e.g. "python3.9")
    pub runtime: String,

    /// Entry-point symbol inside the handler module
    pub entry_point: String,

    /// Module containing the entry point
    #[serde(default = "default_handler_module")]
    pub handler_module: String,

    /// Explicit execution identity (role ARN / service account)
    #[serde(default)]
    pub execution_role: Option<String>,
}

fn default_handler_module() -> String {
    DEFAULT_HANDLER_MODULE.to_string()
}

impl DeploymentTarget {
    pub fn new(
        name: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        runtime: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            runtime: runtime.into(),
            entry_point: entry_point.into(),
            handler_module: default_handler_module(),
            execution_role: None,
        }
    }

    pub fn with_handler_module(mut self, module: impl Into<String>) -> Self {
        self.handler_module = module.into();
        self
    }

    pub fn with_execution_role(mut self, role: impl Into<String>) -> Self {
        self.execution_role = Some(role.into());
        self
    }

    /// `<module>.<entry_point>`
    pub fn handler(&self) -> String {
        format!("{}.{}", self.handler_module, self.entry_point)
    }
}

/// Kind of remote resource the orchestrator manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Function,
    RoutingResource,
    ExecutionIdentity,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Function => "function",
            ResourceKind::RoutingResource => "routing resource",
            ResourceKind::ExecutionIdentity => "execution identity",
        };
        write!(f, "{}", label)
    }
}

/// What the last probe said
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Existence {
    #[default]
    Unknown,
    Absent,
    Present,
}

impl From<bool> for Existence {
    fn from(exists: bool) -> Self {
        if exists {
            Existence::Present
        } else {
            Existence::Absent
        }
    }
}

/// A resource in the cloud account, as last observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub kind: ResourceKind,
    pub name: String,
    pub remote_id: Option<String>,
    pub existence: Existence,
}

impl RemoteResource {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            remote_id: None,
            existence: Existence::Unknown,
        }
    }

    /// A resource confirmed to exist
    pub fn present(kind: ResourceKind, name: impl Into<String>, remote_id: Option<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            remote_id,
            existence: Existence::Present,
        }
    }

    /// A resource confirmed to be missing
    pub fn absent(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            remote_id: None,
            existence: Existence::Absent,
        }
    }

    pub fn exists(&self) -> bool {
        self.existence == Existence::Present
    }

    /// Remote id if known, the logical name otherwise
    pub fn id_or_name(&self) -> &str {
        self.remote_id.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for RemoteResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.remote_id {
            Some(id) if id != &self.name => write!(f, "{} {} ({})", self.kind, self.name, id),
            _ => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Listed candidates for an account-scoped resource
///
/// Names are kept in lexicographic order. A repeated name keeps the last id
/// seen in the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    entries: BTreeMap<String, String>,
    well_known_present: bool,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, id)` pairs, flagging `well_known` if listed
    pub fn from_pairs<I>(pairs: I, well_known: &str) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut set = Self::new();
        for (name, id) in pairs {
            if name == well_known {
                set.well_known_present = true;
            }
            set.entries.insert(name, id);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the well-known resource is among the candidates
    pub fn well_known_present(&self) -> bool {
        self.well_known_present
    }

    /// Names in presentation order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| v.as_str() == id)
            .map(|(k, _)| k.as_str())
    }
}
