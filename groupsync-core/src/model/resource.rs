use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ModelError, ModelResult};

/// Identity of one resource instance: `(name, version)`
///
/// Used as a shared map key through its canonical `name/version` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
    pub version: String,
}

impl ResourceRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Canonical `name/version` key
    pub fn key(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Parse a canonical key. The version is everything after the last `/`.
    pub fn from_key(key: &str) -> ModelResult<Self> {
        match key.rsplit_once('/') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(ModelError::MalformedKey(key.to_string())),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Last-pushed status of one resource in a group
///
/// `installed` is tri-state: `None` means no node has reported a status yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource: ResourceRef,
    pub installed: Option<bool>,
}

impl ResourceState {
    pub fn new(resource: ResourceRef, installed: Option<bool>) -> Self {
        Self {
            resource,
            installed,
        }
    }

    pub fn reported(resource: ResourceRef, installed: bool) -> Self {
        Self::new(resource, Some(installed))
    }

    /// Installed flag with unknown read as not installed
    pub fn is_installed(&self) -> bool {
        normalize_installed(self.installed)
    }
}

/// Collapse a tri-state installed flag for comparison.
///
/// Unknown reads as "not installed". This is the only place the collapse
/// happens: pull never installs a resource whose cluster status is unknown,
/// and push never rewrites an unknown entry to an explicit `false` (which
/// would broadcast an uninstall nobody asked for).
pub fn normalize_installed(flag: Option<bool>) -> bool {
    flag.unwrap_or(false)
}
