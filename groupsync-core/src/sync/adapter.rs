//! Capability interface over the concrete resource type being synchronized
//!
//! One implementation per resource kind (features, bundles, configuration
//! items). The reconciliation engine is generic over this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{RepositoryRef, ResourceRef};

/// Errors reported by a local resource manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The manager refused the operation
    #[error("Operation rejected: {0}")]
    Rejected(String),

    /// The resource or repository is not known locally
    #[error("Not found: {0}")]
    NotFound(String),

    /// The manager could not be reached
    #[error("Resource manager unavailable: {0}")]
    Unavailable(String),

    /// The persisted manifest could not be read or written
    #[error("Manifest error: {0}")]
    Manifest(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Manifest(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Manifest(err.to_string())
    }
}

/// A locally known resource and whether it is installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalResource {
    pub resource: ResourceRef,
    pub installed: bool,
}

impl LocalResource {
    pub fn new(resource: ResourceRef, installed: bool) -> Self {
        Self {
            resource,
            installed,
        }
    }
}

/// Local resource manager, as seen by the synchronizer
#[async_trait]
pub trait LocalResourceAdapter: Send + Sync {
    /// Category segment used in property keys and store keys, e.g. `features`
    fn category(&self) -> &str;

    async fn list_repositories(&self) -> AdapterResult<Vec<RepositoryRef>>;

    async fn list_resources(&self) -> AdapterResult<Vec<LocalResource>>;

    async fn add_repository(&self, repository: &RepositoryRef) -> AdapterResult<()>;

    async fn remove_repository(&self, repository: &RepositoryRef) -> AdapterResult<()>;

    async fn install(&self, resource: &ResourceRef) -> AdapterResult<()>;

    async fn uninstall(&self, resource: &ResourceRef) -> AdapterResult<()>;

    async fn is_registered_locally(&self, repository: &RepositoryRef) -> bool;

    /// `None` when the manager cannot tell, e.g. the resource is unknown
    async fn is_installed_locally(&self, resource: &ResourceRef) -> Option<bool>;
}
