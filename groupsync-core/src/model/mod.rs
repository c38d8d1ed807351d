/*
    model - Values shared between nodes

    ResourceRef / ResourceState describe one synchronizable unit and its
    last-pushed status. RepositoryRef names a source of resources.
*/

mod repository;
mod resource;

pub use repository::RepositoryRef;
pub use resource::{normalize_installed, ResourceRef, ResourceState};

use thiserror::Error;

/// Errors raised while parsing references
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Malformed repository URI: {0}")]
    MalformedUri(String),

    #[error("Malformed resource key: {0}")]
    MalformedKey(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
