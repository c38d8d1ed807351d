use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group already exists: {0}")]
    GroupExists(String),

    #[error("Invalid group name: {0}")]
    InvalidGroupName(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid node address: {0}")]
    InvalidNode(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
