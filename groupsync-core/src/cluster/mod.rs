//! Cluster membership and group bookkeeping
//!
//! The reconciliation engine only reads groups; this module owns them.

mod error;
mod groups;
mod manager;
mod node;

pub use error::{ClusterError, ClusterResult};
pub use groups::GroupManager;
pub use manager::ClusterManager;
pub use node::{Group, Node};
