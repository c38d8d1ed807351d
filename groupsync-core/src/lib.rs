//! groupsync - per-group reconciliation of local resource state with a
//! shared cluster-wide view.
//!
//! Each node decides, per group, whether to pull the cluster's state into
//! itself, push its own state to the cluster, both, or neither. See
//! [`sync::Synchronizer`] for the engine and [`policy`] for how the decision
//! is made.

pub mod cluster;
pub mod config;
pub mod events;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod store;
pub mod sync;

pub use cluster::{ClusterManager, Group, GroupManager, Node};
pub use config::{GroupProperties, NodeConfig, PropertySource};
pub use events::{
    BroadcastProducer, ClusterEvent, EventKind, EventProducer, ResourceEventHandler, SwitchStatus,
};
pub use filter::{AccessFilter, AllowAll, Direction, PropertyAccessFilter};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use model::{normalize_installed, RepositoryRef, ResourceRef, ResourceState};
pub use policy::{PolicyResolution, SyncPolicy, SyncPolicyResolver};
pub use store::{MemoryStore, SharedStateStore};
pub use sync::{LocalResourceAdapter, MemoryResourceAdapter, Synchronizer, SyncReport};
