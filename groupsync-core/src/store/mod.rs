/*
    store - Cluster-wide shared state

    Two primitives, both namespaced per group as `<logical-name>::<group>`:
    - ordered lists of strings (repository URIs)
    - maps of `name/version` -> ResourceState

    Single-key reads and writes are atomic. Nothing spans keys, so concurrent
    writers resolve as last-writer-wins per entry.
*/

pub mod errors;
pub mod memory_store;

pub use errors::{StoreError, StoreResult};
pub use memory_store::{MemoryStore, StoreSnapshot, StoreStats};

use async_trait::async_trait;

use crate::model::ResourceState;

/// Namespace separator between logical name and group
pub const SEPARATOR: &str = "::";

const KEY_PREFIX: &str = "groupsync";

/// Shared list of repository URIs for `category` in `group`
pub fn repositories_key(category: &str, group: &str) -> String {
    format!("{KEY_PREFIX}.{category}.repositories{SEPARATOR}{group}")
}

/// Shared resource-state map for `category` in `group`
pub fn resources_key(category: &str, group: &str) -> String {
    format!("{KEY_PREFIX}.{category}.resources{SEPARATOR}{group}")
}

/// Narrow view of the distributed map/list substrate
///
/// Every method touches exactly one key. Implementations must make each
/// call atomic with respect to that key; callers never assume atomicity
/// across calls.
#[async_trait]
pub trait SharedStateStore: Send + Sync {
    /// Current contents of a list; empty if it was never written
    async fn list(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Append `value` unless an equal string is already present.
    /// Returns whether it was appended.
    async fn list_append_if_absent(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// All entries of a map, ordered by entry key
    async fn map_entries(&self, key: &str) -> StoreResult<Vec<(String, ResourceState)>>;

    async fn map_get(&self, key: &str, entry: &str) -> StoreResult<Option<ResourceState>>;

    /// Replace one entry's whole value
    async fn map_put(&self, key: &str, entry: &str, state: ResourceState) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_group_scoped() {
        assert_eq!(
            repositories_key("features", "default"),
            "groupsync.features.repositories::default"
        );
        assert_eq!(resources_key("features", "edge"), "groupsync.features.resources::edge");
        assert_ne!(resources_key("features", "a"), resources_key("bundles", "a"));
    }
}
