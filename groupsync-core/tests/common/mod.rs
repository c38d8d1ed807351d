/*
    Shared fixtures for the integration suites

    A "test node" bundles one node's adapter, event producer and
    synchronizer over a store and property table that tests may share
    between nodes.
*/

#![allow(dead_code)]

use async_trait::async_trait;
use groupsync_core::config::GroupProperties;
use groupsync_core::events::{BroadcastProducer, ClusterEvent, SwitchStatus};
use groupsync_core::filter::PropertyAccessFilter;
use groupsync_core::model::{RepositoryRef, ResourceRef, ResourceState};
use groupsync_core::policy::SyncPolicyResolver;
use groupsync_core::store::{MemoryStore, SharedStateStore, StoreError, StoreResult};
use groupsync_core::sync::{MemoryResourceAdapter, Synchronizer};
use groupsync_core::{Group, Node};
use std::sync::Arc;
use tokio::sync::broadcast;

pub use groupsync_core::sync::LocalResourceAdapter;

pub const CATEGORY: &str = "features";

pub struct TestNode {
    pub node: Node,
    pub adapter: Arc<MemoryResourceAdapter>,
    pub producer: Arc<BroadcastProducer>,
    pub sync: Arc<Synchronizer<MemoryResourceAdapter>>,
}

pub fn properties(pairs: &[(&str, &str)]) -> Arc<GroupProperties> {
    let props = GroupProperties::new();
    for (key, value) in pairs {
        props.set(*key, *value).unwrap();
    }
    Arc::new(props)
}

pub fn test_node(
    host: &str,
    port: u16,
    store: Arc<dyn SharedStateStore>,
    props: Arc<GroupProperties>,
) -> TestNode {
    test_node_with_switch(host, port, store, props, SwitchStatus::On)
}

pub fn test_node_with_switch(
    host: &str,
    port: u16,
    store: Arc<dyn SharedStateStore>,
    props: Arc<GroupProperties>,
    status: SwitchStatus,
) -> TestNode {
    let node = Node::new(host, port);
    let adapter = Arc::new(MemoryResourceAdapter::new(CATEGORY));
    let producer = Arc::new(BroadcastProducer::new(64, status));
    let sync = Arc::new(Synchronizer::new(
        adapter.clone(),
        store,
        Arc::new(PropertyAccessFilter::new(props.clone())),
        producer.clone(),
        SyncPolicyResolver::new(props),
        node.clone(),
    ));
    TestNode {
        node,
        adapter,
        producer,
        sync,
    }
}

pub fn repo(uri: &str) -> RepositoryRef {
    RepositoryRef::parse(uri).unwrap()
}

pub fn resource(name: &str, version: &str) -> ResourceRef {
    ResourceRef::new(name, version)
}

pub fn group(name: &str, nodes: &[&Node]) -> Group {
    nodes.iter().fold(Group::new(name), |g, n| g.with_node((*n).clone()))
}

/// Everything currently buffered for `rx`
pub fn drain(rx: &mut broadcast::Receiver<ClusterEvent>) -> Vec<ClusterEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Store that fails reads for one map entry or for one whole key
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_entry: Option<String>,
    failing_key: Option<String>,
}

impl FlakyStore {
    /// `map_get` fails for `entry`
    pub fn failing_entry(entry: &str) -> Self {
        Self {
            failing_entry: Some(entry.to_string()),
            ..Self::default()
        }
    }

    /// `list` and `map_entries` fail for `key`
    pub fn failing_key(key: &str) -> Self {
        Self {
            failing_key: Some(key.to_string()),
            ..Self::default()
        }
    }

    fn check_key(&self, key: &str) -> StoreResult<()> {
        if self.failing_key.as_deref() == Some(key) {
            return Err(StoreError::Unavailable(format!("partition while reading {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedStateStore for FlakyStore {
    async fn list(&self, key: &str) -> StoreResult<Vec<String>> {
        self.check_key(key)?;
        self.inner.list(key).await
    }

    async fn list_append_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        self.inner.list_append_if_absent(key, value).await
    }

    async fn map_entries(&self, key: &str) -> StoreResult<Vec<(String, ResourceState)>> {
        self.check_key(key)?;
        self.inner.map_entries(key).await
    }

    async fn map_get(&self, key: &str, entry: &str) -> StoreResult<Option<ResourceState>> {
        if self.failing_entry.as_deref() == Some(entry) {
            return Err(StoreError::Unavailable(format!("partition while reading {}", entry)));
        }
        self.inner.map_get(key, entry).await
    }

    async fn map_put(&self, key: &str, entry: &str, state: ResourceState) -> StoreResult<()> {
        self.inner.map_put(key, entry, state).await
    }
}
