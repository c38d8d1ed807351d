//! Two nodes sharing one in-memory store
//!
//! Node A publishes its resources, node B pulls them and also applies A's
//! events through its handler.
//!
//! Run with:
//! ```bash
//! cargo run --example two_node_sync
//! ```

use groupsync_core::cluster::{ClusterManager, GroupManager};
use groupsync_core::events::{BroadcastProducer, ResourceEventHandler};
use groupsync_core::filter::PropertyAccessFilter;
use groupsync_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use groupsync_core::model::{RepositoryRef, ResourceRef};
use groupsync_core::policy::SyncPolicyResolver;
use groupsync_core::store::MemoryStore;
use groupsync_core::sync::{LocalResourceAdapter, MemoryResourceAdapter, Synchronizer};
use groupsync_core::{GroupProperties, Node};
use std::sync::Arc;
use tracing::info;

const PROPERTIES: &str = r#"
[default.features]
sync = "cluster"

[default.features.blacklist]
inbound = ["internal-*"]
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_with_config(LogConfig::new(LogLevel::Debug).with_target(false))?;

    let props = Arc::new(GroupProperties::from_toml_str(PROPERTIES)?);
    let store = Arc::new(MemoryStore::new());
    let (a, b) = (Node::new("node-a", 5701), Node::new("node-b", 5701));

    let producer_a = Arc::new(BroadcastProducer::default());
    let adapter_a = Arc::new(MemoryResourceAdapter::new("features"));
    adapter_a.put_repository(RepositoryRef::parse("mvn:org.acme/features/1.0/xml")?).await;
    adapter_a.put_resource(ResourceRef::new("webconsole", "1.0"), Some(true)).await;
    adapter_a.put_resource(ResourceRef::new("internal-probe", "0.3"), Some(true)).await;

    let adapter_b = Arc::new(MemoryResourceAdapter::new("features"));
    adapter_b.put_resource(ResourceRef::new("webconsole", "1.0"), Some(false)).await;
    adapter_b.put_resource(ResourceRef::new("internal-probe", "0.3"), Some(false)).await;

    let groups_b = Arc::new(GroupManager::new(
        Arc::new(ClusterManager::new(b.clone())),
        Arc::new(BroadcastProducer::default()),
    ));
    groups_b.join_group("default", a.clone()).await?;
    let group = groups_b.join_group("default", b.clone()).await?;

    let sync_a = Synchronizer::new(
        adapter_a,
        store.clone(),
        Arc::new(PropertyAccessFilter::new(props.clone())),
        producer_a.clone(),
        SyncPolicyResolver::new(props.clone()),
        a,
    );
    let handler_b = ResourceEventHandler::new(
        adapter_b.clone(),
        Arc::new(PropertyAccessFilter::new(props)),
        groups_b,
    );

    let mut events = producer_a.subscribe();
    let report = sync_a.sync(&group).await;
    info!(report = %serde_json::to_string(&report)?, "node-a synchronized");

    while let Ok(event) = events.try_recv() {
        let outcome = handler_b.handle(&event).await;
        info!(kind = ?event.kind(), ?outcome, "node-b handled event");
    }

    let resources = [
        ResourceRef::new("webconsole", "1.0"),
        ResourceRef::new("internal-probe", "0.3"),
    ];
    for resource in resources {
        let installed = adapter_b.is_installed_locally(&resource).await;
        info!(%resource, ?installed, "node-b local state");
    }

    Ok(())
}
