/*
    persistence.rs - File-backed state

    Shared state snapshots, local manifests and group property files, used
    together the way the command line tool does.
*/

mod common;

use common::CATEGORY;
use groupsync_core::config::GroupProperties;
use groupsync_core::events::BroadcastProducer;
use groupsync_core::filter::PropertyAccessFilter;
use groupsync_core::model::ResourceRef;
use groupsync_core::policy::{PolicyResolution, SyncPolicy, SyncPolicyResolver};
use groupsync_core::store::{resources_key, MemoryStore, SharedStateStore};
use groupsync_core::sync::{MemoryResourceAdapter, Synchronizer};
use groupsync_core::{Group, Node};
use std::sync::Arc;
use tempfile::tempdir;

const PROPERTIES: &str = r#"
[default.features]
sync = "cluster"

[default.features.blacklist]
outbound = ["internal-*", "debug"]
"#;

#[tokio::test]
async fn test_sync_between_state_files() {
    let dir = tempdir().unwrap();
    let props_path = dir.path().join("groups.toml");
    let state_path = dir.path().join("state.json");
    let local_path = dir.path().join("local.json");

    std::fs::write(&props_path, PROPERTIES).unwrap();
    std::fs::write(
        &local_path,
        r#"{
            "repositories": ["mvn:org.acme/features/1.0/xml"],
            "resources": [
                {"name": "webconsole", "version": "1.0", "installed": true},
                {"name": "internal-probe", "version": "1.0", "installed": true}
            ]
        }"#,
    )
    .unwrap();

    let props = Arc::new(GroupProperties::from_file(&props_path).unwrap());
    let resolver = SyncPolicyResolver::new(props.clone());
    assert_eq!(
        resolver.resolve("default", CATEGORY),
        PolicyResolution::Configured(SyncPolicy::Cluster)
    );

    let store = Arc::new(MemoryStore::load_snapshot(&state_path).unwrap());
    let adapter = Arc::new(MemoryResourceAdapter::load_manifest(CATEGORY, &local_path).unwrap());
    let node = Node::new("a", 1);
    let sync = Synchronizer::new(
        adapter.clone(),
        store.clone(),
        Arc::new(PropertyAccessFilter::new(props)),
        Arc::new(BroadcastProducer::default()),
        resolver,
        node.clone(),
    );

    let report = sync.sync(&Group::new("default").with_node(node)).await;
    let push = report.push.unwrap();
    assert_eq!(push.resources_written, 1);
    assert_eq!(push.blocked, 1);

    store.save_snapshot(&state_path).await.unwrap();
    adapter.save_manifest(&local_path).await.unwrap();

    let reloaded = MemoryStore::load_snapshot(&state_path).unwrap();
    let entries = reloaded.map_entries(&resources_key(CATEGORY, "default")).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1.resource, ResourceRef::new("webconsole", "1.0"));
    assert_eq!(entries[0].1.installed, Some(true));

    let reloaded = MemoryResourceAdapter::load_manifest(CATEGORY, &local_path).unwrap();
    let manifest = reloaded.manifest().await;
    assert_eq!(manifest.resources.len(), 2);
}

#[test]
fn test_missing_state_files_start_empty() {
    let dir = tempdir().unwrap();
    assert!(MemoryStore::load_snapshot(dir.path().join("absent.json")).is_ok());
    let absent = dir.path().join("absent.json");
    assert!(MemoryResourceAdapter::load_manifest(CATEGORY, &absent).is_ok());
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(MemoryStore::load_snapshot(&path).is_err());
}
