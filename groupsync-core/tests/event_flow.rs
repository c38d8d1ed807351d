/*
    event_flow.rs - Events between nodes and group lifecycle

    Node A pushes and its events are fed to node B's handler, standing in
    for the transport. Group deletion travels the same way.
*/

mod common;

use common::*;
use groupsync_core::cluster::{ClusterManager, GroupManager};
use groupsync_core::events::{
    BroadcastProducer, EventKind, HandleOutcome, ResourceEventHandler, SwitchStatus,
};
use groupsync_core::filter::PropertyAccessFilter;
use groupsync_core::store::MemoryStore;
use groupsync_core::Node;
use std::sync::Arc;

async fn group_manager(local: &Node, memberships: &[(&str, &Node)]) -> Arc<GroupManager> {
    let cluster = Arc::new(ClusterManager::new(local.clone()));
    let producer = Arc::new(BroadcastProducer::new(16, SwitchStatus::On));
    let groups = Arc::new(GroupManager::new(cluster, producer));
    for (name, node) in memberships {
        groups.join_group(name, (*node).clone()).await.unwrap();
    }
    groups
}

/// Events produced by one node's push are applied by another node
#[tokio::test]
async fn test_push_events_are_applied_remotely() {
    let store = Arc::new(MemoryStore::new());
    let props = properties(&[("default.features.blacklist.inbound", "secret-*")]);
    let a = test_node("a", 1, store.clone(), props.clone());
    let b = test_node("b", 2, store.clone(), props.clone());

    a.adapter.put_repository(repo("mvn:org.acme/features/1.0/xml")).await;
    a.adapter.put_resource(resource("webconsole", "1.0"), Some(true)).await;
    a.adapter.put_resource(resource("secret-tool", "1.0"), Some(true)).await;
    b.adapter.put_resource(resource("webconsole", "1.0"), Some(false)).await;
    b.adapter.put_resource(resource("secret-tool", "1.0"), Some(false)).await;

    let b_groups = group_manager(&b.node, &[("default", &a.node), ("default", &b.node)]).await;
    let handler = ResourceEventHandler::new(
        b.adapter.clone(),
        Arc::new(PropertyAccessFilter::new(props)),
        b_groups,
    );

    let mut rx = a.producer.subscribe();
    a.sync.push(&group("default", &[&a.node, &b.node])).await;

    let mut outcomes = Vec::new();
    for event in drain(&mut rx) {
        outcomes.push((event.kind(), handler.handle(&event).await));
    }

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.contains(&(EventKind::RepositoryAdded, HandleOutcome::Applied)));
    assert!(outcomes.contains(&(EventKind::ResourceInstalled, HandleOutcome::Applied)));
    let blocked = HandleOutcome::Ignored("resource is blocked inbound");
    assert!(outcomes.contains(&(EventKind::ResourceInstalled, blocked)));

    assert!(b.adapter.is_registered_locally(&repo("mvn:org.acme/features/1.0/xml")).await);
    assert_eq!(b.adapter.is_installed_locally(&resource("webconsole", "1.0")).await, Some(true));
    assert_eq!(b.adapter.is_installed_locally(&resource("secret-tool", "1.0")).await, Some(false));
}

/// A node's own events are not re-applied to it
#[tokio::test]
async fn test_own_events_are_ignored() {
    let store = Arc::new(MemoryStore::new());
    let a = test_node("a", 1, store, properties(&[]));
    a.adapter.put_resource(resource("webconsole", "1.0"), Some(false)).await;
    let groups = group_manager(&a.node, &[("default", &a.node)]).await;
    let filter = Arc::new(PropertyAccessFilter::new(properties(&[])));
    let handler = ResourceEventHandler::new(a.adapter.clone(), filter, groups);

    let mut rx = a.producer.subscribe();
    a.sync.push(&group("default", &[&a.node])).await;

    for event in drain(&mut rx) {
        assert_eq!(
            handler.handle(&event).await,
            HandleOutcome::Ignored("event originated locally")
        );
    }
    assert!(a.adapter.uninstall_calls().await.is_empty());
}

/// Deleting a group tells members to leave it, after which startup sync skips it
#[tokio::test]
async fn test_group_delete_propagates_quit() {
    let a = Node::new("a", 1);
    let b = Node::new("b", 2);

    let a_producer = Arc::new(BroadcastProducer::new(16, SwitchStatus::On));
    let a_groups = GroupManager::new(Arc::new(ClusterManager::new(a.clone())), a_producer.clone());
    a_groups.join_group("edge", a.clone()).await.unwrap();
    a_groups.join_group("edge", b.clone()).await.unwrap();

    let b_groups = group_manager(&b, &[("edge", &a), ("edge", &b), ("default", &b)]).await;
    let mut rx = a_producer.subscribe();

    a_groups.delete_group("edge").await.unwrap();
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::GroupQuit);

    assert!(b_groups.apply_event(&events[0]).await);
    let local: Vec<String> = b_groups
        .list_local_groups()
        .await
        .iter()
        .map(|g| g.name().to_string())
        .collect();
    assert_eq!(local, vec!["default".to_string()]);

    let store = Arc::new(MemoryStore::new());
    let props = properties(&[
        ("default.features.sync", "cluster"),
        ("edge.features.sync", "cluster"),
    ]);
    let b_node = test_node("b", 2, store, props);
    let reports = b_node.sync.init(&b_groups).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].group, "default");
}

/// Startup sync covers every local group and only those
#[tokio::test]
async fn test_init_syncs_local_groups() {
    let store = Arc::new(MemoryStore::new());
    let props = properties(&[
        ("g1.features.sync", "nodeOnly"),
        ("g2.features.sync", "nodeOnly"),
        ("g3.features.sync", "nodeOnly"),
    ]);
    let a = test_node("a", 1, store.clone(), props);
    a.adapter.put_resource(resource("webconsole", "1.0"), Some(true)).await;

    let other = Node::new("b", 2);
    let groups = group_manager(&a.node, &[("g1", &a.node), ("g2", &a.node), ("g3", &other)]).await;

    let reports = a.sync.init(&groups).await;
    let synced: Vec<&str> = reports.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(synced, vec!["g1", "g2"]);
    assert!(reports.iter().all(|r| r.push.as_ref().is_some_and(|p| p.resources_written == 1)));
}
