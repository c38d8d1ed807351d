use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{ClusterError, ClusterManager, ClusterResult, Group, Node};
use crate::events::{
    ClusterEvent, EventHeader, EventKind, EventPayload, EventProducer, SwitchStatus, GROUP_CATEGORY,
};

/// Registry of cluster groups and their members
pub struct GroupManager {
    cluster: Arc<ClusterManager>,
    groups: RwLock<BTreeMap<String, Group>>,
    producer: Arc<dyn EventProducer>,
}

impl GroupManager {
    pub fn new(cluster: Arc<ClusterManager>, producer: Arc<dyn EventProducer>) -> Self {
        Self {
            cluster,
            groups: RwLock::new(BTreeMap::new()),
            producer,
        }
    }

    pub fn local_node(&self) -> &Node {
        self.cluster.local_node()
    }

    pub fn cluster(&self) -> &Arc<ClusterManager> {
        &self.cluster
    }

    pub async fn create_group(&self, name: &str) -> ClusterResult<Group> {
        let group = Group::try_new(name)?;
        let mut groups = self.groups.write().await;
        if groups.contains_key(name) {
            return Err(ClusterError::GroupExists(name.to_string()));
        }
        groups.insert(name.to_string(), group.clone());
        info!(group = name, "group created");
        Ok(group)
    }

    pub async fn find_group(&self, name: &str) -> Option<Group> {
        self.groups.read().await.get(name).cloned()
    }

    pub async fn list_groups(&self) -> Vec<Group> {
        self.groups.read().await.values().cloned().collect()
    }

    /// Groups the local node is a member of
    pub async fn list_local_groups(&self) -> Vec<Group> {
        let local = self.cluster.local_node();
        self.groups.read().await.values().filter(|g| g.contains(local)).cloned().collect()
    }

    /// Add `node` to the group, creating the group if needed
    pub async fn join_group(&self, name: &str, node: Node) -> ClusterResult<Group> {
        let empty = Group::try_new(name)?;
        let mut groups = self.groups.write().await;
        let group = groups.entry(name.to_string()).or_insert(empty);
        if group.add_node(node.clone()) {
            info!(group = name, node = %node, "node joined group");
        }
        Ok(group.clone())
    }

    /// Remove the node with id `node_id` from the group
    pub async fn quit_group(&self, name: &str, node_id: &str) -> ClusterResult<Group> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(name)
            .ok_or_else(|| ClusterError::GroupNotFound(name.to_string()))?;
        group
            .remove_node_by_id(node_id)
            .ok_or_else(|| ClusterError::NodeNotFound(node_id.to_string()))?;
        info!(group = name, node = node_id, "node left group");
        Ok(group.clone())
    }

    /// Delete a group, first telling its members to leave it
    pub async fn delete_group(&self, name: &str) -> ClusterResult<Group> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get(name)
            .ok_or_else(|| ClusterError::GroupNotFound(name.to_string()))?;

        if !group.nodes().is_empty() {
            let members: Vec<String> = group.nodes().iter().map(|n| n.id().to_string()).collect();
            if self.producer.switch_status() == SwitchStatus::On {
                let header = EventHeader::new(
                    self.cluster.generate_id(),
                    self.cluster.local_node().clone(),
                    name,
                    GROUP_CATEGORY,
                );
                self.producer.produce(ClusterEvent::group_quit(header, members));
            } else {
                warn!(
                    group = name,
                    "cluster event producer is OFF, members are not notified of group deletion"
                );
            }
        }

        let removed = groups
            .remove(name)
            .ok_or_else(|| ClusterError::GroupNotFound(name.to_string()))?;
        info!(group = name, "group deleted");
        Ok(removed)
    }

    /// Apply a group management event addressed to the local node.
    /// Returns whether anything changed.
    pub async fn apply_event(&self, event: &ClusterEvent) -> bool {
        if event.kind() != EventKind::GroupQuit {
            return false;
        }
        let local = self.cluster.local_node();
        let addressed = match event.payload() {
            EventPayload::Members(ids) => ids.iter().any(|id| id == local.id()),
            _ => false,
        };
        if !addressed {
            return false;
        }

        match self.quit_group(event.source_group(), local.id()).await {
            Ok(_) => true,
            Err(e) => {
                debug!(group = event.source_group(), error = %e, "nothing to quit");
                false
            }
        }
    }
}
