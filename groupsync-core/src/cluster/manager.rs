use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::Node;

/// Live membership view for the local node
///
/// Membership changes arrive from the storage substrate's discovery layer;
/// this type only records them.
pub struct ClusterManager {
    local: Node,
    members: RwLock<BTreeMap<String, Node>>,
}

impl ClusterManager {
    pub fn new(local: Node) -> Self {
        let mut members = BTreeMap::new();
        members.insert(local.id().to_string(), local.clone());
        Self {
            local,
            members: RwLock::new(members),
        }
    }

    pub fn local_node(&self) -> &Node {
        &self.local
    }

    /// Record a member. Returns `false` if it was already known.
    pub async fn add_member(&self, node: Node) -> bool {
        let mut members = self.members.write().await;
        let added = members.insert(node.id().to_string(), node.clone()).is_none();
        if added {
            info!(node = %node, "node joined the cluster");
        }
        added
    }

    /// Forget a member. The local node cannot be removed.
    pub async fn remove_member(&self, id: &str) -> Option<Node> {
        if id == self.local.id() {
            debug!(node = id, "refusing to remove the local node from membership");
            return None;
        }
        let removed = self.members.write().await.remove(id);
        if let Some(node) = &removed {
            info!(node = %node, "node left the cluster");
        }
        removed
    }

    pub async fn list_nodes(&self) -> Vec<Node> {
        self.members.read().await.values().cloned().collect()
    }

    /// Members whose id is in `ids`; unknown ids are skipped
    pub async fn list_nodes_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Node> {
        let members = self.members.read().await;
        ids.iter().filter_map(|id| members.get(id.as_ref()).cloned()).collect()
    }

    pub async fn find_node_by_id(&self, id: &str) -> Option<Node> {
        self.members.read().await.get(id).cloned()
    }

    /// Cluster-unique identifier for events and commands
    pub fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
