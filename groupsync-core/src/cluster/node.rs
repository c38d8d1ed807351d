use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{ClusterError, ClusterResult};

/// A cluster member, identified by `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    id: String,
    host: String,
    port: u16,
}

impl Node {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self { id: format!("{}:{}", host, port), host, port }
    }

    /// Parse `host:port`
    pub fn parse(address: &str) -> ClusterResult<Self> {
        let invalid = || ClusterError::InvalidNode(address.to_string());
        let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;
        if port == 0 {
            return Err(invalid());
        }
        Ok(Self::new(host, port))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A named set of nodes sharing one instance of synchronized state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    name: String,
    nodes: BTreeSet<Node>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeSet::new(),
        }
    }

    /// Empty group with a name usable inside store keys and property keys
    pub fn try_new(name: impl Into<String>) -> ClusterResult<Self> {
        let name = name.into();
        validate_group_name(&name)?;
        Ok(Self::new(name))
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &BTreeSet<Node> {
        &self.nodes
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }

    pub(crate) fn add_node(&mut self, node: Node) -> bool {
        self.nodes.insert(node)
    }

    pub(crate) fn remove_node_by_id(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.iter().find(|n| n.id() == id).cloned()?;
        self.nodes.remove(&node);
        Some(node)
    }
}

/// Reject names that would break `::`-separated store keys or dotted property keys
fn validate_group_name(name: &str) -> ClusterResult<()> {
    let invalid = name.is_empty()
        || name.contains("::")
        || name.contains('.')
        || name.chars().any(char::is_whitespace);
    if invalid {
        return Err(ClusterError::InvalidGroupName(name.to_string()));
    }
    Ok(())
}
