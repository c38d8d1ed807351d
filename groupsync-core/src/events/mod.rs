//! Cluster events
//!
//! Push emits one [`ClusterEvent`] per shared-state change so remote nodes
//! can apply the change without a full reconciliation. The outbound side is
//! an [`EventProducer`] gated by a [`Switch`]; the inbound side is
//! [`ResourceEventHandler`].

use serde::{Deserialize, Serialize};

use crate::cluster::Node;
use crate::model::{RepositoryRef, ResourceRef};

mod handler;
mod producer;
mod switch;

pub use handler::{HandleOutcome, ResourceEventHandler};
pub use producer::{BroadcastProducer, EventProducer};
pub use switch::{Switch, SwitchStatus};

/// Category used by group management events
pub const GROUP_CATEGORY: &str = "groups";

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ResourceAdded,
    ResourceInstalled,
    ResourceUninstalled,
    RepositoryAdded,
    RepositoryRemoved,
    /// Listed nodes must leave the source group
    GroupQuit,
}

/// What the change applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Resource(ResourceRef),
    Repository(RepositoryRef),
    /// Node ids addressed by a group management event
    Members(Vec<String>),
}

/// Origin of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    pub id: String,
    pub source_node: Node,
    pub source_group: String,
    pub category: String,
}

impl EventHeader {
    pub fn new(
        id: impl Into<String>,
        source_node: Node,
        source_group: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node,
            source_group: source_group.into(),
            category: category.into(),
        }
    }
}

/// A change notification for remote nodes
///
/// Built through the constructors below so `kind` and `payload` always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEvent {
    header: EventHeader,
    kind: EventKind,
    payload: EventPayload,
}

impl ClusterEvent {
    /// `ResourceInstalled` or `ResourceUninstalled` depending on `installed`
    pub fn resource_status(header: EventHeader, resource: ResourceRef, installed: bool) -> Self {
        let kind = if installed {
            EventKind::ResourceInstalled
        } else {
            EventKind::ResourceUninstalled
        };
        Self {
            header,
            kind,
            payload: EventPayload::Resource(resource),
        }
    }

    pub fn repository_added(header: EventHeader, repository: RepositoryRef) -> Self {
        Self {
            header,
            kind: EventKind::RepositoryAdded,
            payload: EventPayload::Repository(repository),
        }
    }

    pub fn repository_removed(header: EventHeader, repository: RepositoryRef) -> Self {
        Self {
            header,
            kind: EventKind::RepositoryRemoved,
            payload: EventPayload::Repository(repository),
        }
    }

    pub fn group_quit(header: EventHeader, destinations: Vec<String>) -> Self {
        Self {
            header,
            kind: EventKind::GroupQuit,
            payload: EventPayload::Members(destinations),
        }
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn source_node(&self) -> &Node {
        &self.header.source_node
    }

    pub fn source_group(&self) -> &str {
        &self.header.source_group
    }

    pub fn category(&self) -> &str {
        &self.header.category
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn resource(&self) -> Option<&ResourceRef> {
        match &self.payload {
            EventPayload::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn repository(&self) -> Option<&RepositoryRef> {
        match &self.payload {
            EventPayload::Repository(repository) => Some(repository),
            _ => None,
        }
    }
}
