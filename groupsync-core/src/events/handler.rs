//! Inbound side: apply remote change notifications to the local node

use std::sync::Arc;
use tracing::{debug, warn};

use super::{ClusterEvent, EventKind, Switch, SwitchStatus};
use crate::cluster::GroupManager;
use crate::filter::{AccessFilter, Direction};
use crate::metrics;
use crate::model::normalize_installed;
use crate::sync::LocalResourceAdapter;

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Applied,
    /// Nothing to do; the reason is for logs and tests
    Ignored(&'static str),
    /// The local manager rejected the change
    Failed(String),
}

/// Applies resource and repository events from remote nodes
pub struct ResourceEventHandler<A: LocalResourceAdapter> {
    adapter: Arc<A>,
    filter: Arc<dyn AccessFilter>,
    groups: Arc<GroupManager>,
    switch: Switch,
}

impl<A: LocalResourceAdapter> ResourceEventHandler<A> {
    pub fn new(adapter: Arc<A>, filter: Arc<dyn AccessFilter>, groups: Arc<GroupManager>) -> Self {
        Self {
            adapter,
            filter,
            groups,
            switch: Switch::default(),
        }
    }

    /// Incoming events are dropped while this is off
    pub fn switch(&self) -> &Switch {
        &self.switch
    }

    pub async fn handle(&self, event: &ClusterEvent) -> HandleOutcome {
        let outcome = self.apply(event).await;
        let group = event.source_group();
        match &outcome {
            HandleOutcome::Applied => {
                debug!(group, kind = ?event.kind(), "cluster event applied");
                metrics::record_group_counter(metrics::EVENTS_APPLIED, group, 1);
            }
            HandleOutcome::Ignored(reason) => {
                debug!(group, kind = ?event.kind(), reason, "cluster event ignored");
            }
            HandleOutcome::Failed(error) => {
                warn!(group, kind = ?event.kind(), error = %error, "failed to apply cluster event");
                metrics::record_group_counter(metrics::FAILURES, group, 1);
            }
        }
        outcome
    }

    async fn apply(&self, event: &ClusterEvent) -> HandleOutcome {
        if self.switch.status() == SwitchStatus::Off {
            return HandleOutcome::Ignored("event handler is off");
        }
        let local = self.groups.local_node();
        if event.source_node() == local {
            return HandleOutcome::Ignored("event originated locally");
        }
        if event.category() != self.adapter.category() {
            return HandleOutcome::Ignored("event is for another category");
        }
        let group = event.source_group();
        match self.groups.find_group(group).await {
            Some(g) if g.contains(local) => {}
            _ => return HandleOutcome::Ignored("local node is not a member of the group"),
        }

        match event.kind() {
            EventKind::ResourceInstalled | EventKind::ResourceUninstalled => {
                let Some(resource) = event.resource() else {
                    return HandleOutcome::Ignored("event carries no resource");
                };
                let category = self.adapter.category();
                if !self.filter.allowed(group, category, &resource.name, Direction::Inbound) {
                    return HandleOutcome::Ignored("resource is blocked inbound");
                }
                let installed = self.adapter.is_installed_locally(resource).await;
                let result = if event.kind() == EventKind::ResourceInstalled {
                    if normalize_installed(installed) {
                        return HandleOutcome::Ignored("resource already installed");
                    }
                    self.adapter.install(resource).await
                } else {
                    if installed != Some(true) {
                        return HandleOutcome::Ignored("resource not installed");
                    }
                    self.adapter.uninstall(resource).await
                };
                result.map_or_else(
                    |e| HandleOutcome::Failed(e.to_string()),
                    |_| HandleOutcome::Applied,
                )
            }
            EventKind::RepositoryAdded | EventKind::RepositoryRemoved => {
                let Some(repository) = event.repository() else {
                    return HandleOutcome::Ignored("event carries no repository");
                };
                let registered = self.adapter.is_registered_locally(repository).await;
                let result = if event.kind() == EventKind::RepositoryAdded {
                    if registered {
                        return HandleOutcome::Ignored("repository already registered");
                    }
                    self.adapter.add_repository(repository).await
                } else {
                    if !registered {
                        return HandleOutcome::Ignored("repository not registered");
                    }
                    self.adapter.remove_repository(repository).await
                };
                result.map_or_else(
                    |e| HandleOutcome::Failed(e.to_string()),
                    |_| HandleOutcome::Applied,
                )
            }
            EventKind::ResourceAdded | EventKind::GroupQuit => {
                HandleOutcome::Ignored("event kind not handled here")
            }
        }
    }
}
