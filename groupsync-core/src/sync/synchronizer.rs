use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::adapter::LocalResourceAdapter;
use super::report::{PullReport, PushReport, SyncReport};
use crate::cluster::{Group, GroupManager, Node};
use crate::events::{ClusterEvent, EventHeader, EventProducer, SwitchStatus};
use crate::filter::{AccessFilter, Direction};
use crate::metrics::{self, Timer};
use crate::model::{normalize_installed, RepositoryRef, ResourceRef, ResourceState};
use crate::policy::{PolicyResolution, SyncPolicy, SyncPolicyResolver, SyncStep};
use crate::store::{repositories_key, resources_key, SharedStateStore};

/// Reconciles one category of local resources with the shared cluster state
///
/// Every pass runs to completion: per-item failures are logged, counted in
/// the returned report and skipped.
pub struct Synchronizer<A: LocalResourceAdapter> {
    adapter: Arc<A>,
    store: Arc<dyn SharedStateStore>,
    filter: Arc<dyn AccessFilter>,
    producer: Arc<dyn EventProducer>,
    resolver: SyncPolicyResolver,
    local: Node,
}

impl<A: LocalResourceAdapter> Synchronizer<A> {
    pub fn new(
        adapter: Arc<A>,
        store: Arc<dyn SharedStateStore>,
        filter: Arc<dyn AccessFilter>,
        producer: Arc<dyn EventProducer>,
        resolver: SyncPolicyResolver,
        local: Node,
    ) -> Self {
        Self {
            adapter,
            store,
            filter,
            producer,
            resolver,
            local,
        }
    }

    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    pub fn category(&self) -> &str {
        self.adapter.category()
    }

    pub fn local_node(&self) -> &Node {
        &self.local
    }

    pub fn resolve_policy(&self, group: &str) -> PolicyResolution {
        self.resolver.resolve(group, self.adapter.category())
    }

    /// Sync every group the local node belongs to
    pub async fn init(&self, groups: &GroupManager) -> Vec<SyncReport> {
        let local_groups = groups.list_local_groups().await;
        info!(
            category = self.category(),
            groups = local_groups.len(),
            "initial sync of local groups"
        );

        let mut reports = Vec::with_capacity(local_groups.len());
        for group in &local_groups {
            reports.push(self.sync(group).await);
        }
        reports
    }

    /// Resolve the group's policy and run pull and/or push in policy order
    pub async fn sync(&self, group: &Group) -> SyncReport {
        let resolution = self.resolve_policy(group.name());
        let policy = resolution.policy();
        let mut report = SyncReport::new(group.name(), resolution);

        if policy == SyncPolicy::Disabled {
            debug!(
                group = group.name(),
                category = self.category(),
                "sync disabled for group"
            );
            return report;
        }

        let timer = Timer::new(metrics::SYNC_DURATION_MS, group.name());
        for step in policy.steps() {
            match step {
                SyncStep::Pull => report.pull = Some(self.pull(group).await),
                SyncStep::Push => report.push = Some(self.push(group).await),
            }
            report.steps.push(*step);
        }
        timer.stop();
        metrics::record_group_counter(metrics::SYNC_RUNS, group.name(), 1);

        info!(group = group.name(), category = self.category(), %policy, "group synchronized");
        report
    }

    /// Bring the local node up to the cluster's state for `group`
    ///
    /// Registers missing repositories and installs resources the cluster
    /// reports as installed. Never uninstalls.
    pub async fn pull(&self, group: &Group) -> PullReport {
        let mut report = PullReport::default();
        let group_name = group.name();
        let category = self.adapter.category();

        debug!(group = group_name, category, "pulling cluster state");

        let repos_key = repositories_key(category, group_name);
        let uris = match self.store.list(&repos_key).await {
            Ok(uris) => uris,
            Err(e) => {
                warn!(
                    group = group_name,
                    key = %repos_key,
                    error = %e,
                    "cannot read shared repository list"
                );
                report.store_failures += 1;
                Vec::new()
            }
        };

        for uri in uris {
            let repository = match RepositoryRef::parse(&uri) {
                Ok(repository) => repository,
                Err(e) => {
                    warn!(
                        group = group_name,
                        uri = %uri,
                        error = %e,
                        "skipping malformed repository"
                    );
                    report.repositories_failed += 1;
                    continue;
                }
            };
            if self.adapter.is_registered_locally(&repository).await {
                continue;
            }
            debug!(group = group_name, uri = %repository, "adding repository");
            match self.adapter.add_repository(&repository).await {
                Ok(()) => report.repositories_added += 1,
                Err(e) => {
                    warn!(
                        group = group_name,
                        uri = %repository,
                        error = %e,
                        "failed to add repository"
                    );
                    report.repositories_failed += 1;
                }
            }
        }

        let map_key = resources_key(category, group_name);
        let entries = match self.store.map_entries(&map_key).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    group = group_name,
                    key = %map_key,
                    error = %e,
                    "cannot read shared resource states"
                );
                report.store_failures += 1;
                Vec::new()
            }
        };

        for (entry, state) in entries {
            // entry key and stored resource must agree
            let resource = match ResourceRef::from_key(&entry) {
                Ok(resource) if resource == state.resource => resource,
                Ok(_) | Err(_) => {
                    warn!(group = group_name, entry = %entry, "skipping malformed resource entry");
                    report.malformed += 1;
                    continue;
                }
            };
            if !self.filter.allowed(group_name, category, &resource.name, Direction::Inbound) {
                warn!(group = group_name, resource = %resource, "resource is blocked inbound");
                report.blocked += 1;
                continue;
            }

            let cluster_installed = normalize_installed(state.installed);
            let locally_installed =
                normalize_installed(self.adapter.is_installed_locally(&resource).await);
            if !(cluster_installed && !locally_installed) {
                report.unchanged += 1;
                continue;
            }

            debug!(group = group_name, resource = %resource, "installing resource");
            match self.adapter.install(&resource).await {
                Ok(()) => report.installed += 1,
                Err(e) => {
                    warn!(
                        group = group_name,
                        resource = %resource,
                        error = %e,
                        "failed to install resource"
                    );
                    report.install_failed += 1;
                }
            }
        }

        metrics::record_group_counter(
            metrics::PULL_REPOSITORIES,
            group_name,
            report.repositories_added as u64,
        );
        metrics::record_group_counter(metrics::PULL_INSTALLS, group_name, report.installed as u64);
        metrics::record_group_counter(metrics::FAILURES, group_name, report.failures() as u64);
        report
    }

    /// Publish the local node's state for `group` to the cluster
    ///
    /// Writes only what differs from the shared state and emits one event
    /// per write, so a second pass over unchanged state does nothing.
    pub async fn push(&self, group: &Group) -> PushReport {
        let group_name = group.name();
        let category = self.adapter.category();

        if self.producer.switch_status() == SwitchStatus::Off {
            warn!(group = group_name, category, "cluster event producer is OFF, skipping push");
            metrics::record_group_counter(metrics::PUSH_SKIPPED, group_name, 1);
            return PushReport::switched_off();
        }

        let mut report = PushReport::default();
        debug!(group = group_name, category, "pushing local state");

        let repositories = self.adapter.list_repositories().await.unwrap_or_else(|e| {
            warn!(group = group_name, error = %e, "cannot list local repositories");
            Vec::new()
        });

        let repos_key = repositories_key(category, group_name);
        for repository in repositories {
            match self.store.list_append_if_absent(&repos_key, repository.as_str()).await {
                Ok(true) => {
                    debug!(group = group_name, uri = %repository, "repository pushed");
                    report.repositories_pushed += 1;
                    let event = ClusterEvent::repository_added(self.header(group_name), repository);
                    self.producer.produce(event);
                    report.events_produced += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        group = group_name,
                        uri = %repository,
                        error = %e,
                        "failed to push repository"
                    );
                    report.failures += 1;
                }
            }
        }

        let resources = self.adapter.list_resources().await.unwrap_or_else(|e| {
            warn!(group = group_name, error = %e, "cannot list local resources");
            Vec::new()
        });

        let map_key = resources_key(category, group_name);
        for local in resources {
            let resource = local.resource;
            if !self.filter.allowed(group_name, category, &resource.name, Direction::Outbound) {
                debug!(group = group_name, resource = %resource, "resource is blocked outbound");
                report.blocked += 1;
                continue;
            }

            let entry = resource.key();
            let shared = match self.store.map_get(&map_key, &entry).await {
                Ok(shared) => shared,
                Err(e) => {
                    warn!(
                        group = group_name,
                        resource = %resource,
                        error = %e,
                        "cannot read shared resource state"
                    );
                    report.failures += 1;
                    continue;
                }
            };

            let changed = match &shared {
                None => true,
                Some(state) => normalize_installed(state.installed) != local.installed,
            };
            if !changed {
                report.unchanged += 1;
                continue;
            }

            let state = ResourceState::reported(resource.clone(), local.installed);
            match self.store.map_put(&map_key, &entry, state).await {
                Ok(()) => {
                    debug!(
                        group = group_name,
                        resource = %resource,
                        installed = local.installed,
                        "resource state pushed"
                    );
                    report.resources_written += 1;
                    let event = ClusterEvent::resource_status(
                        self.header(group_name),
                        resource,
                        local.installed,
                    );
                    self.producer.produce(event);
                    report.events_produced += 1;
                }
                Err(e) => {
                    warn!(
                        group = group_name,
                        resource = %resource,
                        error = %e,
                        "failed to push resource state"
                    );
                    report.failures += 1;
                }
            }
        }

        metrics::record_group_counter(metrics::PUSH_WRITES, group_name, report.writes() as u64);
        metrics::record_group_counter(metrics::FAILURES, group_name, report.failures as u64);
        report
    }

    fn header(&self, group: &str) -> EventHeader {
        EventHeader::new(
            Uuid::new_v4().to_string(),
            self.local.clone(),
            group,
            self.adapter.category(),
        )
    }
}
