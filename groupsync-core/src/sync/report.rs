use serde::{Deserialize, Serialize};

use crate::policy::{PolicyResolution, SyncStep};

/// What one pull pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullReport {
    /// Repositories registered locally
    pub repositories_added: usize,
    /// Repositories that were malformed or could not be registered
    pub repositories_failed: usize,
    pub installed: usize,
    pub install_failed: usize,
    /// Resources skipped by the inbound filter
    pub blocked: usize,
    pub unchanged: usize,
    /// Shared keys that could not be read
    pub store_failures: usize,
    /// Resource entries whose key is not a `name/version` for the stored resource
    pub malformed: usize,
}

impl PullReport {
    pub fn failures(&self) -> usize {
        self.repositories_failed + self.install_failed + self.store_failures + self.malformed
    }
}

/// What one push pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    /// Push returned early because the event producer is off
    pub switched_off: bool,
    pub repositories_pushed: usize,
    pub resources_written: usize,
    pub events_produced: usize,
    /// Resources skipped by the outbound filter
    pub blocked: usize,
    pub unchanged: usize,
    pub failures: usize,
}

impl PushReport {
    /// Total shared-state writes
    pub fn writes(&self) -> usize {
        self.repositories_pushed + self.resources_written
    }

    pub(crate) fn switched_off() -> Self {
        Self {
            switched_off: true,
            ..Self::default()
        }
    }
}

/// Outcome of [`Synchronizer::sync`](super::Synchronizer::sync) for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub group: String,
    pub resolution: PolicyResolution,
    /// Steps that ran, in order
    pub steps: Vec<SyncStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull: Option<PullReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushReport>,
}

impl SyncReport {
    pub fn new(group: impl Into<String>, resolution: PolicyResolution) -> Self {
        Self {
            group: group.into(),
            resolution,
            steps: Vec::new(),
            pull: None,
            push: None,
        }
    }

    /// Neither pull nor push ran
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}
