//! Per-group sync policy
//!
//! The policy for a group and category lives at `<group>.<category>.sync`.
//! Resolution never fails: every problem degrades to [`SyncPolicy::Disabled`]
//! but stays visible through the [`PolicyResolution`] variant and a warning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{property_key, PropertySource, SYNC};

/// Direction and order of reconciliation for one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPolicy {
    /// Cluster is authoritative: pull, then push
    Cluster,
    /// Node is authoritative: push, then pull
    Node,
    ClusterOnly,
    NodeOnly,
    Disabled,
}

/// One reconciliation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    Pull,
    Push,
}

impl SyncPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPolicy::Cluster => "cluster",
            SyncPolicy::Node => "node",
            SyncPolicy::ClusterOnly => "clusterOnly",
            SyncPolicy::NodeOnly => "nodeOnly",
            SyncPolicy::Disabled => "disabled",
        }
    }

    /// Case-insensitive parse of a configured value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cluster" => Some(SyncPolicy::Cluster),
            "node" => Some(SyncPolicy::Node),
            "clusteronly" => Some(SyncPolicy::ClusterOnly),
            "nodeonly" => Some(SyncPolicy::NodeOnly),
            "disabled" => Some(SyncPolicy::Disabled),
            _ => None,
        }
    }

    /// Steps to run, in order
    pub fn steps(&self) -> &'static [SyncStep] {
        match self {
            SyncPolicy::Cluster => &[SyncStep::Pull, SyncStep::Push],
            SyncPolicy::Node => &[SyncStep::Push, SyncStep::Pull],
            SyncPolicy::ClusterOnly => &[SyncStep::Pull],
            SyncPolicy::NodeOnly => &[SyncStep::Push],
            SyncPolicy::Disabled => &[],
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of looking up a group's policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", content = "value", rename_all = "snake_case")]
pub enum PolicyResolution {
    /// Key present with a recognized value (including explicit "disabled")
    Configured(SyncPolicy),
    /// Key present with a value that names no policy
    Unrecognized(String),
    /// Key not present at all
    Absent,
    /// Property source could not be read
    Unavailable(String),
}

impl PolicyResolution {
    /// Effective policy; anything but a recognized value means Disabled
    pub fn policy(&self) -> SyncPolicy {
        match self {
            PolicyResolution::Configured(policy) => *policy,
            _ => SyncPolicy::Disabled,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PolicyResolution::Absent)
    }
}

impl fmt::Display for PolicyResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyResolution::Configured(policy) => write!(f, "{}", policy),
            PolicyResolution::Unrecognized(value) => {
                write!(f, "unrecognized '{}' (disabled)", value)
            }
            PolicyResolution::Absent => f.write_str("not defined (disabled)"),
            PolicyResolution::Unavailable(reason) => {
                write!(f, "unavailable: {} (disabled)", reason)
            }
        }
    }
}

/// Looks up sync policies in group properties
#[derive(Clone)]
pub struct SyncPolicyResolver {
    source: Arc<dyn PropertySource>,
}

impl SyncPolicyResolver {
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self { source }
    }

    pub fn resolve(&self, group: &str, category: &str) -> PolicyResolution {
        let key = property_key(group, category, SYNC);
        match self.source.property(&key) {
            Ok(Some(value)) => match SyncPolicy::parse(&value) {
                Some(policy) => {
                    debug!(group, category, %policy, "sync policy resolved");
                    PolicyResolution::Configured(policy)
                }
                None => {
                    warn!(
                        group,
                        category,
                        %key,
                        value = %value,
                        "unrecognized sync policy, treating as disabled"
                    );
                    PolicyResolution::Unrecognized(value)
                }
            },
            Ok(None) => {
                warn!(group, category, %key, "sync policy is not defined, treating as disabled");
                PolicyResolution::Absent
            }
            Err(e) => {
                warn!(
                    group,
                    category,
                    %key,
                    error = %e,
                    "error while reading sync policy, treating as disabled"
                );
                PolicyResolution::Unavailable(e.to_string())
            }
        }
    }
}
