//! Direction-based access control over synchronized items
//!
//! Rules come from group properties:
//!
//! ```text
//! <group>.<category>.whitelist.inbound   = "*"
//! <group>.<category>.blacklist.outbound  = "internal-*,debug"
//! ```
//!
//! An item is allowed when it matches the whitelist (an absent whitelist
//! allows everything) and does not match the blacklist.

mod wildcard;

pub use wildcard::wildcard_match;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::config::{property_key, ConfigResult, PropertySource};

/// Which way an item is flowing relative to the local node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Cluster to node (pull, incoming events)
    Inbound,
    /// Node to cluster (push)
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow/block decision for one item in one direction
///
/// Called once per item per pass, so implementations must not do blocking
/// I/O beyond an in-memory configuration read.
pub trait AccessFilter: Send + Sync {
    fn allowed(&self, group: &str, category: &str, name: &str, direction: Direction) -> bool;
}

/// Filter that allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessFilter for AllowAll {
    fn allowed(&self, _group: &str, _category: &str, _name: &str, _direction: Direction) -> bool {
        true
    }
}

/// Whitelist/blacklist filter over a [`PropertySource`]
pub struct PropertyAccessFilter {
    source: Arc<dyn PropertySource>,
}

impl PropertyAccessFilter {
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self { source }
    }

    /// `Ok(None)` when the rule list is not configured
    fn patterns(
        &self,
        group: &str,
        category: &str,
        list: &str,
        direction: Direction,
    ) -> ConfigResult<Option<Vec<String>>> {
        let key = property_key(group, category, &format!("{}.{}", list, direction.as_str()));
        Ok(self.source.property(&key)?.map(|value| split_patterns(&value)))
    }
}

impl AccessFilter for PropertyAccessFilter {
    fn allowed(&self, group: &str, category: &str, name: &str, direction: Direction) -> bool {
        let rules = self.patterns(group, category, "whitelist", direction).and_then(|whitelist| {
            Ok((whitelist, self.patterns(group, category, "blacklist", direction)?))
        });

        match rules {
            Ok((whitelist, blacklist)) => {
                let whitelisted = whitelist.map_or(true, |patterns| matches_any(&patterns, name));
                let blacklisted = blacklist.is_some_and(|patterns| matches_any(&patterns, name));
                whitelisted && !blacklisted
            }
            Err(e) => {
                warn!(
                    group,
                    category,
                    item = name,
                    %direction,
                    error = %e,
                    "unable to read access rules, denying"
                );
                false
            }
        }
    }
}

fn split_patterns(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect()
}

fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns.iter().any(|pattern| wildcard_match(pattern, name))
}
