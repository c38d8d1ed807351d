//! Metrics for the reconciliation engine
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const SYNC_RUNS: &str = "sync.runs";
pub const SYNC_DURATION_MS: &str = "sync.duration_ms";
pub const PULL_REPOSITORIES: &str = "sync.pull.repositories";
pub const PULL_INSTALLS: &str = "sync.pull.installs";
pub const PUSH_WRITES: &str = "sync.push.writes";
pub const PUSH_SKIPPED: &str = "sync.push.skipped";
pub const EVENTS_PRODUCED: &str = "sync.events.produced";
pub const EVENTS_APPLIED: &str = "sync.events.applied";
pub const FAILURES: &str = "sync.failures";

/// Register metric descriptions
pub fn init_metrics() {
    describe_counter!(SYNC_RUNS, "Number of sync passes that ran at least one step");
    describe_histogram!(SYNC_DURATION_MS, "Duration of one sync pass in milliseconds");
    describe_counter!(PULL_REPOSITORIES, "Repositories registered locally by pull");
    describe_counter!(PULL_INSTALLS, "Resources installed locally by pull");
    describe_counter!(PUSH_WRITES, "Shared state writes performed by push");
    describe_counter!(PUSH_SKIPPED, "Push passes skipped because the event producer is off");
    describe_counter!(EVENTS_PRODUCED, "Cluster events produced");
    describe_counter!(EVENTS_APPLIED, "Remote cluster events applied locally");
    describe_counter!(FAILURES, "Per-item failures absorbed during pull, push or event handling");
}

/// Increment a counter labelled with the cluster group
pub fn record_group_counter(name: &'static str, group: &str, value: u64) {
    if value > 0 {
        counter!(name, "group" => group.to_string()).increment(value);
    }
}

/// Measures one operation; [`Timer::stop`] records the elapsed time
pub struct Timer {
    name: &'static str,
    group: String,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str, group: &str) -> Self {
        Self {
            name,
            group: group.to_string(),
            start: Instant::now(),
        }
    }

    pub fn stop(self) {
        let elapsed = self.start.elapsed();
        histogram!(self.name, "group" => self.group).record(elapsed.as_secs_f64() * 1000.0);
    }
}
