//! Outbound event channel

use tokio::sync::broadcast;
use tracing::trace;

use super::{ClusterEvent, Switch, SwitchStatus};
use crate::metrics;

/// Outbound side of the cluster event channel
///
/// `produce` does not consult the switch; callers check `switch_status`
/// before doing work that would produce events.
pub trait EventProducer: Send + Sync {
    fn produce(&self, event: ClusterEvent);

    fn switch_status(&self) -> SwitchStatus;
}

/// Event producer backed by a tokio broadcast channel
///
/// The transport to remote nodes subscribes here. Producing with no
/// subscriber drops the event, which is not an error.
pub struct BroadcastProducer {
    tx: broadcast::Sender<ClusterEvent>,
    switch: Switch,
}

impl BroadcastProducer {
    /// # Arguments
    /// * `capacity` - events buffered per lagging subscriber
    /// * `status` - initial switch position
    pub fn new(capacity: usize, status: SwitchStatus) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            switch: Switch::new(status),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn switch(&self) -> &Switch {
        &self.switch
    }
}

impl Default for BroadcastProducer {
    fn default() -> Self {
        Self::new(256, SwitchStatus::On)
    }
}

impl EventProducer for BroadcastProducer {
    fn produce(&self, event: ClusterEvent) {
        let group = event.source_group().to_string();
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(receivers) => trace!(group = %group, ?kind, receivers, "cluster event produced"),
            Err(_) => trace!(group = %group, ?kind, "cluster event produced with no subscribers"),
        }
        metrics::record_group_counter(metrics::EVENTS_PRODUCED, &group, 1);
    }

    fn switch_status(&self) -> SwitchStatus {
        self.switch.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Node;
    use crate::events::{EventHeader, EventKind};
    use crate::model::ResourceRef;

    fn event(name: &str) -> ClusterEvent {
        let header = EventHeader::new("id", Node::new("a", 1), "default", "features");
        ClusterEvent::resource_status(header, ResourceRef::new(name, "1.0"), true)
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let producer = BroadcastProducer::new(8, SwitchStatus::On);
        let mut rx1 = producer.subscribe();
        let mut rx2 = producer.subscribe();
        assert_eq!(producer.subscriber_count(), 2);

        producer.produce(event("webconsole"));

        for rx in [&mut rx1, &mut rx2] {
            let received = rx.recv().await.unwrap();
            assert_eq!(received.kind(), EventKind::ResourceInstalled);
            assert_eq!(received.resource().unwrap().name, "webconsole");
        }
    }

    #[test]
    fn test_produce_without_subscribers_is_fine() {
        let producer = BroadcastProducer::default();
        producer.produce(event("webconsole"));
        assert_eq!(producer.subscriber_count(), 0);
    }

    #[test]
    fn test_switch_status_is_reported() {
        let producer = BroadcastProducer::new(8, SwitchStatus::Off);
        assert_eq!(producer.switch_status(), SwitchStatus::Off);
        producer.switch().turn_on();
        assert_eq!(producer.switch_status(), SwitchStatus::On);
    }
}
