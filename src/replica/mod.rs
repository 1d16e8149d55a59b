#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::Submission;

/// A full-snapshot notification published by one replica of a client
/// installation to its siblings
#[derive(Debug, Clone)]
pub struct ReplicaEvent {
    /// Identity of the publishing channel; subscribers drop their own events
    pub origin: Uuid,
    /// The serialized submission array, the same wire format the durable
    /// cache stores
    pub payload: Arc<str>,
}

/// Broadcast bus connecting the replicas of one client installation.
///
/// Delivery is fire and forget: no acknowledgment, no ordering guarantee
/// against local mutations, and a receiver that falls more than `capacity`
/// events behind loses the oldest ones.
pub struct ReplicaBus {
    sender: broadcast::Sender<ReplicaEvent>,
}

impl ReplicaBus {
    /// Create a bus able to buffer `capacity` undelivered events per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ReplicaBus { sender }
    }

    /// Mints a channel with a fresh origin id for one replica
    pub fn join(&self) -> ReplicaChannel {
        ReplicaChannel {
            origin: Uuid::new_v4(),
            sender: self.sender.clone(),
        }
    }
}

/// One replica's handle on the bus. Publishing stamps events with the
/// channel's origin, which is what lets the replica ignore its own
/// notifications when they come back around.
#[derive(Debug, Clone)]
pub struct ReplicaChannel {
    origin: Uuid,
    sender: broadcast::Sender<ReplicaEvent>,
}

impl ReplicaChannel {
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Serializes and publishes the full collection. A serialization
    /// failure or an empty bus is logged, never surfaced.
    pub fn publish(&self, records: &[Submission]) {
        match serde_json::to_string(records) {
            Ok(payload) => self.publish_raw(payload),
            Err(e) => warn!("Failed to serialize replica notification: {e}"),
        }
    }

    /// Publishes an already-serialized payload verbatim
    pub fn publish_raw(&self, payload: impl Into<Arc<str>>) {
        let event = ReplicaEvent {
            origin: self.origin,
            payload: payload.into(),
        };
        if self.sender.send(event).is_err() {
            debug!("No replica is listening, notification dropped");
        }
    }

    /// Subscribes to events from every channel on the bus, this one's own
    /// included; filtering by origin is the subscriber's job
    pub fn subscribe(&self) -> broadcast::Receiver<ReplicaEvent> {
        self.sender.subscribe()
    }
}
