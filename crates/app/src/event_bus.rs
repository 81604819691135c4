//! In-process event bus backed by a tokio broadcast channel.
//!
//! Messages are wrapped in an [`Envelope`] addressed by topic:
//!
//! | Payload | Topic |
//! |---------|-------|
//! | Capability announcement | `physical/<adapter>/capabilities` |
//! | Property change | `physical/<adapter>/property/<key>` |
//! | Device event | `physical/<adapter>/event/<key>` |
//! | Relationship instance | `physical/<adapter>/relationship/<name>` |

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use twinbridge_domain::capability::CapabilityDescriptor;
use twinbridge_domain::error::PublishError;
use twinbridge_domain::event::OutboundEvent;
use twinbridge_domain::id::EventId;
use twinbridge_domain::relationship::RelationshipInstance;
use twinbridge_domain::value::Value;

use crate::ports::EventBusClient;

/// What an [`Envelope`] carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum BusPayload {
    Capabilities(CapabilityDescriptor),
    Event(OutboundEvent),
}

/// A single message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EventId,
    pub topic: String,
    pub adapter_id: String,
    pub payload: BusPayload,
}

impl Envelope {
    /// Encode the envelope for an external sink.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Serialization`] if the payload cannot be
    /// represented as JSON.
    pub fn to_json(&self) -> Result<String, PublishError> {
        serde_json::to_string(self).map_err(PublishError::Serialization)
    }
}

/// Topic helpers for the `physical/<adapter>/...` namespace.
pub mod topic {
    #[must_use]
    pub fn capabilities(adapter_id: &str) -> String {
        format!("physical/{adapter_id}/capabilities")
    }

    #[must_use]
    pub fn property(adapter_id: &str, key: &str) -> String {
        format!("physical/{adapter_id}/property/{key}")
    }

    #[must_use]
    pub fn event(adapter_id: &str, key: &str) -> String {
        format!("physical/{adapter_id}/event/{key}")
    }

    #[must_use]
    pub fn relationship(adapter_id: &str, name: &str) -> String {
        format!("physical/{adapter_id}/relationship/{name}")
    }
}

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Unlike a fire-and-forget bus, publishing fails with
/// [`PublishError::NoSubscribers`] when nobody listens, and with
/// [`PublishError::Closed`] once [`close`](Self::close) was called, so the
/// caller always learns that a message went nowhere.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Envelope>,
    closed: Arc<AtomicBool>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to every topic.
    ///
    /// Returns a receiver that will get all envelopes published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Create a client publishing under `adapter_id`'s topics.
    #[must_use]
    pub fn client(&self, adapter_id: impl Into<String>) -> InProcessBusClient {
        InProcessBusClient {
            adapter_id: adapter_id.into(),
            bus: self.clone(),
        }
    }

    /// Refuse every further publish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn send(&self, envelope: Envelope) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        let topic = envelope.topic.clone();
        self.sender.send(envelope).map_err(|_| {
            tracing::debug!(%topic, "dropping envelope, no subscriber");
            PublishError::NoSubscribers { topic }
        })?;
        Ok(())
    }
}

/// [`EventBusClient`] bound to one adapter's topics on an
/// [`InProcessEventBus`].
#[derive(Clone)]
pub struct InProcessBusClient {
    adapter_id: String,
    bus: InProcessEventBus,
}

impl InProcessBusClient {
    fn envelope(&self, topic: String, payload: BusPayload) -> Envelope {
        Envelope {
            id: EventId::new(),
            topic,
            adapter_id: self.adapter_id.clone(),
            payload,
        }
    }

    fn publish_event(&self, topic: String, event: OutboundEvent) -> Result<(), PublishError> {
        self.bus.send(self.envelope(topic, BusPayload::Event(event)))
    }
}

impl EventBusClient for InProcessBusClient {
    fn publish_property(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let result = self.publish_event(
            topic::property(&self.adapter_id, key),
            OutboundEvent::property_changed(key, value),
        );
        async { result }
    }

    fn publish_device_event(
        &self,
        key: &str,
        body: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let result = self.publish_event(
            topic::event(&self.adapter_id, key),
            OutboundEvent::device_event(key, body),
        );
        async { result }
    }

    fn publish_relationship_instance(
        &self,
        instance: RelationshipInstance,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let topic = topic::relationship(&self.adapter_id, instance.relationship().name());
        let result =
            self.publish_event(topic, OutboundEvent::relationship_instance_created(instance));
        async { result }
    }

    fn announce_capabilities(
        &self,
        descriptor: CapabilityDescriptor,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let envelope = self.envelope(
            topic::capabilities(&self.adapter_id),
            BusPayload::Capabilities(descriptor),
        );
        let result = self.bus.send(envelope);
        async { result }
    }
}
