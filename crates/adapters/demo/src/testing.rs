//! Bus double recording every successful publish, with failure injection.

use std::future::Future;
use std::sync::Mutex;

use twinbridge_app::ports::EventBusClient;
use twinbridge_domain::capability::CapabilityDescriptor;
use twinbridge_domain::error::PublishError;
use twinbridge_domain::relationship::RelationshipInstance;
use twinbridge_domain::value::Value;

#[derive(Debug, Clone)]
pub enum Call {
    Announce(CapabilityDescriptor),
    Property(String, Value),
    Event(String, Value),
    Relationship(RelationshipInstance),
}

#[derive(Default)]
pub struct RecordingBus {
    calls: Mutex<Vec<Call>>,
    announcements: Mutex<usize>,
    fail_announcement: bool,
    fail_properties: bool,
    closed_after: Option<usize>,
}

impl RecordingBus {
    pub fn failing_announcement() -> Self {
        Self {
            fail_announcement: true,
            ..Self::default()
        }
    }

    pub fn failing_properties() -> Self {
        Self {
            fail_properties: true,
            ..Self::default()
        }
    }

    /// Accept `count` publishes, then behave like a shut-down transport.
    pub fn closed_after(count: usize) -> Self {
        Self {
            closed_after: Some(count),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of announcement attempts, failed ones included.
    pub fn announcements(&self) -> usize {
        *self.announcements.lock().unwrap()
    }

    pub fn properties(&self) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Property(_, value) => value.as_f64(),
                _ => None,
            })
            .collect()
    }

    pub fn event_bodies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Event(_, Value::String(body)) => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, fail: bool) -> Result<(), PublishError> {
        let mut calls = self.calls.lock().unwrap();
        if self.closed_after.is_some_and(|limit| calls.len() >= limit) {
            return Err(PublishError::Closed);
        }
        if fail {
            return Err(PublishError::NoSubscribers {
                topic: "test".to_string(),
            });
        }
        calls.push(call);
        Ok(())
    }
}

impl EventBusClient for RecordingBus {
    fn publish_property(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let result = self.record(Call::Property(key.to_string(), value), self.fail_properties);
        async { result }
    }

    fn publish_device_event(
        &self,
        key: &str,
        body: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let result = self.record(Call::Event(key.to_string(), body), false);
        async { result }
    }

    fn publish_relationship_instance(
        &self,
        instance: RelationshipInstance,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let result = self.record(Call::Relationship(instance), false);
        async { result }
    }

    fn announce_capabilities(
        &self,
        descriptor: CapabilityDescriptor,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        *self.announcements.lock().unwrap() += 1;
        let result = self.record(Call::Announce(descriptor), self.fail_announcement);
        async { result }
    }
}
