//! Event bus port: the single outbound publication contract of an adapter.

use std::future::Future;

use twinbridge_domain::capability::CapabilityDescriptor;
use twinbridge_domain::error::PublishError;
use twinbridge_domain::relationship::RelationshipInstance;
use twinbridge_domain::value::Value;

/// Publishes adapter output towards the shadowing layer.
///
/// Every call is one logical publish: implementations neither batch nor
/// reorder, and never retry on their own. Implementations must be safe to
/// call concurrently from several tasks.
pub trait EventBusClient {
    /// Notify that the property `key` took `value`.
    fn publish_property(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Emit the declared event `key` with `body`.
    fn publish_device_event(
        &self,
        key: &str,
        body: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Notify that a relationship instance was created.
    fn publish_relationship_instance(
        &self,
        instance: RelationshipInstance,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Hand the device's capabilities to the shadowing layer.
    fn announce_capabilities(
        &self,
        descriptor: CapabilityDescriptor,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

impl<T: EventBusClient + Send + Sync> EventBusClient for std::sync::Arc<T> {
    fn publish_property(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish_property(key, value)
    }

    fn publish_device_event(
        &self,
        key: &str,
        body: Value,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish_device_event(key, body)
    }

    fn publish_relationship_instance(
        &self,
        instance: RelationshipInstance,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish_relationship_instance(instance)
    }

    fn announce_capabilities(
        &self,
        descriptor: CapabilityDescriptor,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).announce_capabilities(descriptor)
    }
}
