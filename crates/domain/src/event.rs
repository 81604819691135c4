//! Events: notifications flowing between the device and the shadowing layer.
//!
//! Outbound events are transient: constructed, published, then dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::relationship::RelationshipInstance;
use crate::value::Value;

/// UTC timestamp attached to outbound events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A notification sent from the device towards the shadowing layer.
///
/// Property and event keys must have been declared in the capability
/// descriptor announced by the same adapter; the shadowing layer may ignore
/// anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// A measured property took a new value.
    PropertyChanged {
        key: String,
        value: Value,
        timestamp: Timestamp,
    },
    /// The device emitted a declared event.
    DeviceEvent {
        key: String,
        body: Value,
        timestamp: Timestamp,
    },
    /// A new relationship edge was created.
    RelationshipInstanceCreated {
        instance: RelationshipInstance,
        timestamp: Timestamp,
    },
}

impl OutboundEvent {
    #[must_use]
    pub fn property_changed(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::PropertyChanged {
            key: key.into(),
            value: value.into(),
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn device_event(key: impl Into<String>, body: impl Into<Value>) -> Self {
        Self::DeviceEvent {
            key: key.into(),
            body: body.into(),
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn relationship_instance_created(instance: RelationshipInstance) -> Self {
        Self::RelationshipInstanceCreated {
            instance,
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::PropertyChanged { timestamp, .. }
            | Self::DeviceEvent { timestamp, .. }
            | Self::RelationshipInstanceCreated { timestamp, .. } => *timestamp,
        }
    }
}

/// An inbound command addressed to one of the device's declared actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub key: String,
    pub body: Value,
}

impl ActionRequest {
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
        }
    }
}
