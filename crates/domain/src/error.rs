//! Common error types used across the workspace.
//!
//! Each concern has its own typed error; [`TwinBridgeError`] gathers them for
//! the composition root via `#[from]` conversions.

use crate::value::ValueKind;

/// Top-level error for callers that deal with every layer at once.
#[derive(Debug, thiserror::Error)]
pub enum TwinBridgeError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("publish error")]
    Publish(#[from] PublishError),

    #[error("lifecycle error")]
    Lifecycle(#[from] LifecycleError),
}

/// A descriptor or inbound request violated a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A key was declared twice within the same capability category.
    #[error("duplicate {category} key {key:?}")]
    DuplicateKey { category: &'static str, key: String },

    /// A capability was declared with an empty key.
    #[error("empty {category} key")]
    EmptyKey { category: &'static str },

    /// An action request targeted a key that was never declared.
    #[error("unknown action {key:?}")]
    UnknownAction { key: String },

    /// An action request carried a body of the wrong type.
    #[error("action {key:?} expects a {expected} body, got {actual}")]
    BodyKindMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },
}

/// The event bus could not deliver a message.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Nobody is subscribed to the topic, so the message would be lost.
    #[error("no subscriber on topic {topic}")]
    NoSubscribers { topic: String },

    /// The payload could not be encoded for the transport.
    #[error("failed to serialize payload")]
    Serialization(#[source] serde_json::Error),

    /// The transport has been shut down.
    #[error("event bus closed")]
    Closed,
}

impl PublishError {
    /// Whether the transport is gone for good, as opposed to a single
    /// message failing.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Invalid use of the adapter lifecycle API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("adapter already started")]
    AlreadyStarted,

    #[error("adapter stopped, it cannot be restarted")]
    Terminated,

    /// The adapter tasks need a tokio runtime to be spawned on.
    #[error("no tokio runtime to run the adapter on")]
    NoRuntime,

    /// Relationship instances can only be minted after the capabilities
    /// (and therefore the relationship descriptor) have been announced.
    #[error("capabilities not announced yet")]
    NotAnnounced,
}
