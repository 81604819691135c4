//! Relationships: named relations a device participates in, and the
//! concrete edges minted from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::RelationshipInstanceId;
use crate::value::Value;

/// A named relation the device can take part in (e.g. containment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    name: String,
}

impl RelationshipDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mint a concrete edge from this relation to `target`.
    ///
    /// Each call produces an independent instance with its own identifier.
    #[must_use]
    pub fn create_instance(
        &self,
        target: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> RelationshipInstance {
        RelationshipInstance {
            id: RelationshipInstanceId::new(),
            relationship: self.clone(),
            target: target.into(),
            metadata,
        }
    }
}

/// One edge from this device to a named target, with free-form metadata.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipInstance {
    id: RelationshipInstanceId,
    relationship: RelationshipDescriptor,
    target: String,
    metadata: HashMap<String, Value>,
}

impl RelationshipInstance {
    #[must_use]
    pub fn id(&self) -> RelationshipInstanceId {
        self.id
    }

    #[must_use]
    pub fn relationship(&self) -> &RelationshipDescriptor {
        &self.relationship
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building_metadata() -> HashMap<String, Value> {
        HashMap::from([
            ("floor".to_string(), Value::from("f0")),
            ("room".to_string(), Value::from("r0")),
        ])
    }

    #[test]
    fn should_keep_target_and_metadata_unmodified() {
        let inside = RelationshipDescriptor::new("insideId");
        let instance = inside.create_instance("building-hq", building_metadata());

        assert_eq!(instance.target(), "building-hq");
        assert_eq!(instance.metadata(), &building_metadata());
        assert_eq!(instance.relationship().name(), "insideId");
    }

    #[test]
    fn should_mint_independent_instances() {
        let inside = RelationshipDescriptor::new("insideId");
        let a = inside.create_instance("building-hq", HashMap::new());
        let b = inside.create_instance("building-hq", HashMap::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn should_survive_json_encoding() {
        let inside = RelationshipDescriptor::new("insideId");
        let instance = inside.create_instance("building-hq", building_metadata());

        let json = serde_json::to_string(&instance).unwrap();
        let parsed: RelationshipInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, instance);
    }
}
