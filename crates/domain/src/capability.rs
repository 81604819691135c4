//! Capability descriptor: what a device instance announces to the
//! shadowing layer: measurable properties, emittable events, invocable
//! actions and the relationships it can take part in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::relationship::RelationshipDescriptor;
use crate::value::{Value, ValueKind};

/// A measurable quantity with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub key: String,
    pub initial_value: Value,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn new(key: impl Into<String>, initial_value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            initial_value: initial_value.into(),
        }
    }
}

/// A named event the device may emit, with the content type of its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub key: String,
    pub content_type: String,
}

impl EventDescriptor {
    #[must_use]
    pub fn new(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content_type: content_type.into(),
        }
    }
}

/// An invocable command.
///
/// `body_kind` is the value class an inbound request body must have to be
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub key: String,
    pub action_type: String,
    pub content_type: String,
    pub body_kind: ValueKind,
}

impl ActionDescriptor {
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
        body_kind: ValueKind,
    ) -> Self {
        Self {
            key: key.into(),
            action_type: action_type.into(),
            content_type: content_type.into(),
            body_kind,
        }
    }
}

/// The frozen set of capabilities of one adapter instance.
///
/// Only obtainable through [`CapabilityDescriptorBuilder::build`], which
/// guarantees keys are unique within each category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    properties: Vec<PropertyDescriptor>,
    events: Vec<EventDescriptor>,
    actions: Vec<ActionDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
}

impl CapabilityDescriptor {
    /// Create a builder for constructing a [`CapabilityDescriptor`].
    #[must_use]
    pub fn builder() -> CapabilityDescriptorBuilder {
        CapabilityDescriptorBuilder::default()
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    #[must_use]
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    #[must_use]
    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.relationships
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.key == key)
    }

    #[must_use]
    pub fn event(&self, key: &str) -> Option<&EventDescriptor> {
        self.events.iter().find(|e| e.key == key)
    }

    #[must_use]
    pub fn action(&self, key: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.key == key)
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.name() == name)
    }
}

/// Step-by-step builder for [`CapabilityDescriptor`].
///
/// Declarations keep their insertion order.
#[derive(Debug, Default)]
pub struct CapabilityDescriptorBuilder {
    properties: Vec<PropertyDescriptor>,
    events: Vec<EventDescriptor>,
    actions: Vec<ActionDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
}

impl CapabilityDescriptorBuilder {
    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn event(mut self, event: EventDescriptor) -> Self {
        self.events.push(event);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Consume the builder, validate, and return a [`CapabilityDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyKey`] or
    /// [`ValidationError::DuplicateKey`] when a category holds an empty or
    /// repeated key.
    pub fn build(self) -> Result<CapabilityDescriptor, ValidationError> {
        check_keys("property", self.properties.iter().map(|p| p.key.as_str()))?;
        check_keys("event", self.events.iter().map(|e| e.key.as_str()))?;
        check_keys("action", self.actions.iter().map(|a| a.key.as_str()))?;
        check_keys("relationship", self.relationships.iter().map(RelationshipDescriptor::name))?;

        Ok(CapabilityDescriptor {
            properties: self.properties,
            events: self.events,
            actions: self.actions,
            relationships: self.relationships,
        })
    }
}

fn check_keys<'a>(
    category: &'static str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for key in keys {
        if key.is_empty() {
            return Err(ValidationError::EmptyKey { category });
        }
        if !seen.insert(key) {
            return Err(ValidationError::DuplicateKey {
                category,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}
