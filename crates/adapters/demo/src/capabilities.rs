//! The capability descriptor of the emulated temperature sensor.

use twinbridge_domain::capability::{
    ActionDescriptor, CapabilityDescriptor, EventDescriptor, PropertyDescriptor,
};
use twinbridge_domain::error::ValidationError;
use twinbridge_domain::relationship::RelationshipDescriptor;
use twinbridge_domain::value::ValueKind;

/// Measured temperature, in degrees Celsius.
pub const TEMPERATURE_PROPERTY_KEY: &str = "temperature-property-key";
/// Overheating condition, body `"normal"` or `"critical"`.
pub const OVERHEATING_EVENT_KEY: &str = "overheating-event-key";
/// Requested target temperature.
pub const SET_TEMPERATURE_ACTION_KEY: &str = "set-temperature-action-key";
/// Containment: the device is inside the relationship's target.
pub const INSIDE_RELATIONSHIP: &str = "insideId";

pub const SET_TEMPERATURE_ACTION_TYPE: &str = "temperature.actuation";
pub const TEXT_PLAIN: &str = "text/plain";

/// Body of the baseline overheating event.
pub const OVERHEATING_NORMAL: &str = "normal";
/// Body of the end-of-run overheating event.
pub const OVERHEATING_CRITICAL: &str = "critical";

/// Build the sensor's descriptor. Deterministic.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the declarations clash, which the
/// hardcoded keys never do.
pub fn describe() -> Result<CapabilityDescriptor, ValidationError> {
    CapabilityDescriptor::builder()
        .property(PropertyDescriptor::new(TEMPERATURE_PROPERTY_KEY, 0.0))
        .event(EventDescriptor::new(OVERHEATING_EVENT_KEY, TEXT_PLAIN))
        .action(ActionDescriptor::new(
            SET_TEMPERATURE_ACTION_KEY,
            SET_TEMPERATURE_ACTION_TYPE,
            TEXT_PLAIN,
            ValueKind::Float,
        ))
        .relationship(RelationshipDescriptor::new(INSIDE_RELATIONSHIP))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinbridge_domain::value::Value;

    #[test]
    fn should_declare_temperature_with_zero_default() {
        let descriptor = describe().unwrap();
        let property = descriptor.property(TEMPERATURE_PROPERTY_KEY).unwrap();
        assert_eq!(property.initial_value, Value::Float(0.0));
    }

    #[test]
    fn should_declare_plain_text_overheating_event() {
        let descriptor = describe().unwrap();
        let event = descriptor.event(OVERHEATING_EVENT_KEY).unwrap();
        assert_eq!(event.content_type, TEXT_PLAIN);
    }

    #[test]
    fn should_declare_float_set_temperature_action() {
        let descriptor = describe().unwrap();
        let action = descriptor.action(SET_TEMPERATURE_ACTION_KEY).unwrap();
        assert_eq!(action.action_type, SET_TEMPERATURE_ACTION_TYPE);
        assert_eq!(action.body_kind, ValueKind::Float);
    }

    #[test]
    fn should_declare_containment_relationship() {
        let descriptor = describe().unwrap();
        assert_eq!(descriptor.relationships().len(), 1);
        assert!(descriptor.relationship(INSIDE_RELATIONSHIP).is_some());
    }

    #[test]
    fn should_produce_identical_descriptors() {
        assert_eq!(describe().unwrap(), describe().unwrap());
    }
}
