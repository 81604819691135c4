//! End-to-end runs of the demo adapter over the in-process bus.
//!
//! The test plays the shadowing layer: it subscribes to the bus, records the
//! announced capabilities and checks every later message against them.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use twinbridge_adapter_demo::DemoConfig;
use twinbridge_adapter_demo::DemoPhysicalAdapter;
use twinbridge_adapter_demo::capabilities::{
    OVERHEATING_EVENT_KEY, SET_TEMPERATURE_ACTION_KEY, TEMPERATURE_PROPERTY_KEY,
};
use twinbridge_app::event_bus::{BusPayload, Envelope, InProcessEventBus};
use twinbridge_app::ports::PhysicalAdapter;
use twinbridge_domain::event::{ActionRequest, OutboundEvent};
use twinbridge_domain::value::Value;

fn config() -> DemoConfig {
    DemoConfig {
        adapter_id: "sensor-1".to_string(),
        update_count: 3,
        ..DemoConfig::default()
    }
}

fn drain(rx: &mut broadcast::Receiver<Envelope>) -> Vec<Envelope> {
    let mut envelopes = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(envelope) => envelopes.push(envelope),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return envelopes,
            Err(TryRecvError::Lagged(skipped)) => panic!("lagged by {skipped}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn should_shadow_every_message_against_announced_capabilities() {
    let bus = InProcessEventBus::new(64);
    let mut rx = bus.subscribe();
    let mut adapter = DemoPhysicalAdapter::new(config(), bus.client("sensor-1")).unwrap();

    adapter.on_adapter_start().await.unwrap();
    adapter.wait_for_completion().await;
    adapter.on_adapter_stop().await;

    let envelopes = drain(&mut rx);
    let BusPayload::Capabilities(descriptor) = &envelopes[0].payload else {
        panic!("first message must be the capability announcement");
    };
    assert_eq!(envelopes[0].topic, "physical/sensor-1/capabilities");

    let mut temperatures = Vec::new();
    let mut overheating = Vec::new();
    let mut relationships = 0;
    for envelope in &envelopes[1..] {
        assert_eq!(envelope.adapter_id, "sensor-1");
        let BusPayload::Event(event) = &envelope.payload else {
            panic!("capabilities announced twice");
        };
        match event {
            OutboundEvent::PropertyChanged { key, value, .. } => {
                assert!(descriptor.property(key).is_some());
                temperatures.push(value.as_f64().unwrap());
            }
            OutboundEvent::DeviceEvent { key, body, .. } => {
                assert!(descriptor.event(key).is_some());
                overheating.push(body.as_str().unwrap().to_string());
            }
            OutboundEvent::RelationshipInstanceCreated { instance, .. } => {
                assert!(descriptor.relationship(instance.relationship().name()).is_some());
                assert_eq!(instance.target(), "building-hq");
                relationships += 1;
            }
        }
    }

    assert_eq!(temperatures.len(), 3);
    assert!(temperatures.iter().all(|t| (20.0..=30.0).contains(t)));
    assert_eq!(overheating, vec!["normal", "critical"]);
    assert_eq!(relationships, 1);
    assert!(descriptor.property(TEMPERATURE_PROPERTY_KEY).is_some());
    assert!(descriptor.event(OVERHEATING_EVENT_KEY).is_some());
}

#[tokio::test(start_paused = true)]
async fn should_encode_envelopes_as_tagged_json() {
    let bus = InProcessEventBus::new(64);
    let mut rx = bus.subscribe();
    let mut adapter = DemoPhysicalAdapter::new(config(), bus.client("sensor-1")).unwrap();

    adapter.on_adapter_start().await.unwrap();
    adapter.wait_for_completion().await;

    let envelopes = drain(&mut rx);
    let property = envelopes
        .iter()
        .find(|envelope| envelope.topic.contains("/property/"))
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&property.to_json().unwrap()).unwrap();

    assert_eq!(json["adapter_id"], "sensor-1");
    assert_eq!(json["payload"]["kind"], "event");
    assert_eq!(json["payload"]["data"]["type"], "property_changed");
    assert_eq!(json["payload"]["data"]["key"], TEMPERATURE_PROPERTY_KEY);
    assert!(json["payload"]["data"]["value"].is_f64());
}

#[tokio::test(start_paused = true)]
async fn should_stop_publishing_once_stopped() {
    let bus = InProcessEventBus::new(64);
    let mut rx = bus.subscribe();
    let mut adapter = DemoPhysicalAdapter::new(config(), bus.client("sensor-1")).unwrap();

    adapter.on_adapter_start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(11_500)).await;
    adapter.on_adapter_stop().await;
    let before = drain(&mut rx).len();

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(drain(&mut rx).len(), 0);
    assert!(before >= 3);
}

#[tokio::test(start_paused = true)]
async fn should_forward_valid_actions_and_drop_invalid_ones() {
    let bus = InProcessEventBus::new(64);
    let _rx = bus.subscribe();
    let mut adapter = DemoPhysicalAdapter::new(config(), bus.client("sensor-1")).unwrap();
    let mut actions = adapter.take_action_receiver().unwrap();

    adapter.on_incoming_action(ActionRequest::new("unknown-action", Value::Float(1.0)));
    adapter.on_incoming_action(ActionRequest::new(
        SET_TEMPERATURE_ACTION_KEY,
        Value::from("hot"),
    ));
    adapter.on_incoming_action(ActionRequest::new(
        SET_TEMPERATURE_ACTION_KEY,
        Value::Float(22.5),
    ));

    let accepted = actions.try_recv().unwrap();
    assert_eq!(accepted.key, SET_TEMPERATURE_ACTION_KEY);
    assert_eq!(accepted.body, Value::Float(22.5));
    assert!(actions.try_recv().is_err());
}
