//! # twinbridged: digital twin bridge daemon
//!
//! Composition root that wires the demo physical adapter to the in-process
//! event bus.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Construct the event bus and the adapter, injecting the bus client
//! - Mirror every bus envelope to the log as JSON
//! - Log accepted action requests
//! - Stop on Ctrl-C or once the emulation has run to completion
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use twinbridge_adapter_demo::DemoPhysicalAdapter;
use twinbridge_app::event_bus::{BusPayload, Envelope, InProcessEventBus};
use twinbridge_app::ports::PhysicalAdapter;
use twinbridge_domain::event::ActionRequest;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Event bus
    let bus = InProcessEventBus::new(config.bus.capacity);
    let mirror = tokio::spawn(mirror(bus.subscribe()));

    // Adapter
    let client = bus.client(config.adapter.adapter_id.clone());
    let mut adapter = DemoPhysicalAdapter::new(config.adapter, client)?;
    let actuator = adapter
        .take_action_receiver()
        .map(|actions| tokio::spawn(actuate(actions)));

    let adapter_id = adapter.id().to_string();
    adapter.on_adapter_start().await?;
    tracing::info!(adapter = %adapter_id, "twinbridged running");

    tokio::select! {
        () = adapter.wait_for_completion() => {
            tracing::info!(adapter = %adapter_id, "emulation completed");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::error!(%err, "unable to listen for shutdown signal");
            }
            tracing::info!(adapter = %adapter_id, "shutdown requested");
        }
    }

    adapter.on_adapter_stop().await;

    // Dropping the last bus and action senders lets both consumers drain
    // what was already delivered and then end on their own.
    drop(adapter);
    drop(bus);
    match mirror.await {
        Ok(mirrored) => tracing::info!(mirrored, "bus mirror drained"),
        Err(err) => tracing::error!(%err, "bus mirror failed"),
    }
    if let Some(actuator) = actuator {
        match actuator.await {
            Ok(actuated) => tracing::debug!(actuated, "actuator drained"),
            Err(err) => tracing::error!(%err, "actuator failed"),
        }
    }
    tracing::info!(adapter = %adapter_id, "twinbridged stopped");
    Ok(())
}

/// Stand-in for the shadowing layer: log every envelope as JSON.
///
/// Runs until every sender of the bus is gone and returns how many envelopes
/// were mirrored.
async fn mirror(mut rx: broadcast::Receiver<Envelope>) -> usize {
    let mut mirrored = 0;
    loop {
        match rx.recv().await {
            Ok(envelope) => {
                mirrored += 1;
                let kind = match envelope.payload {
                    BusPayload::Capabilities(_) => "capabilities",
                    BusPayload::Event(_) => "event",
                };
                match envelope.to_json() {
                    Ok(json) => tracing::info!(topic = %envelope.topic, kind, %json, "bus"),
                    Err(err) => tracing::warn!(topic = %envelope.topic, %err, "unencodable envelope"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "mirror lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => return mirrored,
        }
    }
}

async fn actuate(mut actions: mpsc::Receiver<ActionRequest>) -> usize {
    let mut actuated = 0;
    while let Some(request) = actions.recv().await {
        tracing::info!(action = %request.key, body = %request.body, "actuating");
        actuated += 1;
    }
    actuated
}
