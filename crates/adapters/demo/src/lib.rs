//! # twinbridge-adapter-demo
//!
//! Demo physical adapter emulating a temperature sensor for the shadowing
//! layer.
//!
//! ## Behaviour
//!
//! | Step | When | Output |
//! |------|------|--------|
//! | Announcement | after `announce_delay_ms` | capability descriptor, then the `insideId` relationship instance |
//! | Baseline | after `telemetry_delay_ms` and the announcement | `overheating-event-key = "normal"` |
//! | Telemetry | every `update_interval_ms`, `update_count` times | `temperature-property-key` in `[temperature_min, temperature_max]` |
//! | End of run | after the last sample | `overheating-event-key = "critical"` |
//!
//! Inbound `set-temperature-action-key` requests with a float body are
//! accepted and forwarded to [`DemoPhysicalAdapter::take_action_receiver`];
//! anything else is rejected and logged.
//!
//! ## Dependency rule
//!
//! Depends on `twinbridge-app` (port traits) and `twinbridge-domain` only.

mod announcement;
pub mod capabilities;
mod command;
mod config;
mod error;
mod telemetry;
#[cfg(test)]
mod testing;

pub use announcement::Announcement;
pub use command::CommandHandler;
pub use config::{ConfigError, DemoConfig, RelationshipConfig};
pub use error::DemoError;
pub use telemetry::TemperatureSampler;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use twinbridge_app::lifecycle::{LifecycleState, TaskSupervisor};
use twinbridge_app::ports::{EventBusClient, PhysicalAdapter};
use twinbridge_domain::error::{LifecycleError, TwinBridgeError};
use twinbridge_domain::event::ActionRequest;
use twinbridge_domain::relationship::RelationshipInstance;
use twinbridge_domain::value::Value;

use announcement::{AnnouncementTask, RelationshipSlot};
use telemetry::{Schedule, TelemetryTask};

/// The emulated temperature sensor.
pub struct DemoPhysicalAdapter<B> {
    config: DemoConfig,
    bus: Arc<B>,
    sampler: TemperatureSampler,
    commands: CommandHandler,
    supervisor: TaskSupervisor,
    relationship: RelationshipSlot,
    announcement: watch::Receiver<Announcement>,
    action_rx: Option<mpsc::Receiver<ActionRequest>>,
}

impl<B: EventBusClient + Send + Sync + 'static> DemoPhysicalAdapter<B> {
    /// Create an adapter in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Config`] for an invalid configuration.
    pub fn new(config: DemoConfig, bus: B) -> Result<Self, DemoError> {
        config.validate()?;
        let sampler = TemperatureSampler::new(config.temperature_min, config.temperature_max)?;
        let actions = capabilities::describe()
            .map_err(DemoError::Capabilities)?
            .actions()
            .to_vec();
        let (action_tx, action_rx) = mpsc::channel(config.action_buffer);
        // Replaced by the live channel on start.
        let (_, announcement) = watch::channel(Announcement::default());

        Ok(Self {
            supervisor: TaskSupervisor::new(config.adapter_id.clone()),
            config,
            bus: Arc::new(bus),
            sampler,
            commands: CommandHandler::new(actions, action_tx),
            relationship: RelationshipSlot::default(),
            announcement,
            action_rx: Some(action_rx),
        })
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.supervisor.state()
    }

    /// Current announcement outcome.
    #[must_use]
    pub fn announcement(&self) -> Announcement {
        self.announcement.borrow().clone()
    }

    /// Receiver of the accepted action requests. Only the first call
    /// returns `Some`.
    pub fn take_action_receiver(&mut self) -> Option<mpsc::Receiver<ActionRequest>> {
        self.action_rx.take()
    }

    /// Launch the announcement and telemetry tasks and return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyStarted`] on a second call,
    /// [`LifecycleError::Terminated`] after [`stop`](Self::stop) and
    /// [`LifecycleError::NoRuntime`] outside a tokio runtime. The adapter
    /// stays in its previous state on error.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.supervisor.begin()?;
        let (outcome, outcome_rx) = watch::channel(Announcement::default());
        self.announcement = outcome_rx;

        let announcement = AnnouncementTask {
            adapter_id: self.config.adapter_id.clone(),
            bus: Arc::clone(&self.bus),
            delay: self.config.announce_delay(),
            slot: Arc::clone(&self.relationship),
            outcome,
            relationship: self
                .config
                .publish_relationship
                .then(|| self.config.relationship.clone()),
            shutdown: self.supervisor.shutdown_signal(),
        };
        let telemetry = TelemetryTask {
            adapter_id: self.config.adapter_id.clone(),
            bus: Arc::clone(&self.bus),
            schedule: Schedule::from(&self.config),
            sampler: self.sampler,
            announcement: self.announcement.clone(),
            shutdown: self.supervisor.shutdown_signal(),
        };

        self.supervisor.spawn("announcement", announcement.run());
        self.supervisor.spawn("telemetry", telemetry.run());
        tracing::info!(adapter = %self.config.adapter_id, "adapter started");
        Ok(())
    }

    /// Cancel both tasks at their next suspension point and wait for them.
    ///
    /// A no-op before [`start`](Self::start) or after a previous stop.
    pub async fn stop(&mut self) {
        self.supervisor.stop().await;
    }

    /// Wait until both tasks have run to completion on their own.
    pub async fn wait_for_completion(&mut self) {
        self.supervisor.wait_idle().await;
    }

    /// Mint an instance of the containment relationship and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAnnounced`] (publishing nothing) until
    /// the capabilities have been announced, or the bus's publish error.
    pub async fn publish_relationship_instance(
        &self,
        target: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> Result<RelationshipInstance, TwinBridgeError> {
        announcement::publish_relationship_instance(
            self.bus.as_ref(),
            &self.relationship,
            target.into(),
            metadata,
        )
        .await
    }
}

impl<B: EventBusClient + Send + Sync + 'static> PhysicalAdapter for DemoPhysicalAdapter<B> {
    fn id(&self) -> &str {
        &self.config.adapter_id
    }

    async fn on_adapter_start(&mut self) -> Result<(), LifecycleError> {
        self.start()
    }

    async fn on_adapter_stop(&mut self) {
        self.stop().await;
    }

    fn on_incoming_action(&self, request: ActionRequest) {
        if let Err(err) = self.commands.handle(request) {
            tracing::warn!(adapter = %self.config.adapter_id, %err, "action request rejected");
        }
    }
}
