//! Telemetry emulation: the timed loop that plays the sensor.
//!
//! One run publishes:
//!
//! 1. `overheating = "normal"`
//! 2. `update_count` temperature samples, one per `update_interval`
//! 3. `overheating = "critical"`
//!
//! The loop starts after its own startup delay *and* after the announcement
//! has succeeded. A failed publish is logged and skipped; a closed transport
//! ends the run early.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;

use twinbridge_app::lifecycle::{Cancelled, ShutdownSignal};
use twinbridge_app::ports::EventBusClient;
use twinbridge_domain::capability::CapabilityDescriptor;
use twinbridge_domain::error::PublishError;
use twinbridge_domain::value::Value;

use crate::announcement::Announcement;
use crate::capabilities::{
    OVERHEATING_CRITICAL, OVERHEATING_EVENT_KEY, OVERHEATING_NORMAL, TEMPERATURE_PROPERTY_KEY,
};
use crate::config::{ConfigError, DemoConfig, check_temperature_range};

/// Uniform sampler over a closed temperature interval.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureSampler {
    min: f64,
    max: f64,
}

impl TemperatureSampler {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemperatureRange`] unless `min <= max`
    /// and `max - min` is finite.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        check_temperature_range(min, max)?;
        Ok(Self { min, max })
    }

    /// Draw a value in `[min, max]`.
    #[must_use]
    pub fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Timing of one emulation run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Schedule {
    pub startup_delay: Duration,
    pub interval: Duration,
    pub count: u32,
}

impl From<&DemoConfig> for Schedule {
    fn from(config: &DemoConfig) -> Self {
        Self {
            startup_delay: config.telemetry_delay(),
            interval: config.update_interval(),
            count: config.update_count,
        }
    }
}

/// Why a run ended before publishing its last event.
#[derive(Debug)]
enum Halt {
    Cancelled,
    AnnouncementFailed,
    UndeclaredKey(&'static str),
    Transport(PublishError),
}

impl From<Cancelled> for Halt {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

#[derive(Debug, Default)]
struct Report {
    published: usize,
    failed: usize,
}

pub(crate) struct TelemetryTask<B> {
    pub adapter_id: String,
    pub bus: Arc<B>,
    pub schedule: Schedule,
    pub sampler: TemperatureSampler,
    pub announcement: watch::Receiver<Announcement>,
    pub shutdown: ShutdownSignal,
}

impl<B: EventBusClient + Send + Sync + 'static> TelemetryTask<B> {
    pub async fn run(mut self) {
        let mut report = Report::default();
        match self.emulate(&mut report).await {
            Ok(()) => tracing::info!(
                adapter = %self.adapter_id,
                published = report.published,
                failed = report.failed,
                "device emulation complete"
            ),
            Err(Halt::Cancelled) => tracing::info!(
                adapter = %self.adapter_id,
                published = report.published,
                "device emulation cancelled"
            ),
            Err(Halt::AnnouncementFailed) => tracing::warn!(
                adapter = %self.adapter_id,
                "capabilities were not announced, skipping device emulation"
            ),
            Err(Halt::UndeclaredKey(key)) => tracing::error!(
                adapter = %self.adapter_id,
                key,
                "telemetry key missing from announced capabilities"
            ),
            Err(Halt::Transport(err)) => tracing::error!(
                adapter = %self.adapter_id,
                %err,
                published = report.published,
                "event bus unavailable, device emulation aborted"
            ),
        }
    }

    async fn emulate(&mut self, report: &mut Report) -> Result<(), Halt> {
        tracing::info!(
            adapter = %self.adapter_id,
            delay_ms = self.schedule.startup_delay.as_millis(),
            "sleeping before starting device emulation"
        );
        self.shutdown.sleep(self.schedule.startup_delay).await?;

        let descriptor = self.wait_for_announcement().await?;
        if descriptor.property(TEMPERATURE_PROPERTY_KEY).is_none() {
            return Err(Halt::UndeclaredKey(TEMPERATURE_PROPERTY_KEY));
        }
        if descriptor.event(OVERHEATING_EVENT_KEY).is_none() {
            return Err(Halt::UndeclaredKey(OVERHEATING_EVENT_KEY));
        }

        tracing::info!(adapter = %self.adapter_id, "starting device emulation");
        let outcome = self
            .bus
            .publish_device_event(OVERHEATING_EVENT_KEY, Value::from(OVERHEATING_NORMAL))
            .await;
        self.tally(report, outcome)?;

        for _ in 0..self.schedule.count {
            self.shutdown.sleep(self.schedule.interval).await?;
            let temperature = self.sampler.sample();
            tracing::debug!(adapter = %self.adapter_id, temperature, "temperature sampled");
            let outcome = self
                .bus
                .publish_property(TEMPERATURE_PROPERTY_KEY, Value::Float(temperature))
                .await;
            self.tally(report, outcome)?;
        }

        let outcome = self
            .bus
            .publish_device_event(OVERHEATING_EVENT_KEY, Value::from(OVERHEATING_CRITICAL))
            .await;
        self.tally(report, outcome)
    }

    async fn wait_for_announcement(&mut self) -> Result<Arc<CapabilityDescriptor>, Halt> {
        loop {
            let current = self.announcement.borrow_and_update().clone();
            match current {
                Announcement::Announced(descriptor) => return Ok(descriptor),
                Announcement::Failed => return Err(Halt::AnnouncementFailed),
                Announcement::Pending => {}
            }
            tracing::debug!(adapter = %self.adapter_id, "waiting for capability announcement");
            if self
                .shutdown
                .run_until(self.announcement.changed())
                .await?
                .is_err()
            {
                return Err(Halt::AnnouncementFailed);
            }
        }
    }

    fn tally(&self, report: &mut Report, outcome: Result<(), PublishError>) -> Result<(), Halt> {
        match outcome {
            Ok(()) => {
                report.published += 1;
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(Halt::Transport(err)),
            Err(err) => {
                tracing::warn!(adapter = %self.adapter_id, %err, "telemetry publish failed, skipping");
                report.failed += 1;
                Ok(())
            }
        }
    }
}
