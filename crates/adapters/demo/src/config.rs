//! Demo adapter configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the emulated temperature sensor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Adapter identifier, used to address bus topics.
    pub adapter_id: String,
    /// Emulated boot latency before the capabilities are announced.
    pub announce_delay_ms: u64,
    /// Delay before telemetry starts.
    pub telemetry_delay_ms: u64,
    /// Time between two temperature samples.
    pub update_interval_ms: u64,
    /// Number of temperature samples per run.
    pub update_count: u32,
    /// Lower bound (inclusive) of generated temperatures.
    pub temperature_min: f64,
    /// Upper bound (inclusive) of generated temperatures.
    pub temperature_max: f64,
    /// Capacity of the accepted-action queue.
    pub action_buffer: usize,
    /// Publish [`relationship`](Self::relationship) right after the announcement.
    pub publish_relationship: bool,
    /// Where the device is located.
    pub relationship: RelationshipConfig,
}

/// Target of the containment relationship published after announcement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    pub target: String,
    pub metadata: HashMap<String, String>,
}

impl DemoConfig {
    #[must_use]
    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }

    #[must_use]
    pub fn telemetry_delay(&self) -> Duration {
        Duration::from_millis(self.telemetry_delay_ms)
    }

    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Check the values the adapter relies on.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adapter_id.is_empty() {
            return Err(ConfigError::EmptyAdapterId);
        }
        check_temperature_range(self.temperature_min, self.temperature_max)?;
        if self.update_interval_ms == 0 {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        if self.action_buffer == 0 {
            return Err(ConfigError::ZeroActionBuffer);
        }
        Ok(())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            adapter_id: "demo-physical-adapter".to_string(),
            announce_delay_ms: 5_000,
            telemetry_delay_ms: 10_000,
            update_interval_ms: 1_000,
            update_count: 10,
            temperature_min: 20.0,
            temperature_max: 30.0,
            action_buffer: 16,
            publish_relationship: true,
            relationship: RelationshipConfig::default(),
        }
    }
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            target: "building-hq".to_string(),
            metadata: HashMap::from([
                ("floor".to_string(), "f0".to_string()),
                ("room".to_string(), "r0".to_string()),
            ]),
        }
    }
}

/// A sampleable closed interval: ordered bounds whose width is finite.
///
/// The width is scaled the way `rand`'s inclusive float sampler scales it,
/// which overflows slightly before `f64::MAX`.
pub(crate) fn check_temperature_range(min: f64, max: f64) -> Result<(), ConfigError> {
    if min > max || !((max - min) / (1.0 - f64::EPSILON)).is_finite() {
        return Err(ConfigError::InvalidTemperatureRange { min, max });
    }
    Ok(())
}

/// Invalid demo adapter configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("adapter id must not be empty")]
    EmptyAdapterId,

    #[error("invalid temperature range [{min}, {max}]")]
    InvalidTemperatureRange { min: f64, max: f64 },

    #[error("update interval must be non-zero")]
    ZeroUpdateInterval,

    #[error("action buffer must be non-zero")]
    ZeroActionBuffer,
}
