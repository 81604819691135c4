//! Demo adapter error types.

use twinbridge_domain::error::ValidationError;

use crate::config::ConfigError;

/// Errors raised while setting up the demo adapter.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// The configuration is unusable.
    #[error("invalid demo adapter configuration")]
    Config(#[from] ConfigError),

    /// The hardcoded capability declarations clash.
    #[error("invalid capability descriptor")]
    Capabilities(#[source] ValidationError),
}
