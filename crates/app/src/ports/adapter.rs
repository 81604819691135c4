//! Physical adapter port: the hooks a host uses to drive a device adapter.
//!
//! An adapter bridges a physical (or emulated) device into the shadowing
//! layer. The host calls the lifecycle methods in order:
//!
//! 1. [`on_adapter_start`](PhysicalAdapter::on_adapter_start): spawn the
//!    adapter's background work and return immediately
//! 2. (the host forwards commands via
//!    [`on_incoming_action`](PhysicalAdapter::on_incoming_action))
//! 3. [`on_adapter_stop`](PhysicalAdapter::on_adapter_stop): cancel and join
//!    the background work

use std::future::Future;

use twinbridge_domain::error::LifecycleError;
use twinbridge_domain::event::ActionRequest;

/// A pluggable physical adapter.
pub trait PhysicalAdapter {
    /// Identifier of this adapter instance, used to address bus topics.
    fn id(&self) -> &str;

    /// Launch the adapter's background tasks without waiting for them.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyStarted`] on a second call and
    /// [`LifecycleError::Terminated`] once the adapter has been stopped.
    fn on_adapter_start(&mut self) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Cancel the background tasks and wait until all of them have ended.
    ///
    /// A no-op when the adapter was never started or is already stopped.
    fn on_adapter_stop(&mut self) -> impl Future<Output = ()> + Send;

    /// Handle a command addressed to this adapter.
    ///
    /// Must return quickly and must never fail towards the host: invalid
    /// requests are reported through diagnostics only.
    fn on_incoming_action(&self, request: ActionRequest);
}
