//! Port definitions: traits that adapters implement or consume.
//!
//! Ports are the boundaries between the adapter core and the outside world.
//! They are defined here (in `app`) so that both the host and the adapter
//! crates can depend on them without creating circular dependencies.

pub mod adapter;
pub mod event_bus;

pub use adapter::PhysicalAdapter;
pub use event_bus::EventBusClient;
