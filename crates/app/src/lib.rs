//! # twinbridge-app
//!
//! Application layer: **port definitions** (traits) and in-process
//! infrastructure shared by physical adapters.
//!
//! ## Responsibilities
//! - Define **port traits**:
//!   - `EventBusClient`: outbound publication towards the shadowing layer
//!   - `PhysicalAdapter`: lifecycle hooks and inbound actions driven by the host
//! - Provide an **in-process event bus** (topic-addressed, tokio broadcast)
//! - Provide **lifecycle supervision**: the `Created → Started → Stopped`
//!   state machine and the task set joined on stop
//!
//! ## Dependency rule
//! Depends on `twinbridge-domain` only (plus `tokio` for channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod lifecycle;
pub mod ports;
