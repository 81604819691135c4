//! # twinbridge-domain
//!
//! Pure domain model for the twinbridge physical adapter.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Values** (typed payloads carried by properties, events, actions)
//! - Define **Capability Descriptors** (properties, events, actions and
//!   relationships a device announces to the shadowing layer)
//! - Define **Relationships** (named relations and their concrete instances)
//! - Define **Events** (outbound notifications and inbound action requests)
//! - Contain all invariant enforcement (unique keys, typed bodies)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod capability;
pub mod event;
pub mod relationship;
pub mod value;
