//! Hardware-agnostic control core.
//!
//! `ports` defines the boundary traits, `events` the structured events the
//! core emits, and `service` the [`Controller`](service::Controller) that
//! arbitrates between the automatic sampler and manual overrides.

pub mod events;
pub mod ports;
pub mod service;
