//! fanctl control library.
//!
//! Exposes the pure-logic modules (state machine, fan curve, controller)
//! for integration testing and external inspection. Everything that
//! touches sysfs, the FIFO or the scheduler lives under [`adapters`] and
//! [`runtime`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod fsm;
pub mod runtime;

pub mod adapters;
pub mod error;
