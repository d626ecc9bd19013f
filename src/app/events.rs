//! Outbound control events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::fsm::FanState;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// The controller has started (carries the initial state).
    Started { state: FanState },

    /// The automatic evaluation moved between states.
    StateChanged { from: FanState, to: FanState },

    /// A duty cycle was written to the actuator. `duty` is the value after
    /// floor clamping, i.e. what the hardware actually received.
    DutyApplied { duty: u8, temp_c: f64 },

    /// A valid manual override took effect.
    ManualEngaged { duty: u8 },

    /// A manual command was out of range or zero; control falls back to
    /// automatic mode.
    ManualRejected { value: i64 },

    /// Automatic control resumed after an override ended.
    AutoResumed,
}
