//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured control events through
//! the `log` facade (env_logger in the daemon). A future systemd-notify or
//! metrics adapter would implement the same trait.

use log::{debug, info};

use crate::app::events::ControlEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControlEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControlEvent) {
        match event {
            // Per-tick traffic stays at debug so the default filter shows
            // only state transitions and operator actions.
            ControlEvent::DutyApplied { duty, temp_c } => {
                debug!("DUTY  | {duty}% at {temp_c:.1}\u{00b0}C");
            }
            ControlEvent::StateChanged { from, to } => {
                info!("STATE | {from:?} -> {to:?}");
            }
            ControlEvent::Started { state } => {
                info!("START | initial_state={state:?}");
            }
            ControlEvent::ManualEngaged { duty } => {
                info!("MANUAL| engaged at {duty}%");
            }
            ControlEvent::ManualRejected { value } => {
                info!("MANUAL| rejected value {value}, resuming automatic control");
            }
            ControlEvent::AutoResumed => {
                info!("MANUAL| released, automatic control resumed");
            }
        }
    }
}
