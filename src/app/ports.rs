//! Port traits — the boundary between the control core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (the thermal sensor, the PWM channel, the log sink)
//! implement these traits. The [`Controller`](super::service::Controller)
//! consumes them via generics, so the core never touches sysfs directly and
//! the whole arbitration logic is testable with mocks.

use crate::app::events::ControlEvent;
use crate::error::Result;

/// Read-side port: the core calls this to obtain the current temperature.
pub trait SensorPort {
    /// Read the zone temperature in degrees Celsius.
    ///
    /// A failed read is fatal to the daemon; implementations must not
    /// retry-and-lie.
    fn read_temp_c(&mut self) -> Result<f64>;
}

/// Write-side port: the core calls this to command the fan.
pub trait ActuatorPort {
    /// Apply a duty cycle in percent. The value arrives already clamped to
    /// `[0, 100]` with the floor rule applied; implementations just forward
    /// it to hardware and are expected not to fail observably.
    fn apply_duty(&mut self, percent: u8);

    /// Stop the fan and release the output for process teardown.
    fn disengage(&mut self);
}

/// The core emits structured [`ControlEvent`]s through this port. Adapters
/// decide where they go (the stderr log in this daemon).
pub trait EventSink {
    fn emit(&mut self, event: &ControlEvent);
}
