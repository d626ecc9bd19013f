//! The override arbiter.
//!
//! [`Controller`] owns the entire shared-state unit — operating state,
//! last temperature, idle-cycle count, manual flag, duty cycle — together
//! with the sensor, actuator, and event-sink ports. The daemon wraps one
//! `Controller` in a single `Mutex`; every read or write of the unit goes
//! through `&mut self` behind that lock, so no caller can ever observe a
//! partially updated combination.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        Controller         │
//! ActuatorPort ◀──│ fsm · floor clamp · arbiter│
//!                 └──────────────────────────┘
//! ```
//!
//! Exactly one of {automatic evaluation, manual command} determines the
//! duty cycle at any instant, selected by the manual flag.

use log::debug;

use crate::config::ControlConfig;
use crate::error::Result;
use crate::fsm::{self, FanState};

use super::events::ControlEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort};

/// Arbitrates between the periodic automatic sampler and asynchronous
/// manual overrides.
pub struct Controller<S, A, E> {
    sensor: S,
    actuator: A,
    sink: E,
    config: ControlConfig,

    // The shared-state unit (see module docs).
    state: FanState,
    temp_c: f64,
    idle_cycles: u32,
    manual: bool,
    duty: u8,
}

impl<S, A, E> Controller<S, A, E>
where
    S: SensorPort,
    A: ActuatorPort,
    E: EventSink,
{
    pub fn new(config: ControlConfig, sensor: S, actuator: A, sink: E) -> Self {
        Self {
            sensor,
            actuator,
            sink,
            config,
            state: FanState::Running,
            temp_c: 0.0,
            idle_cycles: 0,
            manual: false,
            duty: 0,
        }
    }

    /// Announce the initial state. Call once before the first tick.
    pub fn start(&mut self) {
        self.sink.emit(&ControlEvent::Started { state: self.state });
    }

    // ── Periodic path ─────────────────────────────────────────

    /// One sampler cycle: pull a temperature sample and run the automatic
    /// evaluation. Suppressed entirely while a manual override is active —
    /// the sensor is not even read, matching the listener's exclusive
    /// ownership of the duty cycle in that mode.
    pub fn tick(&mut self) -> Result<()> {
        if self.manual {
            return Ok(());
        }
        let temp_c = self.sensor.read_temp_c()?;
        self.apply_auto(temp_c);
        Ok(())
    }

    /// Run the state machine on `temp_c` and actuate the derived duty.
    /// No-op while manually overridden.
    pub fn apply_auto(&mut self, temp_c: f64) {
        if self.manual {
            return;
        }
        self.temp_c = temp_c;

        let prev = self.state;
        let (next, cycles) = fsm::determine_state(temp_c, prev, self.idle_cycles, &self.config);
        self.state = next;
        self.idle_cycles = cycles;

        if next != prev {
            self.sink.emit(&ControlEvent::StateChanged {
                from: prev,
                to: next,
            });
        }

        let duty = fsm::duty_for_state(next, temp_c, &self.config);
        debug!(
            "auto: temp={:.3}C state={:?} idle_cycles={} dc={}%",
            temp_c, next, cycles, duty
        );
        self.apply(duty);
    }

    // ── Manual path ───────────────────────────────────────────

    /// Apply an operator command.
    ///
    /// A non-zero value within `[dc_low, 100]` engages manual mode and
    /// drives that duty directly; the operating state is reset to Running
    /// and the idle counter cleared so a later return to automatic starts
    /// from a clean slate. Anything else releases the override and
    /// re-evaluates automatically from a fresh sample — which can fail, and
    /// that failure is fatal like any other sensor read.
    pub fn apply_manual(&mut self, value: i64) -> Result<()> {
        let in_range = value != 0 && value >= i64::from(self.config.dc_low) && value <= 100;
        if in_range {
            self.manual = true;
            self.state = FanState::Running;
            self.idle_cycles = 0;
            self.sink
                .emit(&ControlEvent::ManualEngaged { duty: value as u8 });
            self.apply(value as u8);
            Ok(())
        } else {
            self.sink.emit(&ControlEvent::ManualRejected { value });
            self.release_manual()
        }
    }

    /// Return control to the automatic path immediately, without waiting
    /// for the next sampler tick.
    pub fn release_manual(&mut self) -> Result<()> {
        self.manual = false;
        self.sink.emit(&ControlEvent::AutoResumed);
        let temp_c = self.sensor.read_temp_c()?;
        self.apply_auto(temp_c);
        Ok(())
    }

    // ── Teardown ──────────────────────────────────────────────

    /// Stop the fan and release the actuator. Part of the single shutdown
    /// path; safe to call regardless of mode.
    pub fn disengage(&mut self) {
        self.duty = 0;
        self.actuator.disengage();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> FanState {
        self.state
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn temp_c(&self) -> f64 {
        self.temp_c
    }

    pub fn idle_cycles(&self) -> u32 {
        self.idle_cycles
    }

    // ── Internal ──────────────────────────────────────────────

    /// Store and actuate a duty cycle. Values above 100 are capped; a
    /// non-zero value below the floor would stall the motor, so it is sent
    /// to the hardware as 0 (while the requested value is kept as the
    /// logical duty).
    fn apply(&mut self, duty: u8) {
        self.duty = duty.min(100);
        let out = if self.duty < self.config.dc_low {
            0
        } else {
            self.duty
        };
        self.actuator.apply_duty(out);
        self.sink.emit(&ControlEvent::DutyApplied {
            duty: out,
            temp_c: self.temp_c,
        });
    }
}
