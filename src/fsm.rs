//! Fan state machine — pure transition and duty-cycle logic.
//!
//! ```text
//!          temp >= threshold
//!   ┌────────────────────────────┐
//!   ▼                            │
//! RUNNING ──[enters idle band]─▶ IDLE ──[idle dwell >= timeout]─▶ STOPPED
//!   ▲                                                               │
//!   └────────────[temp >= threshold]────────────────────────────────┘
//!
//!  idle band: threshold - hysteresis < temp < threshold
//!  safely cool (temp <= threshold - hysteresis): STOPPED immediately
//! ```
//!
//! The transition function is pure: it takes the latest sample plus the
//! previous state and idle-cycle count and returns the new pair. Holding
//! the shared-state lock while calling it is the caller's job.

use crate::config::ControlConfig;

/// Qualitative fan regime from the last automatic evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    /// Temperature at or above the threshold; fan follows the curve.
    Running,
    /// Temperature inside the hysteresis band; fan holds the floor speed.
    Idle,
    /// Fan off. Sticky once entered: only crossing the threshold restarts it.
    Stopped,
}

/// Evaluate one control cycle.
///
/// Returns the new state and the new consecutive-idle-cycle count. Elapsed
/// idle time is measured as `interval_ms * idle_cycles` against
/// `idle_timeout_ms`, so a fresh Running→Idle transition (count restarts at
/// 1) always dwells at least one full cycle before Stopped is reachable.
pub fn determine_state(
    temp_c: f64,
    last: FanState,
    idle_cycles: u32,
    config: &ControlConfig,
) -> (FanState, u32) {
    if temp_c >= config.threshold_c {
        // Temperature is going high — be running now.
        return (FanState::Running, 0);
    }

    if config.threshold_c - temp_c < config.hysteresis_c {
        // Inside the idle band this cycle.
        match last {
            FanState::Idle
                if u64::from(config.interval_ms) * u64::from(idle_cycles)
                    >= u64::from(config.idle_timeout_ms) =>
            {
                // Idle long enough; let the fan rest.
                (FanState::Stopped, 0)
            }
            FanState::Idle | FanState::Running => (FanState::Idle, idle_cycles + 1),
            // Previously stopped and temperature only rose into the band:
            // stay stopped until it crosses the threshold proper. The idle
            // counter is irrelevant here and deliberately left untouched.
            FanState::Stopped => (FanState::Stopped, idle_cycles),
        }
    } else {
        // Safely cool; stop the fan.
        (FanState::Stopped, 0)
    }
}

/// Duty-cycle curve for the Running state.
///
/// A downward parabola anchored at (`curve_max_c`, 100): with the default
/// constants, `-0.05555 * (t - 80)^2 + 100`, saturating at 100 above
/// `curve_max_c`. May evaluate negative far below the threshold; the
/// state-to-duty mapping clamps.
pub fn fan_curve(temp_c: f64, config: &ControlConfig) -> f64 {
    if temp_c > config.curve_max_c {
        100.0
    } else {
        let d = temp_c - config.curve_max_c;
        -config.curve_k * d * d + 100.0
    }
}

/// Map a state (plus the sample that produced it) to a duty-cycle percent.
///
/// The curve result is truncated toward zero, not rounded, and clamped to
/// `[0, 100]`. Floor clamping to 0 happens later, at the point the value is
/// applied to the actuator.
pub fn duty_for_state(state: FanState, temp_c: f64, config: &ControlConfig) -> u8 {
    match state {
        FanState::Running => fan_curve(temp_c, config).clamp(0.0, 100.0) as u8,
        FanState::Idle => config.dc_low,
        FanState::Stopped => 0,
    }
}
