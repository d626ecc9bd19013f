//! Daemon configuration.
//!
//! All tunable parameters for the control loop, loaded once at startup
//! from a TOML file and immutable thereafter. A missing file is not an
//! error — the compiled defaults match a Raspberry Pi 4 with the CPU fan
//! on hardware PWM channel 0.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default location for the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fanctl.toml";

/// Core control-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    // --- Timing ---
    /// Sampling interval in milliseconds.
    pub interval_ms: u32,
    /// Idle dwell time before the fan is allowed to stop, in milliseconds.
    pub idle_timeout_ms: u32,

    // --- Thermal policy ---
    /// Temperature above which the fan runs, in degrees Celsius.
    pub threshold_c: f64,
    /// Band width below the threshold in which the fan idles at the floor
    /// speed instead of switching off.
    pub hysteresis_c: f64,

    // --- Duty cycle ---
    /// Lowest duty cycle (percent) that reliably keeps the fan motor
    /// turning. Computed values below this are clamped to 0.
    pub dc_low: u8,
    /// Temperature at and above which the fan curve saturates at 100%.
    pub curve_max_c: f64,
    /// Steepness constant of the parabolic fan curve.
    pub curve_k: f64,

    // --- Hardware ---
    /// Sysfs node containing the zone temperature in millidegrees.
    pub temp_path: PathBuf,
    /// Named pipe through which manual duty-cycle commands arrive.
    pub fifo_path: PathBuf,
    /// Index of the sysfs PWM chip (`/sys/class/pwm/pwmchip<N>`).
    pub pwm_chip: u32,
    /// PWM channel on that chip.
    pub pwm_channel: u32,
    /// PWM period in nanoseconds (40_000 ns = 25 kHz, the Intel/Noctua
    /// 4-pin fan specification).
    pub pwm_period_ns: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            idle_timeout_ms: 60_000,

            threshold_c: 50.0,
            hysteresis_c: 5.0,

            dc_low: 50,
            curve_max_c: 80.0,
            curve_k: 0.05555,

            temp_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            fifo_path: PathBuf::from("/run/fanctl"),
            pwm_chip: 0,
            pwm_channel: 0,
            pwm_period_ns: 40_000,
        }
    }
}

impl ControlConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. Parse failures are fatal — running with half a
    /// config silently is worse than refusing to start.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Range-check every field before the daemon touches hardware.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::Config("interval_ms must be non-zero".into()));
        }
        if self.dc_low > 100 {
            return Err(Error::Config("dc_low must be within 0..=100".into()));
        }
        if self.hysteresis_c < 0.0 {
            return Err(Error::Config("hysteresis_c must be non-negative".into()));
        }
        if !(-50.0..=150.0).contains(&self.threshold_c) {
            return Err(Error::Config(
                "threshold_c outside plausible range (-50..=150)".into(),
            ));
        }
        if self.curve_k <= 0.0 {
            return Err(Error::Config("curve_k must be positive".into()));
        }
        if self.curve_max_c < self.threshold_c {
            return Err(Error::Config(
                "curve_max_c must not be below threshold_c".into(),
            ));
        }
        if self.pwm_period_ns == 0 {
            return Err(Error::Config("pwm_period_ns must be non-zero".into()));
        }
        Ok(())
    }
}
