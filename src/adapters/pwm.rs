//! Sysfs PWM fan output.
//!
//! Drives one channel of a `/sys/class/pwm/pwmchip<N>` controller:
//! export the channel, program the period, then translate duty-cycle
//! percentages into nanoseconds on every update.
//!
//! Setup failures are fatal; once running, individual writes are logged
//! and skipped — a transient sysfs hiccup must not bring the daemon down,
//! and the next cycle rewrites the value anyway.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::app::ports::ActuatorPort;
use crate::error::{Error, Result};

const SYSFS_PWM_BASE: &str = "/sys/class/pwm";

#[derive(Debug)]
pub struct PwmFan {
    pwm_dir: PathBuf,
    period_ns: u32,
    current: u8,
}

impl PwmFan {
    /// Export and configure `channel` on `chip`. Fatal on any failure;
    /// nothing is left half-engaged (an exported channel with duty 0 and
    /// enable 0 is the hardware's off state).
    pub fn open(chip: u32, channel: u32, period_ns: u32) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_PWM_BASE), chip, channel, period_ns)
    }

    fn open_at(base: &Path, chip: u32, channel: u32, period_ns: u32) -> Result<Self> {
        let chip_dir = base.join(format!("pwmchip{chip}"));

        let npwm_text = fs::read_to_string(chip_dir.join("npwm")).map_err(Error::PwmSetup)?;
        let available: u32 = npwm_text.trim().parse().unwrap_or(0);
        if channel >= available {
            return Err(Error::BadPwmLine { channel, available });
        }

        let pwm_dir = chip_dir.join(format!("pwm{channel}"));
        if !pwm_dir.exists() {
            fs::write(chip_dir.join("export"), channel.to_string()).map_err(Error::PwmSetup)?;
            // The attribute files appear asynchronously after export; give
            // udev a moment before the first write.
            thread::sleep(Duration::from_millis(100));
        }

        fs::write(pwm_dir.join("period"), period_ns.to_string()).map_err(Error::PwmSetup)?;
        fs::write(pwm_dir.join("duty_cycle"), "0").map_err(Error::PwmSetup)?;
        fs::write(pwm_dir.join("enable"), "1").map_err(Error::PwmSetup)?;

        Ok(Self {
            pwm_dir,
            period_ns,
            current: 0,
        })
    }

    /// Duty cycle (percent) last written to the channel.
    pub fn current_duty(&self) -> u8 {
        self.current
    }

    fn write_attr(&self, name: &str, value: &str) {
        if let Err(e) = fs::write(self.pwm_dir.join(name), value) {
            warn!("pwm: writing {name}={value} failed: {e}");
        }
    }
}

impl ActuatorPort for PwmFan {
    fn apply_duty(&mut self, percent: u8) {
        let percent = percent.min(100);
        let duty_ns = u64::from(self.period_ns) * u64::from(percent) / 100;
        self.write_attr("duty_cycle", &duty_ns.to_string());
        self.current = percent;
        debug!("pwm: dc={percent}% ({duty_ns} ns)");
    }

    fn disengage(&mut self) {
        self.write_attr("duty_cycle", "0");
        self.write_attr("enable", "0");
        self.current = 0;
    }
}
