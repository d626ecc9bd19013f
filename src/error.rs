//! Unified error types for the fan-control daemon.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform. Every fatal variant
//! carries a distinct process exit code so a supervising init system can
//! tell the failure modes apart.

use std::fmt;
use std::io;

/// Every fatal condition in the daemon funnels into this type.
///
/// Recoverable conditions (a malformed or out-of-range manual command)
/// are handled locally by the control core and never become an `Error`.
#[derive(Debug)]
pub enum Error {
    /// The thermal-zone sensor file could not be opened at startup.
    SensorOpen(io::Error),
    /// Reading the thermal-zone sensor failed during operation.
    SensorRead(io::Error),
    /// Configuring the sysfs PWM channel failed (export, period, enable).
    PwmSetup(io::Error),
    /// The selected PWM channel does not exist on the chip.
    BadPwmLine { channel: u32, available: u32 },
    /// The listener thread could not be spawned.
    ListenerSpawn(io::Error),
    /// The command FIFO could not be created, opened, or read.
    CommandChannel(io::Error),
    /// Configuration is invalid or could not be loaded.
    Config(String),
}

impl Error {
    /// Process exit code for this failure mode. Code 0 is reserved for a
    /// clean signal-driven shutdown.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SensorOpen(_) => 1,
            Self::PwmSetup(_) => 2,
            Self::SensorRead(_) => 3,
            Self::CommandChannel(_) => 4,
            Self::ListenerSpawn(_) => 5,
            Self::BadPwmLine { .. } => 6,
            Self::Config(_) => 7,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorOpen(e) => write!(f, "failed to open temperature sensor: {e}"),
            Self::SensorRead(e) => write!(f, "failed to read temperature sensor: {e}"),
            Self::PwmSetup(e) => write!(f, "failed to set up PWM channel: {e}"),
            Self::BadPwmLine { channel, available } => write!(
                f,
                "PWM channel {channel} out of range (chip exposes {available})"
            ),
            Self::ListenerSpawn(e) => write!(f, "failed to start listener thread: {e}"),
            Self::CommandChannel(e) => write!(f, "command channel failure: {e}"),
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SensorOpen(e)
            | Self::SensorRead(e)
            | Self::PwmSetup(e)
            | Self::ListenerSpawn(e)
            | Self::CommandChannel(e) => Some(e),
            Self::BadPwmLine { .. } | Self::Config(_) => None,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
