//! Sysfs thermal-zone temperature sensor.
//!
//! The kernel exposes the zone temperature as millidegrees-Celsius text
//! (e.g. `53125\n`). The file is opened once at startup and rewound before
//! every read, so a zone that disappears mid-flight surfaces as a read
//! error rather than a silent re-open of something else.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::app::ports::SensorPort;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ThermalSensor {
    file: File,
    path: PathBuf,
    buf: String,
}

impl ThermalSensor {
    /// Open the sensor node. Failure here is a fatal setup error.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(Error::SensorOpen)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            buf: String::with_capacity(32),
        })
    }

    /// The node this sensor reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SensorPort for ThermalSensor {
    fn read_temp_c(&mut self) -> Result<f64> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(Error::SensorRead)?;
        self.buf.clear();
        self.file
            .read_to_string(&mut self.buf)
            .map_err(Error::SensorRead)?;
        Ok(parse_millidegrees(&self.buf) as f64 / 1000.0)
    }
}

/// `atoi`-style leading-integer parse: skip leading whitespace, accept an
/// optional sign, consume digits, ignore the rest. Unparsable content reads
/// as 0 — the zone file format is kernel-guaranteed, and 0 millidegrees
/// drives the fan to its safe Stopped mapping.
fn parse_millidegrees(text: &str) -> i64 {
    let rest = text.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let digits = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    if negative { -digits } else { digits }
}
