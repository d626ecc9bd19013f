//! Named-pipe command channel.
//!
//! The operator writes a duty-cycle percentage into a FIFO
//! (`echo 75 > /run/fanctl`). Each message is one open-write-close on the
//! writer side; this end opens the pipe blocking read-only, takes a single
//! read, closes, and reopens — so repeated one-shot writers and a reader
//! that blocks between messages both work.
//!
//! The FIFO is created on first use if absent. Any open or read failure is
//! fatal to the whole daemon: an unreachable override channel can leave the
//! fan stuck in a manually forced state.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use log::debug;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

use crate::error::{Error, Result};

/// Maximum bytes accepted per command message, matching the one-line
/// integer protocol.
const COMMAND_BUF_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct CommandChannel {
    path: PathBuf,
}

impl CommandChannel {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until a writer delivers a message, then parse it.
    ///
    /// Returns `Ok(None)` for content with no leading integer (including
    /// the empty read produced by a writer that opened and closed without
    /// data) — the caller ignores those and re-blocks.
    pub fn read_command(&self) -> Result<Option<i64>> {
        let mut fifo = self.open_or_create()?;
        let mut buf = [0u8; COMMAND_BUF_SIZE];
        let n = fifo.read(&mut buf).map_err(Error::CommandChannel)?;
        Ok(parse_command(&buf[..n]))
    }

    /// Open the FIFO read-only, creating it first when it does not exist.
    /// The open blocks until a writer appears — that is the listener's
    /// designed suspension point.
    ///
    /// A stale non-FIFO at the path is fatal: a regular file would satisfy
    /// every read instantly and spin the listener at real-time priority.
    fn open_or_create(&self) -> Result<File> {
        let fifo = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                mkfifo(&self.path, Mode::from_bits_truncate(0o755))
                    .map_err(|errno| Error::CommandChannel(io::Error::from(errno)))?;
                File::open(&self.path).map_err(Error::CommandChannel)?
            }
            Err(e) => return Err(Error::CommandChannel(e)),
        };
        let meta = fifo.metadata().map_err(Error::CommandChannel)?;
        if !meta.file_type().is_fifo() {
            return Err(Error::CommandChannel(io::Error::other(format!(
                "{} exists but is not a fifo",
                self.path.display()
            ))));
        }
        Ok(fifo)
    }

    /// Wake a listener blocked in [`read_command`](Self::read_command) by
    /// pushing a sentinel newline through the write end. A bare open-close
    /// is not enough: another writer holding the pipe open keeps `read`
    /// blocked until actual data arrives. The byte parses as no command, so
    /// the listener re-checks the shutdown flag and exits. Non-blocking so
    /// a missing reader cannot hang the shutdown path; all failures are
    /// ignored (callers retry until the listener is gone).
    pub fn nudge(&self) {
        if let Ok(mut fifo) = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
        {
            let _ = fifo.write_all(b"\n");
        }
    }

    /// Remove the FIFO from the filesystem at teardown.
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("fifo: removing {} failed: {e}", self.path.display());
        }
    }
}

/// Parse the leading signed decimal integer of a command message.
///
/// Leading ASCII whitespace is skipped, an optional sign accepted, and
/// parsing stops at the first non-digit; trailing bytes are ignored. Zero
/// parsed digits means "invalid input, no change" and yields `None`.
pub fn parse_command(bytes: &[u8]) -> Option<i64> {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let negative = match bytes.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(b) = bytes.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
        digits += 1;
        i += 1;
    }
    if digits == 0 {
        return None;
    }
    Some(if negative { -value } else { value })
}
