//! Daemon runtime plumbing.
//!
//! Hosts the two long-running loops (periodic sampler, FIFO listener), the
//! shared shutdown latch they cooperate through, and the best-effort
//! real-time scheduling setup. The control policy itself lives in
//! [`crate::app::service::Controller`]; this module only decides *when*
//! the controller runs and how the process winds down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, warn};

use crate::adapters::fifo::CommandChannel;
use crate::app::ports::{ActuatorPort, EventSink, SensorPort};
use crate::app::service::Controller;
use crate::error::Error;

/// Shutdown granularity: the sampler sleeps in slices of this length so a
/// signal or fatal error stops the daemon promptly even with long sample
/// intervals.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Process-wide shutdown latch shared by the sampler, the listener and the
/// signal handler.
///
/// The first caller to record a fatal cause wins; later causes are logged
/// and dropped. A shutdown without a cause (signal) exits with code 0.
pub struct Shutdown {
    requested: AtomicBool,
    cause: Mutex<Option<Error>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            cause: Mutex::new(None),
        }
    }

    pub fn request(&self, cause: Option<Error>) {
        if let Some(e) = cause {
            let mut slot = lock(&self.cause);
            match &*slot {
                None => {
                    error!("shutting down: {e}");
                    *slot = Some(e);
                }
                Some(first) => debug!("further error during shutdown ({first} came first): {e}"),
            }
        }
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Exit code for the process: the first fatal cause's code, or 0 for a
    /// clean signal-initiated shutdown.
    pub fn exit_code(&self) -> i32 {
        lock(&self.cause).as_ref().map_or(0, Error::exit_code)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Acquire a mutex, recovering the guard if a panicking thread poisoned it.
/// Both control loops touch only plain-old-data under the lock, so the
/// state is never left half-written.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drive the controller on a fixed cadence until shutdown is requested.
///
/// Runs on the calling thread. Each failed tick (a sensor read error) is
/// fatal and latches the shutdown cause.
pub fn run_sampler<S, A, E>(
    controller: &Mutex<Controller<S, A, E>>,
    shutdown: &Shutdown,
    interval: Duration,
) where
    S: SensorPort,
    A: ActuatorPort,
    E: EventSink,
{
    while !shutdown.is_requested() {
        if let Err(e) = lock(controller).tick() {
            shutdown.request(Some(e));
            break;
        }
        sleep_interruptible(interval, shutdown);
        // On a real-time policy a tiny interval could starve other tasks.
        std::thread::yield_now();
    }
}

/// Sleep for `total`, waking early when shutdown is requested.
fn sleep_interruptible(total: Duration, shutdown: &Shutdown) {
    let mut remaining = total;
    while !remaining.is_zero() && !shutdown.is_requested() {
        let slice = remaining.min(SLEEP_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}

/// Block on the FIFO and feed operator commands to the controller until
/// shutdown is requested.
///
/// Runs on its own thread. Channel errors are fatal; unparseable messages
/// are ignored and the loop re-blocks. The shutdown path unblocks the
/// pending FIFO open via [`CommandChannel::nudge`].
pub fn run_listener<S, A, E>(
    controller: Arc<Mutex<Controller<S, A, E>>>,
    shutdown: Arc<Shutdown>,
    channel: CommandChannel,
) where
    S: SensorPort,
    A: ActuatorPort,
    E: EventSink,
{
    while !shutdown.is_requested() {
        let command = match channel.read_command() {
            Ok(Some(v)) => v,
            Ok(None) => {
                debug!("fifo: message with no integer, ignored");
                continue;
            }
            Err(e) => {
                shutdown.request(Some(e));
                break;
            }
        };
        if shutdown.is_requested() {
            break;
        }
        if let Err(e) = lock(&controller).apply_manual(command) {
            shutdown.request(Some(e));
            break;
        }
    }
}

/// Move the process onto `SCHED_RR` so sampling stays on cadence under
/// load. Best effort: without `CAP_SYS_NICE` this fails and the daemon
/// keeps running on the default policy.
pub fn set_realtime_priority() {
    // Already on a real-time policy (e.g. set by the service manager).
    let current = unsafe { libc::sched_getscheduler(0) };
    if current == libc::SCHED_FIFO || current == libc::SCHED_RR {
        return;
    }
    let param = libc::sched_param { sched_priority: 1 };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_RR, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        warn!("could not switch to SCHED_RR, staying on the default policy: {err}");
    }
}
