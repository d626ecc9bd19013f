//! fanctld — closed-loop fan control daemon.
//!
//! Hexagonal architecture: the pure control logic ([`Controller`]) talks
//! to the machine only through port traits, and the sysfs / FIFO adapters
//! plug into those ports here.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  ThermalSensor     PwmFan          CommandChannel        │
//! │  (SensorPort)      (ActuatorPort)  (FIFO listener)       │
//! │  LogEventSink                                            │
//! │  (EventSink)                                             │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ─────────────────   │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            Controller (pure logic)                 │  │
//! │  │  FSM · fan curve · manual override                 │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  Shutdown latch · sampler loop · listener thread         │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use fanctl::adapters::fifo::CommandChannel;
use fanctl::adapters::log_sink::LogEventSink;
use fanctl::adapters::pwm::PwmFan;
use fanctl::adapters::thermal::ThermalSensor;
use fanctl::app::service::Controller;
use fanctl::config::{ControlConfig, DEFAULT_CONFIG_PATH};
use fanctl::error::{Error, Result};
use fanctl::runtime::{self, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "fanctld", version, about = "Closed-loop PWM fan control daemon")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level instead of the default.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    };
    process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = ControlConfig::load(&config_path)?;
    config.validate()?;

    info!(
        "fanctld v{}: sensor={} fifo={} pwmchip{}/pwm{} interval={}ms",
        env!("CARGO_PKG_VERSION"),
        config.temp_path.display(),
        config.fifo_path.display(),
        config.pwm_chip,
        config.pwm_channel,
        config.interval_ms,
    );

    runtime::set_realtime_priority();

    let sensor = ThermalSensor::open(&config.temp_path)?;
    let fan = PwmFan::open(config.pwm_chip, config.pwm_channel, config.pwm_period_ns)?;
    let channel = CommandChannel::new(config.fifo_path.clone());

    let interval = Duration::from_millis(u64::from(config.interval_ms));
    let shutdown = Arc::new(Shutdown::new());
    let controller = Arc::new(Mutex::new(Controller::new(
        config,
        sensor,
        fan,
        LogEventSink::new(),
    )));
    runtime::lock(&controller).start();

    {
        let shutdown = Arc::clone(&shutdown);
        let channel = channel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.request(None);
            channel.nudge();
        }) {
            warn!("signal handler not installed, stop with a FIFO error or kill -9: {e}");
        }
    }

    let listener = std::thread::Builder::new()
        .name("fifo-listener".into())
        .spawn({
            let controller = Arc::clone(&controller);
            let shutdown = Arc::clone(&shutdown);
            let channel = channel.clone();
            move || runtime::run_listener(controller, shutdown, channel)
        })
        .map_err(Error::ListenerSpawn)?;

    // The sampler owns the main thread until something requests shutdown.
    runtime::run_sampler(&controller, &shutdown, interval);

    // Teardown: release the listener, park the fan, remove the FIFO. The
    // nudge is retried because it can land in the gap between the
    // listener's flag check and its blocking re-open, where the pipe has
    // no reader yet and the non-blocking write end cannot be opened.
    shutdown.request(None);
    while !listener.is_finished() {
        channel.nudge();
        std::thread::sleep(Duration::from_millis(10));
    }
    if listener.join().is_err() {
        warn!("fifo listener panicked during shutdown");
    }
    runtime::lock(&controller).disengage();
    channel.remove();
    info!("fanctld stopped");

    Ok(shutdown.exit_code())
}
