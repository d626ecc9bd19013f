//! Concurrency tests for the sampler loop and the shutdown latch.
//!
//! The daemon runs the sampler and the FIFO listener on separate threads
//! over one `Mutex<Controller>`; these tests interleave the two paths and
//! check that the shared-state unit stays coherent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::mock_hw::{ActuatorCall, MockFan, MockSensor, RecordingSink};

use fanctl::app::service::Controller;
use fanctl::config::ControlConfig;
use fanctl::error::Error;
use fanctl::runtime::{self, Shutdown};

#[test]
fn manual_commands_interleave_safely_with_a_live_sampler() {
    let (sensor, sensor_h) = MockSensor::new(85.0);
    let (fan, fan_h) = MockFan::new();
    let (sink, _sink_h) = RecordingSink::new();

    let controller = Arc::new(Mutex::new(Controller::new(
        ControlConfig::default(),
        sensor,
        fan,
        sink,
    )));
    runtime::lock(&controller).start();

    let shutdown = Arc::new(Shutdown::new());
    let sampler = std::thread::spawn({
        let controller = Arc::clone(&controller);
        let shutdown = Arc::clone(&shutdown);
        move || runtime::run_sampler(&controller, &shutdown, Duration::from_millis(1))
    });

    // Play the listener role: engage, poke, and release the override while
    // the sampler hammers the lock, with temperature swings in between.
    for round in 0u8..50 {
        sensor_h.set_temp_c(if round % 2 == 0 { 85.0 } else { 46.0 });
        runtime::lock(&controller).apply_manual(60).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        runtime::lock(&controller).apply_manual(0).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }

    shutdown.request(None);
    sampler.join().unwrap();
    assert_eq!(shutdown.exit_code(), 0);

    // Every duty that reached the actuator respects the clamp: 0, the idle
    // floor or above, never 1..dc_low and never above 100.
    let dc_low = ControlConfig::default().dc_low;
    for call in fan_h.calls() {
        if let ActuatorCall::Apply(duty) = call {
            assert!(duty == 0 || (dc_low..=100).contains(&duty), "duty {duty} escaped the clamp");
        }
    }

    // The unit is coherent after the dust settles: automatic mode, and the
    // stored duty matches the last released value.
    let c = runtime::lock(&controller);
    assert!(!c.is_manual());
    assert!(c.duty() <= 100);
}

#[test]
fn sampler_latches_the_first_sensor_failure_and_exits() {
    let (sensor, sensor_h) = MockSensor::new(60.0);
    let (fan, _fan_h) = MockFan::new();
    let (sink, _sink_h) = RecordingSink::new();

    let controller = Arc::new(Mutex::new(Controller::new(
        ControlConfig::default(),
        sensor,
        fan,
        sink,
    )));
    runtime::lock(&controller).start();

    let shutdown = Arc::new(Shutdown::new());
    sensor_h.fail_next_reads(true);

    let sampler = std::thread::spawn({
        let controller = Arc::clone(&controller);
        let shutdown = Arc::clone(&shutdown);
        move || runtime::run_sampler(&controller, &shutdown, Duration::from_millis(1))
    });
    sampler.join().unwrap();

    assert!(shutdown.is_requested());
    assert_eq!(shutdown.exit_code(), 3);

    // A later cause must not overwrite the first one.
    shutdown.request(Some(Error::CommandChannel(std::io::Error::other("late"))));
    assert_eq!(shutdown.exit_code(), 3);
}

#[test]
fn manual_mode_survives_sampler_ticks_under_contention() {
    let (sensor, sensor_h) = MockSensor::new(46.0);
    let (fan, fan_h) = MockFan::new();
    let (sink, _sink_h) = RecordingSink::new();

    let controller = Arc::new(Mutex::new(Controller::new(
        ControlConfig::default(),
        sensor,
        fan,
        sink,
    )));
    runtime::lock(&controller).start();

    let shutdown = Arc::new(Shutdown::new());
    runtime::lock(&controller).apply_manual(80).unwrap();
    fan_h.clear();

    let sampler = std::thread::spawn({
        let controller = Arc::clone(&controller);
        let shutdown = Arc::clone(&shutdown);
        move || runtime::run_sampler(&controller, &shutdown, Duration::from_millis(1))
    });

    sensor_h.set_temp_c(95.0);
    std::thread::sleep(Duration::from_millis(50));
    shutdown.request(None);
    sampler.join().unwrap();

    assert!(fan_h.calls().is_empty(), "sampler actuated during an override");
    let c = runtime::lock(&controller);
    assert!(c.is_manual());
    assert_eq!(c.duty(), 80);
}
