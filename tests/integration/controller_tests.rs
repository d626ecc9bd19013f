//! Integration tests for the sampler → state machine → actuator pipeline.
//!
//! These drive a full [`Controller`] through mock ports and verify the
//! end-to-end behavior an operator would observe: idle countdown, stop,
//! recovery, manual override and its release.

use crate::mock_hw::{ActuatorCall, MockFan, MockSensor, RecordingSink};

use fanctl::app::service::Controller;
use fanctl::config::ControlConfig;
use fanctl::fsm::FanState;

fn make(
    temp_c: f64,
    config: ControlConfig,
) -> (
    Controller<MockSensor, MockFan, crate::mock_hw::RecordingSink>,
    crate::mock_hw::SensorHandle,
    crate::mock_hw::FanHandle,
    crate::mock_hw::SinkHandle,
) {
    let (sensor, sensor_h) = MockSensor::new(temp_c);
    let (fan, fan_h) = MockFan::new();
    let (sink, sink_h) = RecordingSink::new();
    let mut controller = Controller::new(config, sensor, fan, sink);
    controller.start();
    (controller, sensor_h, fan_h, sink_h)
}

// ── Idle countdown and stop ───────────────────────────────────

#[test]
fn in_band_temperature_idles_then_stops_after_the_timeout() {
    // 46.0C is inside the hysteresis band below the 50.0C threshold.
    // With interval=3000ms and idle_timeout=60000ms the fan holds the
    // idle floor for 20 cycles and parks on the 21st.
    let (mut c, _sensor, fan, sink) = make(46.0, ControlConfig::default());

    for _ in 0..20 {
        c.tick().unwrap();
        assert_eq!(c.state(), FanState::Idle);
    }
    assert_eq!(
        fan.calls(),
        vec![ActuatorCall::Apply(50); 20],
        "idle cycles hold dc_low"
    );

    c.tick().unwrap();
    assert_eq!(c.state(), FanState::Stopped);
    assert_eq!(fan.last_duty(), Some(0));
    assert_eq!(c.idle_cycles(), 0, "counter clears on the stop transition");

    assert!(sink.contains("StateChanged { from: Running, to: Idle }"));
    assert!(sink.contains("StateChanged { from: Idle, to: Stopped }"));
}

#[test]
fn stopped_is_sticky_within_the_band() {
    let (mut c, _sensor, fan, _sink) = make(46.0, ControlConfig::default());
    for _ in 0..21 {
        c.tick().unwrap();
    }
    assert_eq!(c.state(), FanState::Stopped);

    // Still in the band; the fan must not twitch back on.
    fan.clear();
    for _ in 0..10 {
        c.tick().unwrap();
        assert_eq!(c.state(), FanState::Stopped);
    }
    assert_eq!(fan.calls(), vec![ActuatorCall::Apply(0); 10]);
}

#[test]
fn heating_past_the_threshold_restarts_a_stopped_fan() {
    let (mut c, sensor, fan, _sink) = make(46.0, ControlConfig::default());
    for _ in 0..21 {
        c.tick().unwrap();
    }
    assert_eq!(c.state(), FanState::Stopped);

    sensor.set_temp_c(85.0);
    c.tick().unwrap();
    assert_eq!(c.state(), FanState::Running);
    assert_eq!(fan.last_duty(), Some(100), "curve saturates above 80C");
}

#[test]
fn cooling_below_the_band_stops_without_idling() {
    let (mut c, sensor, fan, _sink) = make(70.0, ControlConfig::default());
    c.tick().unwrap();
    assert_eq!(c.state(), FanState::Running);

    sensor.set_temp_c(30.0);
    c.tick().unwrap();
    assert_eq!(c.state(), FanState::Stopped);
    assert_eq!(fan.last_duty(), Some(0));
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn manual_override_holds_the_duty_across_ticks() {
    let (mut c, sensor, fan, sink) = make(85.0, ControlConfig::default());
    c.tick().unwrap();
    assert_eq!(fan.last_duty(), Some(100));

    c.apply_manual(60).unwrap();
    assert!(c.is_manual());
    assert_eq!(fan.last_duty(), Some(60));

    // Temperature swings are ignored while the override is engaged.
    fan.clear();
    for temp in [20.0, 95.0, 46.0] {
        sensor.set_temp_c(temp);
        c.tick().unwrap();
    }
    assert!(fan.calls().is_empty(), "ticks must not actuate while manual");
    assert_eq!(c.duty(), 60);
    assert!(sink.contains("ManualEngaged { duty: 60 }"));
}

#[test]
fn out_of_range_command_resumes_automatic_control() {
    let (mut c, sensor, fan, sink) = make(85.0, ControlConfig::default());
    c.apply_manual(60).unwrap();

    sensor.set_temp_c(70.0);
    c.apply_manual(101).unwrap();

    assert!(!c.is_manual());
    assert_eq!(fan.last_duty(), Some(94), "fresh sample at 70C drives the curve");
    assert!(sink.contains("ManualRejected { value: 101 }"));
    assert!(sink.contains("AutoResumed"));
}

#[test]
fn zero_command_releases_the_override() {
    let (mut c, sensor, _fan, _sink) = make(85.0, ControlConfig::default());
    c.apply_manual(75).unwrap();

    sensor.set_temp_c(30.0);
    c.apply_manual(0).unwrap();
    assert!(!c.is_manual());
    assert_eq!(c.state(), FanState::Stopped);
}

// ── Floor clamp ───────────────────────────────────────────────

#[test]
fn duties_below_the_floor_reach_the_hardware_as_zero() {
    let config = ControlConfig {
        dc_low: 60,
        ..ControlConfig::default()
    };
    // The curve yields 56% at 52C, below the raised floor.
    let (mut c, _sensor, fan, _sink) = make(52.0, config);
    c.tick().unwrap();
    assert_eq!(c.state(), FanState::Running);
    assert_eq!(c.duty(), 56);
    assert_eq!(fan.calls(), vec![ActuatorCall::Apply(0)]);
}

// ── Failure propagation ───────────────────────────────────────

#[test]
fn sensor_failure_surfaces_with_the_read_exit_code() {
    let (mut c, sensor, _fan, _sink) = make(50.0, ControlConfig::default());
    c.tick().unwrap();

    sensor.fail_next_reads(true);
    let err = c.tick().unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn disengage_parks_the_fan() {
    let (mut c, _sensor, fan, _sink) = make(85.0, ControlConfig::default());
    c.tick().unwrap();
    c.disengage();
    assert_eq!(fan.calls().last(), Some(&ActuatorCall::Disengage));
    assert_eq!(c.duty(), 0);
}
