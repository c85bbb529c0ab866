//! Drive timeout, decay and recovery.

use std::cell::RefCell;
use std::rc::Rc;

use roverlink::ControllerConfig;
use roverlink::drive::Direction;
use roverlink::events::ControllerEvent;
use roverlink::ports::MotorChannel;
use roverlink::status::VisualState;

use crate::mock_hw::Rig;

/// Drive full forward from t=0 and ramp to 100.
fn at_full_speed() -> Rig {
    let mut rig = Rig::new();
    rig.get("/drive?y=100");
    for i in 1..=20 {
        rig.tick_at(i * 5);
    }
    assert_eq!(rig.ctrl.speed_left(), 100);
    rig
}

#[test]
fn stale_drive_decays_to_brake() {
    let mut rig = at_full_speed();

    rig.tick_at(1200);
    assert!(!rig.ctrl.is_failsafe_stopped());

    rig.tick_at(1201);
    assert!(rig.ctrl.is_failsafe_stopped());
    assert_eq!(rig.ctrl.speed_left(), 70);

    for i in 1..=3 {
        rig.tick_at(1201 + i * 5);
    }
    assert_eq!(rig.ctrl.speed_left(), 0);
    assert_eq!(rig.ctrl.speed_right(), 0);
    assert!(rig.hw.is_braking());
    assert_eq!(rig.ctrl.status_state(), VisualState::Failsafe);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::FailsafeEngaged { .. })),
        1
    );
}

#[test]
fn drive_request_releases_failsafe() {
    let mut rig = at_full_speed();
    rig.tick_at(2000);
    assert!(rig.ctrl.is_failsafe_stopped());

    rig.get("/drive?y=-40");

    assert!(!rig.ctrl.is_failsafe_stopped());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::FailsafeCleared { .. })),
        1
    );
    for i in 1..=20 {
        rig.tick_at(2000 + i * 5);
    }
    assert_eq!(rig.ctrl.speed_left(), -40);
    let out = rig.hw.last_motor(MotorChannel::Left).unwrap();
    assert_eq!(out.direction, Direction::Reverse);
}

#[test]
fn other_routes_do_not_feed_the_failsafe() {
    let mut rig = Rig::new();
    rig.get("/drive?y=10");
    rig.clock.set(1000);
    rig.get("/health");
    rig.tick_at(1201);
    assert!(rig.ctrl.is_failsafe_stopped());
}

#[test]
fn zero_timeout_disables_failsafe() {
    let mut rig = Rig::new();
    rig.ctrl.set_failsafe_timeout(0);
    rig.get("/drive?y=30");
    rig.tick_at(60_000);
    assert!(!rig.ctrl.is_failsafe_stopped());
}

#[test]
fn disabling_timeout_keeps_an_engaged_stop() {
    let mut rig = Rig::new();
    rig.tick_at(1500);
    assert!(rig.ctrl.is_failsafe_stopped());
    rig.ctrl.set_failsafe_timeout(0);
    rig.tick_at(1505);
    assert!(rig.ctrl.is_failsafe_stopped());
}

#[test]
fn ap_ready_restarts_the_timer() {
    let mut rig = Rig::new();
    rig.ctrl.ap_ready(5000, &mut rig.sink);

    rig.tick_at(6200);
    assert!(!rig.ctrl.is_failsafe_stopped());
    rig.tick_at(6201);
    assert!(rig.ctrl.is_failsafe_stopped());
}

#[test]
fn observer_sees_only_changes() {
    let mut rig = Rig::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&calls);
    rig.ctrl
        .register_drive_observer(move |l, r| log.borrow_mut().push((l, r)));

    rig.get("/drive?y=16");
    rig.tick_at(5);
    rig.tick_at(10);
    rig.tick_at(15);

    assert_eq!(*calls.borrow(), vec![(8, 8), (16, 16)]);
}

#[test]
fn motor_write_failure_does_not_stop_the_loop() {
    let mut config = ControllerConfig::default();
    config.motion.min_duty = 60;
    let mut rig = Rig::with_config(&config);
    rig.hw.fail_motors = true;

    rig.get("/drive?y=50");
    rig.tick_at(5);

    assert_eq!(rig.ctrl.speed_left(), 16);
    assert!(rig.hw.motors.is_empty());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::OutputChanged { .. })),
        2
    );
}
