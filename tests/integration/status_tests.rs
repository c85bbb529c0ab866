//! Status LED transitions driven by the control loop.

use roverlink::ControllerConfig;
use roverlink::events::ControllerEvent;
use roverlink::status::VisualState;

use crate::mock_hw::Rig;

#[test]
fn bring_up_reaches_ap_ready() {
    let rig = Rig::new();
    assert_eq!(rig.ctrl.status_state(), VisualState::ApReady);
    assert!(rig.sink.events.contains(&ControllerEvent::StatusChanged {
        from: VisualState::Booting,
        to: VisualState::ApReady,
        at_ms: 0,
    }));
}

#[test]
fn ap_ready_blinks_slowly() {
    let mut rig = Rig::new();
    rig.tick_at(0);
    assert_eq!(rig.hw.led_level(), Some(true));
    rig.tick_at(500);
    assert_eq!(rig.hw.led.len(), 1);
    rig.tick_at(501);
    assert_eq!(rig.hw.led_level(), Some(false));
    rig.tick_at(1002);
    assert_eq!(rig.hw.led_level(), Some(true));
}

#[test]
fn client_request_holds_led_on() {
    let mut rig = Rig::new();
    rig.get("/health");
    assert_eq!(rig.ctrl.status_state(), VisualState::ClientConnected);

    for t in (5..1200).step_by(50) {
        rig.tick_at(t);
    }
    assert!(rig.hw.led.iter().all(|on| *on));
}

#[test]
fn failsafe_preempts_client_and_holds() {
    let mut config = ControllerConfig::default();
    config.motion.failsafe_timeout_ms = 100;
    let mut rig = Rig::with_config(&config);

    rig.get("/drive?y=20");
    assert_eq!(rig.ctrl.status_state(), VisualState::ClientConnected);

    rig.tick_at(101);
    assert_eq!(rig.ctrl.status_state(), VisualState::Failsafe);

    rig.clock.set(150);
    rig.get("/health");
    assert_eq!(rig.ctrl.status_state(), VisualState::Failsafe);
}

#[test]
fn fatal_error_is_latched() {
    let mut rig = Rig::new();
    rig.ctrl.fatal(10, &mut rig.sink);

    rig.clock.set(20);
    rig.get("/health");
    rig.ctrl.ap_ready(30, &mut rig.sink);
    assert_eq!(rig.ctrl.status_state(), VisualState::Error);

    rig.tick_at(100);
    rig.tick_at(151);
    let toggles = rig.hw.led.windows(2).filter(|w| w[0] != w[1]).count();
    assert!(toggles >= 1);
}
