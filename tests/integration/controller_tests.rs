//! Request handling through the full control loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use roverlink::error::ProtocolError;
use roverlink::events::{ControllerEvent, DropReason};
use roverlink::net::memory::MemoryConnection;
use roverlink::ports::Clock;
use roverlink::ControllerConfig;
use roverlink::router::Route;
use roverlink::status::VisualState;

use crate::mock_hw::{Rig, TrickleConnection};

fn message_log(rig: &mut Rig) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    rig.ctrl
        .register_message_callback(move |m| sink.borrow_mut().push(m.to_owned()));
    log
}

fn content_length(response: &str) -> Option<usize> {
    response
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .and_then(|v| v.trim().parse().ok())
}

// ── Routes ────────────────────────────────────────────────────

#[test]
fn button_press_reports_label() {
    let mut rig = Rig::new();
    let log = message_log(&mut rig);
    assert!(rig.ctrl.register_button("A", || {}));

    let conn = rig.get("/btn?id=0");

    assert_eq!(Rig::body(&conn), "OK");
    assert_eq!(*log.borrow(), vec!["btn:A".to_owned()]);
    assert!(conn.is_closed());
}

#[test]
fn slider_value_is_clamped_to_range() {
    let mut rig = Rig::new();
    let log = message_log(&mut rig);
    assert!(rig.ctrl.register_slider("Pan", |_| {}, 0, 180, 90, 1));

    let conn = rig.get("/sld?id=0&v=999");

    assert_eq!(Rig::body(&conn), "OK");
    assert_eq!(rig.ctrl.slider_value(0), Some(180));
    assert_eq!(*log.borrow(), vec!["sld:Pan=180".to_owned()]);
}

#[test]
fn drive_request_ramps_to_mixed_target() {
    let mut rig = Rig::new();
    rig.get("/drive?x=50&y=50&t=50");

    for i in 1..=10 {
        rig.tick_at(i * 5);
    }

    assert_eq!(rig.ctrl.speed_left(), 50);
    assert_eq!(rig.ctrl.speed_right(), 0);
}

#[test]
fn unknown_path_is_404_and_not_a_client() {
    let mut rig = Rig::new();
    let conn = rig.get("/foo");

    assert!(conn.written_str().starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(Rig::body(&conn), "Not Found");
    assert_eq!(rig.ctrl.status_state(), VisualState::ApReady);
}

#[test]
fn bad_button_id_is_200_with_text() {
    let mut rig = Rig::new();
    let log = message_log(&mut rig);
    let presses: [Rc<Cell<u32>>; 2] = Default::default();
    for (name, count) in ["A", "B"].into_iter().zip(&presses) {
        let count = Rc::clone(count);
        rig.ctrl.register_button(name, move || count.set(count.get() + 1));
    }

    for target in ["/btn?id=99", "/btn?id=-1", "/btn?id=2"] {
        let conn = rig.get(target);
        assert!(conn.written_str().starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(Rig::body(&conn), "Bad id", "{target}");
    }

    assert_eq!(presses[0].get(), 0);
    assert_eq!(presses[1].get(), 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn rejected_slider_requests_do_not_fire_callbacks() {
    let mut rig = Rig::new();
    let log = message_log(&mut rig);
    let calls = Rc::new(Cell::new(0u32));
    let count = Rc::clone(&calls);
    rig.ctrl
        .register_slider("Pan", move |_| count.set(count.get() + 1), 0, 180, 90, 1);

    for (target, body) in [
        ("/sld?id=5&v=3", "Bad id"),
        ("/sld?id=-1&v=3", "Bad id"),
        ("/sld?id=0", "Missing v"),
        ("/sld?v=3", "Missing id"),
    ] {
        let conn = rig.get(target);
        assert_eq!(Rig::body(&conn), body, "{target}");
    }

    assert_eq!(calls.get(), 0);
    assert!(log.borrow().is_empty());
    assert_eq!(rig.ctrl.slider_value(0), Some(90));
}

#[test]
fn content_length_matches_body_bytes() {
    let mut rig = Rig::new();
    rig.ctrl.register_button("Horn", || {});
    rig.ctrl.register_slider("Camera pan", |_| {}, 0, 180, 90, 1);

    for target in ["/", "/health", "/foo", "/btn"] {
        let conn = rig.get(target);
        let text = conn.written_str();
        assert_eq!(
            content_length(&text),
            Some(Rig::body(&conn).len()),
            "{target}"
        );
        assert!(text.contains("Connection: close\r\n"));
    }
}

#[test]
fn root_page_lists_registered_controls() {
    let mut rig = Rig::new();
    rig.ctrl.register_button("Horn", || {});
    let conn = rig.get("/");

    let text = conn.written_str();
    assert!(text.contains("Content-Type: text/html"));
    assert!(Rig::body(&conn).contains(">Horn</button>"));
}

// ── Connection handling ───────────────────────────────────────

#[test]
fn silent_client_gets_no_response() {
    let mut rig = Rig::new();
    let conn = rig.listener.push(MemoryConnection::new());
    rig.tick();

    assert!(conn.written().is_empty());
    assert!(conn.is_closed());
    assert!(rig.clock.now_ms() >= 30);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            ControllerEvent::RequestDropped {
                reason: DropReason::Protocol(ProtocolError::Timeout),
                ..
            }
        )),
        1
    );
}

#[test]
fn partial_line_on_hang_up_is_still_served() {
    let mut rig = Rig::new();
    let conn = MemoryConnection::from_bytes(b"GET /health HTTP/1.1");
    conn.hang_up();
    let conn = rig.listener.push(conn);
    rig.tick();

    assert_eq!(Rig::body(&conn), "OK");
}

#[test]
fn one_connection_per_tick() {
    let mut rig = Rig::new();
    let first = rig.listener.push(MemoryConnection::get("/health"));
    let second = rig.listener.push(MemoryConnection::get("/health"));

    rig.tick();
    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_eq!(rig.listener.pending(), 1);

    rig.tick();
    assert!(second.is_closed());
    assert_eq!(rig.ctrl.tick_count(), 2);
}

#[test]
fn failed_send_is_reported_as_dropped() {
    let mut rig = Rig::new();
    let conn = MemoryConnection::get("/health");
    conn.fail_writes();
    rig.listener.push(conn);
    rig.tick();

    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            ControllerEvent::RequestDropped {
                reason: DropReason::SendFailed,
                ..
            }
        )),
        1
    );
    assert_eq!(rig.ctrl.status_state(), VisualState::ClientConnected);
}

#[test]
fn served_requests_are_reported() {
    let mut rig = Rig::new();
    rig.get("/health");
    rig.get("/nope");

    let routes: Vec<Route> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::RequestServed { route, .. } => Some(*route),
            _ => None,
        })
        .collect();
    assert_eq!(routes, vec![Route::Health, Route::NotFound]);
}

// ── Slow clients ──────────────────────────────────────────────

/// Drive full forward from t=0 and ramp to 100.
fn driving_rig() -> Rig {
    let mut rig = Rig::new();
    rig.get("/drive?y=100");
    for i in 1..=20 {
        rig.tick_at(i * 5);
    }
    assert_eq!(rig.ctrl.speed_left(), 100);
    rig
}

#[test]
fn trickled_request_is_cut_at_the_budget() {
    let mut rig = driving_rig();
    let budget = ControllerConfig::default().codec.request_budget_ms;
    let conn = TrickleConnection::new(b"GET /health HTTP/1.1\r\n", 25);

    let start = rig.clock.now_ms();
    rig.tick_with(conn.clone());

    assert!(rig.clock.now_ms() - start <= budget);
    assert!(conn.is_closed());
    assert!(conn.written().is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            ControllerEvent::RequestDropped {
                reason: DropReason::Protocol(ProtocolError::Timeout),
                ..
            }
        )),
        1
    );
}

#[test]
fn endless_headers_do_not_hold_the_tick() {
    let mut rig = driving_rig();
    let budget = ControllerConfig::default().codec.request_budget_ms;
    let conn = TrickleConnection::new(b"GET /health HTTP/1.1\r\n", 4);

    let start = rig.clock.now_ms();
    rig.tick_with(conn.clone());

    assert!(rig.clock.now_ms() - start <= budget);
    assert!(conn.sent() > 22);
    assert_eq!(Rig::body_of(&conn.written()), "OK");
}

#[test]
fn failsafe_engages_on_time_under_slow_clients() {
    let mut rig = driving_rig();
    let budget = ControllerConfig::default().codec.request_budget_ms;
    let timeout = ControllerConfig::default().motion.failsafe_timeout_ms;

    while rig.clock.now_ms() <= timeout {
        let start = rig.clock.now_ms();
        rig.tick_with(TrickleConnection::new(b"GET /drive?y=100 HTTP/1.1\r\n", 25));
        assert!(rig.clock.now_ms() - start <= budget);
    }

    assert!(rig.ctrl.is_failsafe_stopped());
    assert!(rig.clock.now_ms() <= timeout + budget + 1);
    assert!(rig.ctrl.speed_left() < 100);
}
