//! Fuzz target: request reading, routing and response writing.
//!
//! Feeds arbitrary bytes as a client request through the codec and the
//! router with one button and one slider registered, and checks the
//! response framing.
//!
//! cargo fuzz run fuzz_request_line

#![no_main]

use std::cell::Cell;

use libfuzzer_sys::fuzz_target;
use roverlink::codec::{Deadline, drain_headers, read_request_line, send_response};
use roverlink::config::MotionConfig;
use roverlink::drive::MotionSupervisor;
use roverlink::net::memory::MemoryConnection;
use roverlink::ports::Clock;
use roverlink::router::CommandRouter;

struct StepClock(Cell<u32>);

impl Clock for StepClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

fuzz_target!(|data: &[u8]| {
    let mut conn = MemoryConnection::from_bytes(data);
    // Peer closes after sending, so reads terminate without waiting.
    conn.hang_up();
    let mut clock = StepClock(Cell::new(0));
    let deadline = Deadline::new(0, 100);

    let Ok(line) = read_request_line(&mut conn, &mut clock, 30, deadline) else {
        return;
    };
    drain_headers(&mut conn, &mut clock, 30, deadline);

    let mut router = CommandRouter::new();
    let _ = router.add_button("A", Box::new(|| {}));
    let _ = router.add_slider("S", Box::new(|_| {}), -50, 50, 0, 1);
    let mut motion = MotionSupervisor::new(&MotionConfig::default(), 0);

    let routed = router.route(&line, &mut motion, clock.now_ms());
    let target = motion.target();
    assert!((-100..=100).contains(&target.target_left));
    assert!((-100..=100).contains(&target.target_right));
    if let Some(s) = router.sliders().get(0) {
        assert!(s.min() <= s.value() && s.value() <= s.max());
    }

    send_response(&mut conn, &routed.response).expect("memory write failed");
    let text = conn.written_str();
    let header = format!("Content-Length: {}\r\n", routed.response.body.len());
    assert!(text.contains(&header), "Content-Length mismatch");
});
