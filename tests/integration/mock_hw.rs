//! Mock adapters for integration tests.
//!
//! Records every motor, LED and event call so tests can assert on the
//! full history without touching real pins or sockets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use roverlink::drive::{Direction, MotorOutput};
use roverlink::error::ActuatorError;
use roverlink::events::ControllerEvent;
use roverlink::net::memory::{MemoryConnection, MemoryListener};
use roverlink::net::{Connection, Listener};
use roverlink::ports::{Clock, EventSink, MotorChannel, MotorPort, StatusLedPort};
use roverlink::{Controller, ControllerConfig};

// ── MockClock ─────────────────────────────────────────────────

/// Manually driven clock; codec waits advance it.
pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub motors: Vec<(MotorChannel, MotorOutput)>,
    pub led: Vec<bool>,
    pub fail_motors: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            motors: Vec::new(),
            led: Vec::new(),
            fail_motors: false,
        }
    }

    pub fn last_motor(&self, channel: MotorChannel) -> Option<MotorOutput> {
        self.motors
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, o)| *o)
    }

    pub fn is_braking(&self) -> bool {
        [MotorChannel::Left, MotorChannel::Right]
            .iter()
            .all(|c| matches!(self.last_motor(*c), Some(o) if o.direction == Direction::Brake))
    }

    pub fn led_level(&self) -> Option<bool> {
        self.led.last().copied()
    }
}

impl MotorPort for MockHardware {
    fn apply(&mut self, channel: MotorChannel, output: MotorOutput) -> Result<(), ActuatorError> {
        if self.fail_motors {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.motors.push((channel, output));
        Ok(())
    }
}

impl StatusLedPort for MockHardware {
    fn set_level(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.led.push(on);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(*event);
    }
}

// ── TrickleConnection ─────────────────────────────────────────

#[derive(Default)]
struct TrickleState {
    reads: u32,
    sent: usize,
    written: Vec<u8>,
    closed: bool,
}

/// Slow client: sends `head` one byte per `every` reads, then endless
/// 400-byte header lines at the same pace. Never goes idle long enough
/// to trip an inactivity timeout on its own.
#[derive(Clone)]
pub struct TrickleConnection {
    head: &'static [u8],
    every: u32,
    state: Rc<RefCell<TrickleState>>,
}

#[allow(dead_code)]
impl TrickleConnection {
    pub fn new(head: &'static [u8], every: u32) -> Self {
        Self {
            head,
            every,
            state: Rc::default(),
        }
    }

    pub fn sent(&self) -> usize {
        self.state.borrow().sent
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().written.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn byte_at(&self, i: usize) -> u8 {
        if let Some(b) = self.head.get(i) {
            return *b;
        }
        if (i - self.head.len()) % 400 == 399 { b'\n' } else { b'a' }
    }
}

impl Connection for TrickleConnection {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let mut st = self.state.borrow_mut();
        st.reads += 1;
        if buf.is_empty() || st.reads % self.every != 0 {
            return Ok(0);
        }
        buf[0] = self.byte_at(st.sent);
        st.sent += 1;
        Ok(1)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.state.borrow_mut().written.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.state.borrow().closed
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

/// Listener handing out a single pre-built connection.
pub struct OneShotListener<C>(pub Option<C>);

impl<C: Connection> Listener for OneShotListener<C> {
    type Conn = C;

    fn poll_accept(&mut self) -> Option<C> {
        self.0.take()
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A controller wired to mock adapters, already past `ap_ready`.
pub struct Rig {
    pub ctrl: Controller,
    pub listener: MemoryListener,
    pub clock: MockClock,
    pub hw: MockHardware,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(&ControllerConfig::default())
    }

    pub fn with_config(config: &ControllerConfig) -> Self {
        let clock = MockClock::new(0);
        let mut sink = RecordingSink::new();
        let mut ctrl = Controller::new(config, 0);
        ctrl.begin(0, &mut sink);
        ctrl.ap_ready(0, &mut sink);
        Self {
            ctrl,
            listener: MemoryListener::new(),
            clock,
            hw: MockHardware::new(),
            sink,
        }
    }

    pub fn tick(&mut self) {
        self.ctrl
            .tick(&mut self.listener, &mut self.clock, &mut self.hw, &mut self.sink);
    }

    /// Set the clock to `ms`, then tick.
    pub fn tick_at(&mut self, ms: u32) {
        self.clock.set(ms);
        self.tick();
    }

    /// Run one tick serving `conn` instead of the memory listener.
    pub fn tick_with<C: Connection>(&mut self, conn: C) {
        self.ctrl.tick(
            &mut OneShotListener(Some(conn)),
            &mut self.clock,
            &mut self.hw,
            &mut self.sink,
        );
    }

    /// Queue `GET <target>`, run one tick and return the connection.
    pub fn get(&mut self, target: &str) -> MemoryConnection {
        let conn = self.listener.push(MemoryConnection::get(target));
        self.tick();
        conn
    }

    /// Body of the response written to `conn`.
    pub fn body(conn: &MemoryConnection) -> String {
        Self::body_of(&conn.written())
    }

    /// Body of a raw response.
    pub fn body_of(bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        text.split_once("\r\n\r\n")
            .map(|(_, b)| b.to_owned())
            .unwrap_or_default()
    }
}
