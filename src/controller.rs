//! Control loop, the core of the rover.
//!
//! [`Controller`] owns the router, motion supervisor and status indicator.
//! All I/O flows through port traits injected at call sites, so the whole
//! loop runs against in-memory doubles in tests.
//!
//! ```text
//!  Listener ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!               │          Controller          │
//!  MotorPort ◀──│ Router · Supervisor · Status │
//!  StatusLed ◀──└──────────────────────────────┘
//! ```
//!
//! One [`tick`](Controller::tick) services at most one connection, then
//! always steps the supervisor and then the status indicator, in that
//! order, so failsafe timing does not depend on request traffic.

use log::{debug, info, warn};

use crate::codec::{Deadline, drain_headers, read_request_line, send_response};
use crate::config::{CodecConfig, ControllerConfig};
use crate::drive::{ActuatorMapper, MotionSupervisor, SmoothedOutput};
use crate::error::{CapacityError, ProtocolError};
use crate::events::{ControllerEvent, DropReason};
use crate::net::{Connection, Listener};
use crate::ports::{Clock, EventSink, MotorChannel, MotorPort, StatusLedPort};
use crate::router::CommandRouter;
use crate::status::{StatusIndicator, VisualState};

pub type DriveObserver = Box<dyn FnMut(i8, i8)>;

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    codec: CodecConfig,
    router: CommandRouter,
    motion: MotionSupervisor,
    status: StatusIndicator,
    mapper: ActuatorMapper,
    on_drive: Option<DriveObserver>,
    tick_count: u64,
}

impl Controller {
    /// Build the core from configuration. Status starts in `Booting`.
    pub fn new(config: &ControllerConfig, now_ms: u32) -> Self {
        Self {
            codec: config.codec,
            router: CommandRouter::new(),
            motion: MotionSupervisor::new(&config.motion, now_ms),
            status: StatusIndicator::new(&config.status, now_ms),
            mapper: ActuatorMapper::new(config.motion.min_duty),
            on_drive: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot started. Leaves a latched `Error` in place.
    pub fn begin(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        self.request_status(VisualState::Booting, now_ms, sink);
        info!("controller starting");
    }

    /// The access point is listening. Restarts the failsafe timer so the
    /// timeout counts from bring-up.
    pub fn ap_ready(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        self.motion.reset_failsafe_timer(now_ms);
        self.request_status(VisualState::ApReady, now_ms, sink);
    }

    /// Bring-up failed for good (AP start failure, SSID conflict).
    pub fn fatal(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        let from = self.status.state();
        if self.status.force(VisualState::Error, now_ms) {
            emit_status(sink, from, VisualState::Error, now_ms);
        }
    }

    // ── Registration ──────────────────────────────────────────

    pub fn register_message_callback(&mut self, cb: impl FnMut(&str) + 'static) {
        self.router.set_message_callback(Box::new(cb));
    }

    pub fn register_drive_observer(&mut self, cb: impl FnMut(i8, i8) + 'static) {
        self.on_drive = Some(Box::new(cb));
    }

    /// Add a button; returns its wire id.
    pub fn try_register_button(
        &mut self,
        label: &str,
        on_press: impl FnMut() + 'static,
    ) -> Result<usize, CapacityError> {
        self.router
            .add_button(label, Box::new(on_press))
            .inspect_err(|e| warn!("button {label:?} not registered: {e}"))
    }

    pub fn register_button(&mut self, label: &str, on_press: impl FnMut() + 'static) -> bool {
        self.try_register_button(label, on_press).is_ok()
    }

    /// Add a slider; returns its wire id.
    pub fn try_register_slider(
        &mut self,
        label: &str,
        on_change: impl FnMut(i32) + 'static,
        min: i32,
        max: i32,
        initial: i32,
        step: i32,
    ) -> Result<usize, CapacityError> {
        self.router
            .add_slider(label, Box::new(on_change), min, max, initial, step)
            .inspect_err(|e| warn!("slider {label:?} not registered: {e}"))
    }

    pub fn register_slider(
        &mut self,
        label: &str,
        on_change: impl FnMut(i32) + 'static,
        min: i32,
        max: i32,
        initial: i32,
        step: i32,
    ) -> bool {
        self.try_register_slider(label, on_change, min, max, initial, step)
            .is_ok()
    }

    pub fn clear_buttons(&mut self) {
        self.router.clear_buttons();
    }

    pub fn clear_sliders(&mut self) {
        self.router.clear_sliders();
    }

    /// 0 disables the failsafe. A stop already engaged stays engaged.
    pub fn set_failsafe_timeout(&mut self, timeout_ms: u32) {
        self.motion.set_failsafe_timeout(timeout_ms);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: serve one connection → step motion → step status.
    ///
    /// The `hw` parameter satisfies **both** [`MotorPort`] and
    /// [`StatusLedPort`], mirroring a single board adapter.
    pub fn tick(
        &mut self,
        listener: &mut impl Listener,
        clock: &mut impl Clock,
        hw: &mut (impl MotorPort + StatusLedPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. At most one connection per tick
        if let Some(mut conn) = listener.poll_accept() {
            self.serve(&mut conn, clock, sink);
            conn.close();
        }

        // Re-read: serving may have waited on the peer.
        let now = clock.now_ms();

        // 2. Motion supervisor
        let outcome = self.motion.step(now);
        if outcome.failsafe_engaged {
            sink.emit(&ControllerEvent::FailsafeEngaged { at_ms: now });
            self.request_status(VisualState::Failsafe, now, sink);
        }
        if let Some(output) = outcome.output {
            self.apply_output(output, hw);
            sink.emit(&ControllerEvent::OutputChanged {
                left: output.left,
                right: output.right,
                at_ms: now,
            });
        }

        // 3. Status indicator
        if let Some(level) = self.status.step(now) {
            if let Err(e) = hw.set_level(level) {
                warn!("status LED write failed: {e}");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn speed_left(&self) -> i8 {
        self.motion.output().left
    }

    pub fn speed_right(&self) -> i8 {
        self.motion.output().right
    }

    pub fn is_failsafe_stopped(&self) -> bool {
        self.motion.is_stopped()
    }

    pub fn status_state(&self) -> VisualState {
        self.status.state()
    }

    /// Stored value of slider `id`, if registered.
    pub fn slider_value(&self, id: usize) -> Option<i32> {
        let id = i32::try_from(id).ok()?;
        self.router.sliders().get(id).map(|s| s.value())
    }

    pub fn button_count(&self) -> usize {
        self.router.buttons().len()
    }

    pub fn slider_count(&self) -> usize {
        self.router.sliders().len()
    }

    /// Control ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Read, route and answer one request.
    fn serve<C: Connection>(
        &mut self,
        conn: &mut C,
        clock: &mut impl Clock,
        sink: &mut impl EventSink,
    ) {
        let deadline = Deadline::new(clock.now_ms(), self.codec.request_budget_ms);
        let line = match read_request_line(conn, clock, self.codec.request_timeout_ms, deadline) {
            Ok(line) => line,
            Err(e) => {
                match e {
                    ProtocolError::Timeout | ProtocolError::Disconnected => {
                        debug!("connection dropped: {e}");
                    }
                    _ => warn!("bad request dropped: {e}"),
                }
                sink.emit(&ControllerEvent::RequestDropped {
                    reason: DropReason::Protocol(e),
                    at_ms: clock.now_ms(),
                });
                return;
            }
        };
        drain_headers(conn, clock, self.codec.header_timeout_ms, deadline);

        let now = clock.now_ms();
        let was_stopped = self.motion.is_stopped();
        let routed = self.router.route(&line, &mut self.motion, now);
        if was_stopped && !self.motion.is_stopped() {
            sink.emit(&ControllerEvent::FailsafeCleared { at_ms: now });
        }

        match send_response(conn, &routed.response) {
            Ok(()) => sink.emit(&ControllerEvent::RequestServed {
                route: routed.route,
                at_ms: now,
            }),
            Err(e) => {
                warn!("response to {:?} not sent: {e:?}", routed.route);
                sink.emit(&ControllerEvent::RequestDropped {
                    reason: DropReason::SendFailed,
                    at_ms: now,
                });
            }
        }

        if routed.route.is_success() {
            self.request_status(VisualState::ClientConnected, now, sink);
        }
    }

    fn apply_output(&mut self, output: SmoothedOutput, hw: &mut impl MotorPort) {
        for (channel, speed) in [
            (MotorChannel::Left, output.left),
            (MotorChannel::Right, output.right),
        ] {
            if let Err(e) = hw.apply(channel, self.mapper.map(speed)) {
                warn!("{channel:?} motor write failed: {e}");
            }
        }
        if let Some(observer) = self.on_drive.as_mut() {
            observer(output.left, output.right);
        }
    }

    fn request_status(&mut self, state: VisualState, now_ms: u32, sink: &mut impl EventSink) {
        let from = self.status.state();
        if self.status.request(state, now_ms) {
            emit_status(sink, from, state, now_ms);
        }
    }
}

fn emit_status(sink: &mut impl EventSink, from: VisualState, to: VisualState, at_ms: u32) {
    sink.emit(&ControllerEvent::StatusChanged { from, to, at_ms });
}
