//! Port traits at the boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (core)
//! ```
//!
//! Driven adapters (clock, motors, status LED, event sink) implement these
//! traits. The [`Controller`](crate::controller::Controller) consumes them
//! via generics, so the core never touches pins, sockets or wall time
//! directly. The network side lives in [`crate::net::transport`].

use crate::drive::actuator::MotorOutput;
use crate::error::ActuatorError;
use crate::events::ControllerEvent;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
///
/// Readings wrap after ~49.7 days; every consumer compares them with
/// `wrapping_sub`, so the wrap is harmless.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u32;

    /// Short cooperative pause used while polling a connection for bytes.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Motor port (core → hardware)
// ───────────────────────────────────────────────────────────────

/// Drive-train side of a two-wheeled (or two-track) chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorChannel {
    Left,
    Right,
}

/// Write-side port for the drive motors.
pub trait MotorPort {
    /// Apply a direction and duty cycle to one channel.
    fn apply(&mut self, channel: MotorChannel, output: MotorOutput) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Status LED port
// ───────────────────────────────────────────────────────────────

/// Single visual indicator driven by the status state machine.
pub trait StatusLedPort {
    /// Turn the indicator on (`true`) or off.
    fn set_level(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`ControllerEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

/// Sink that drops every event.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &ControllerEvent) {}
}
