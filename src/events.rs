//! Outbound controller events.
//!
//! The [`Controller`](crate::controller::Controller) emits these through the
//! [`EventSink`](crate::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, record in a test, etc.

use crate::error::ProtocolError;
use crate::router::Route;
use crate::status::VisualState;

/// Why a connection was closed without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The request line was absent or malformed.
    Protocol(ProtocolError),
    /// The response could not be written.
    SendFailed,
}

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A request was routed and answered.
    RequestServed { route: Route, at_ms: u32 },

    /// A connection was closed without a response.
    RequestDropped { reason: DropReason, at_ms: u32 },

    /// The smoothed motor output moved.
    OutputChanged { left: i8, right: i8, at_ms: u32 },

    /// No drive command arrived within the failsafe timeout.
    FailsafeEngaged { at_ms: u32 },

    /// A drive command released an engaged failsafe.
    FailsafeCleared { at_ms: u32 },

    /// The status indicator changed state.
    StatusChanged {
        from: VisualState,
        to: VisualState,
        at_ms: u32,
    },
}
