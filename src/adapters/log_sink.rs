//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`ControllerEvent`] as one
//! tagged line through the `log` facade. Motor output lines are throttled:
//! at most one per interval unless a side changes sign or reaches zero.

use log::{info, warn};

use crate::events::{ControllerEvent, DropReason};
use crate::ports::EventSink;

/// Default minimum spacing between motor output lines.
pub const OUTPUT_LOG_INTERVAL_MS: u32 = 150;

/// Adapter that logs every [`ControllerEvent`].
pub struct LogEventSink {
    interval_ms: u32,
    last_output: Option<(i8, i8, u32)>,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::with_interval(OUTPUT_LOG_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_output: None,
        }
    }

    /// Decide whether an output line is due, and remember it if so.
    fn output_due(&mut self, left: i8, right: i8, at_ms: u32) -> bool {
        let due = match self.last_output {
            None => true,
            Some((l, r, t)) => {
                left.signum() != l.signum()
                    || right.signum() != r.signum()
                    || at_ms.wrapping_sub(t) >= self.interval_ms
            }
        };
        if due {
            self.last_output = Some((left, right, at_ms));
        }
        due
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match *event {
            ControllerEvent::RequestServed { route, at_ms } => {
                info!("HTTP | {route:?} served @{at_ms}ms");
            }
            ControllerEvent::RequestDropped { reason, at_ms } => match reason {
                DropReason::Protocol(e) => info!("HTTP | dropped ({e}) @{at_ms}ms"),
                DropReason::SendFailed => warn!("HTTP | response not sent @{at_ms}ms"),
            },
            ControllerEvent::OutputChanged { left, right, at_ms } => {
                if self.output_due(left, right, at_ms) {
                    info!("DRIVE | L={left:+4} R={right:+4} @{at_ms}ms");
                }
            }
            ControllerEvent::FailsafeEngaged { at_ms } => {
                warn!("FAILSAFE | engaged, motors stopping @{at_ms}ms");
            }
            ControllerEvent::FailsafeCleared { at_ms } => {
                info!("FAILSAFE | cleared @{at_ms}ms");
            }
            ControllerEvent::StatusChanged { from, to, at_ms } => {
                info!("STATUS | {from:?} -> {to:?} @{at_ms}ms");
            }
        }
    }
}
