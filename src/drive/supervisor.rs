//! Motion supervisor.
//!
//! Runs **every tick after request handling** and turns the latest
//! [`DriveCommand`] into a [`SmoothedOutput`]:
//!
//! 1. If no drive command arrived within the failsafe timeout, latch the
//!    stop and target `(0, 0)`.
//! 2. Otherwise collapse near-zero axes through the deadband.
//! 3. Move each axis toward its target by at most one slew step. Braking
//!    toward 0 uses the larger stop step.
//! 4. Report the new output only if it moved.
//!
//! ## Failsafe lifecycle
//!
//! `Active → Stopped` when `now - last_command > timeout` (timeout > 0).
//! `Stopped → Active` only through [`MotionSupervisor::set_target`], i.e. a
//! successfully parsed `/drive`. Changing the timeout never clears a
//! latched stop.

use log::{info, warn};

use super::command::{DriveCommand, SmoothedOutput};
use crate::config::MotionConfig;

/// Liveness watchdog for the drive mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailsafeState {
    pub last_command_ms: u32,
    /// 0 disables engagement.
    pub timeout_ms: u32,
    pub is_stopped: bool,
}

impl FailsafeState {
    fn expired(&self, now_ms: u32) -> bool {
        self.timeout_ms > 0 && now_ms.wrapping_sub(self.last_command_ms) > self.timeout_ms
    }
}

/// Result of one [`MotionSupervisor::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// New output, `None` when neither axis moved.
    pub output: Option<SmoothedOutput>,
    /// True only on the tick where the failsafe engaged.
    pub failsafe_engaged: bool,
}

pub struct MotionSupervisor {
    target: DriveCommand,
    output: SmoothedOutput,
    failsafe: FailsafeState,
    deadband: u8,
    slew_step: u8,
    slew_step_stop: u8,
}

impl MotionSupervisor {
    pub fn new(config: &MotionConfig, now_ms: u32) -> Self {
        Self {
            target: DriveCommand::STOP,
            output: SmoothedOutput::default(),
            failsafe: FailsafeState {
                last_command_ms: now_ms,
                timeout_ms: config.failsafe_timeout_ms,
                is_stopped: false,
            },
            deadband: config.deadband,
            slew_step: config.slew_step,
            slew_step_stop: config.slew_step_stop,
        }
    }

    /// Store a new drive target and feed the watchdog.
    ///
    /// Returns `true` if this released a latched failsafe stop.
    pub fn set_target(&mut self, cmd: DriveCommand, now_ms: u32) -> bool {
        self.target = cmd;
        self.failsafe.last_command_ms = now_ms;
        let cleared = self.failsafe.is_stopped;
        if cleared {
            info!("FAILSAFE CLEARED: drive command received");
        }
        self.failsafe.is_stopped = false;
        cleared
    }

    /// Restart the watchdog without touching the target.
    pub fn reset_failsafe_timer(&mut self, now_ms: u32) {
        self.failsafe.last_command_ms = now_ms;
    }

    /// Change the timeout; 0 disables future engagement.
    pub fn set_failsafe_timeout(&mut self, timeout_ms: u32) {
        self.failsafe.timeout_ms = timeout_ms;
    }

    /// Advance one tick.
    pub fn step(&mut self, now_ms: u32) -> StepOutcome {
        let mut failsafe_engaged = false;
        if !self.failsafe.is_stopped && self.failsafe.expired(now_ms) {
            warn!(
                "FAILSAFE ENGAGED: no drive command for {} ms",
                now_ms.wrapping_sub(self.failsafe.last_command_ms)
            );
            self.failsafe.is_stopped = true;
            failsafe_engaged = true;
        }

        let (left, right) = if self.failsafe.is_stopped {
            (0, 0)
        } else {
            (
                self.apply_deadband(self.target.target_left),
                self.apply_deadband(self.target.target_right),
            )
        };

        let next = SmoothedOutput {
            left: self.slew(self.output.left, left),
            right: self.slew(self.output.right, right),
        };

        let output = if next == self.output {
            None
        } else {
            self.output = next;
            Some(next)
        };

        StepOutcome {
            output,
            failsafe_engaged,
        }
    }

    pub fn output(&self) -> SmoothedOutput {
        self.output
    }

    pub fn target(&self) -> DriveCommand {
        self.target
    }

    pub fn failsafe(&self) -> FailsafeState {
        self.failsafe
    }

    pub fn is_stopped(&self) -> bool {
        self.failsafe.is_stopped
    }

    // ── Internal ──────────────────────────────────────────────────

    fn apply_deadband(&self, v: i8) -> i8 {
        if v.unsigned_abs() < self.deadband { 0 } else { v }
    }

    /// One bounded step from `current` toward `target`.
    fn slew(&self, current: i8, target: i8) -> i8 {
        let limit = i16::from(if target == 0 {
            self.slew_step_stop
        } else {
            self.slew_step
        });
        let delta = (i16::from(target) - i16::from(current)).clamp(-limit, limit);
        (i16::from(current) + delta) as i8
    }
}
