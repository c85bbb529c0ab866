//! Status state machine for the single indicator LED.
//!
//! The main loop calls [`StatusIndicator::step`] each tick; it returns the
//! level to write whenever the LED needs updating.
//!
//! ## Priority table
//!
//! | State           | Priority | Blink (half-period) | Hold      |
//! |-----------------|----------|---------------------|-----------|
//! | Booting         | 0        | 100 ms              | none      |
//! | ApReady         | 1        | 500 ms              | 1500 ms   |
//! | ClientConnected | 2        | steady on           | 250 ms    |
//! | Failsafe        | 3        | 150 ms              | 1000 ms   |
//! | Error           | 4        | 50 ms               | latched   |
//!
//! A hold suppresses requests of lower priority until it expires. Equal
//! or higher priority pre-empts it, so a failsafe always shows over a
//! recent client request, but not the other way round. [`force`] bypasses
//! holds entirely. Once in `Error`, requests are ignored.
//!
//! [`force`]: StatusIndicator::force

pub mod led;

use log::info;

use crate::config::StatusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Booting,
    ApReady,
    ClientConnected,
    Failsafe,
    Error,
}

impl VisualState {
    pub const fn priority(self) -> u8 {
        match self {
            Self::Booting => 0,
            Self::ApReady => 1,
            Self::ClientConnected => 2,
            Self::Failsafe => 3,
            Self::Error => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    since_ms: u32,
    duration_ms: u32,
    priority: u8,
}

impl Hold {
    fn active(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.since_ms) < self.duration_ms
    }
}

pub struct StatusIndicator {
    config: StatusConfig,
    state: VisualState,
    phase_start_ms: u32,
    level: bool,
    dirty: bool,
    hold: Option<Hold>,
}

impl StatusIndicator {
    /// Start in `Booting` with the LED on.
    pub fn new(config: &StatusConfig, now_ms: u32) -> Self {
        Self {
            config: *config,
            state: VisualState::Booting,
            phase_start_ms: now_ms,
            level: true,
            dirty: true,
            hold: None,
        }
    }

    /// Ask for a transition; honours holds and the `Error` latch.
    ///
    /// Returns `true` if the state changed. Re-requesting the current
    /// state refreshes its hold without restarting the blink phase.
    pub fn request(&mut self, state: VisualState, now_ms: u32) -> bool {
        if self.state == VisualState::Error {
            return false;
        }
        if state == self.state {
            self.hold = self.hold_for(state, now_ms);
            return false;
        }
        if let Some(hold) = self.hold.filter(|h| h.active(now_ms)) {
            if state.priority() < hold.priority {
                return false;
            }
        }
        self.enter(state, now_ms);
        self.hold = self.hold_for(state, now_ms);
        true
    }

    /// Unconditional transition for fatal conditions. Clears any hold.
    pub fn force(&mut self, state: VisualState, now_ms: u32) -> bool {
        let changed = state != self.state;
        self.enter(state, now_ms);
        self.hold = None;
        changed
    }

    /// Advance blink timing. Returns the level when the LED must be written.
    pub fn step(&mut self, now_ms: u32) -> Option<bool> {
        if let Some(period) = self.blink_period(self.state) {
            if now_ms.wrapping_sub(self.phase_start_ms) > period {
                self.level = !self.level;
                self.phase_start_ms = now_ms;
                self.dirty = true;
            }
        }
        if self.dirty {
            self.dirty = false;
            Some(self.level)
        } else {
            None
        }
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// True while a hold suppresses lower-priority requests.
    pub fn is_held(&self, now_ms: u32) -> bool {
        self.hold.is_some_and(|h| h.active(now_ms))
    }

    // ── Internal ──────────────────────────────────────────────────

    fn enter(&mut self, state: VisualState, now_ms: u32) {
        if state != self.state {
            info!("STATUS: {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.phase_start_ms = now_ms;
        self.level = true;
        self.dirty = true;
    }

    fn blink_period(&self, state: VisualState) -> Option<u32> {
        let c = &self.config;
        match state {
            VisualState::Booting => Some(c.booting_blink_ms),
            VisualState::ApReady => Some(c.ap_ready_blink_ms),
            VisualState::ClientConnected => None,
            VisualState::Failsafe => Some(c.failsafe_blink_ms),
            VisualState::Error => Some(c.error_blink_ms),
        }
    }

    fn hold_for(&self, state: VisualState, now_ms: u32) -> Option<Hold> {
        let c = &self.config;
        let duration_ms = match state {
            VisualState::ApReady => c.ap_ready_hold_ms,
            VisualState::ClientConnected => c.client_hold_ms,
            VisualState::Failsafe => c.failsafe_hold_ms,
            VisualState::Booting | VisualState::Error => 0,
        };
        (duration_ms > 0).then_some(Hold {
            since_ms: now_ms,
            duration_ms,
            priority: state.priority(),
        })
    }
}
