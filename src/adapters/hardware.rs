//! Hardware adapter bridging real peripherals to the port traits.
//!
//! Owns the motor driver and the status LED and exposes them together,
//! which is the shape [`Controller::tick`](crate::controller::Controller::tick)
//! expects. Typical wiring is a [`DualHBridge`](crate::drive::hbridge::DualHBridge)
//! plus a [`PinStatusLed`](crate::status::led::PinStatusLed).

use crate::drive::MotorOutput;
use crate::error::ActuatorError;
use crate::ports::{MotorChannel, MotorPort, StatusLedPort};

/// Concrete adapter that combines the board's actuators.
pub struct HardwareAdapter<M, L> {
    motors: M,
    led: L,
}

impl<M: MotorPort, L: StatusLedPort> HardwareAdapter<M, L> {
    pub fn new(motors: M, led: L) -> Self {
        Self { motors, led }
    }

    /// Brake both channels and switch the LED off.
    pub fn all_off(&mut self) -> crate::Result<()> {
        self.motors.apply(MotorChannel::Left, MotorOutput::BRAKE)?;
        self.motors.apply(MotorChannel::Right, MotorOutput::BRAKE)?;
        self.led.set_level(false)?;
        Ok(())
    }

    pub fn into_parts(self) -> (M, L) {
        (self.motors, self.led)
    }
}

// ── MotorPort implementation ──────────────────────────────────

impl<M: MotorPort, L> MotorPort for HardwareAdapter<M, L> {
    fn apply(&mut self, channel: MotorChannel, output: MotorOutput) -> Result<(), ActuatorError> {
        self.motors.apply(channel, output)
    }
}

// ── StatusLedPort implementation ──────────────────────────────

impl<M, L: StatusLedPort> StatusLedPort for HardwareAdapter<M, L> {
    fn set_level(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.led.set_level(on)
    }
}
