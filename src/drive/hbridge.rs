//! Dual H-bridge motor driver (L298N / TB6612-style).
//!
//! Each channel has two direction inputs and one PWM enable:
//!
//! | Direction | IN A | IN B | PWM   |
//! |-----------|------|------|-------|
//! | Forward   | high | low  | duty  |
//! | Reverse   | low  | high | duty  |
//! | Brake     | high | high | 0     |
//!
//! Duty arrives in `0..=255` and is rescaled to the PWM peripheral's
//! `max_duty_cycle()`. This driver is a dumb actuator; smoothing and
//! failsafe live in the [`MotionSupervisor`](super::MotionSupervisor).

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use super::actuator::{DUTY_MAX, Direction, MotorOutput};
use crate::error::ActuatorError;
use crate::ports::{MotorChannel, MotorPort};

/// Anything that can drive one motor channel.
pub trait Bridge {
    fn drive(&mut self, output: MotorOutput) -> Result<(), ActuatorError>;
}

/// One H-bridge channel over `embedded-hal` pins.
pub struct HBridge<A, B, P> {
    in_a: A,
    in_b: B,
    pwm: P,
    last: Option<MotorOutput>,
}

impl<A: OutputPin, B: OutputPin, P: SetDutyCycle> HBridge<A, B, P> {
    pub fn new(in_a: A, in_b: B, pwm: P) -> Self {
        Self {
            in_a,
            in_b,
            pwm,
            last: None,
        }
    }

    /// Last output successfully applied.
    pub fn last(&self) -> Option<MotorOutput> {
        self.last
    }

    /// Give the pins back.
    pub fn release(self) -> (A, B, P) {
        (self.in_a, self.in_b, self.pwm)
    }

    fn set_pins(&mut self, a: bool, b: bool) -> Result<(), ActuatorError> {
        let ra = if a { self.in_a.set_high() } else { self.in_a.set_low() };
        ra.map_err(|_| ActuatorError::GpioWriteFailed)?;
        let rb = if b { self.in_b.set_high() } else { self.in_b.set_low() };
        rb.map_err(|_| ActuatorError::GpioWriteFailed)
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        let max = u32::from(self.pwm.max_duty_cycle());
        let scaled = u32::from(duty) * max / u32::from(DUTY_MAX);
        self.pwm
            .set_duty_cycle(scaled as u16)
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }
}

impl<A: OutputPin, B: OutputPin, P: SetDutyCycle> Bridge for HBridge<A, B, P> {
    fn drive(&mut self, output: MotorOutput) -> Result<(), ActuatorError> {
        match output.direction {
            Direction::Forward => {
                self.set_pins(true, false)?;
                self.set_duty(output.duty)?;
            }
            Direction::Reverse => {
                self.set_pins(false, true)?;
                self.set_duty(output.duty)?;
            }
            Direction::Brake => {
                // Drop the enable before shorting the windings.
                self.set_duty(0)?;
                self.set_pins(true, true)?;
            }
        }
        self.last = Some(output);
        Ok(())
    }
}

/// Left and right channels behind [`MotorPort`].
pub struct DualHBridge<L, R> {
    pub left: L,
    pub right: R,
}

impl<L: Bridge, R: Bridge> DualHBridge<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L: Bridge, R: Bridge> MotorPort for DualHBridge<L, R> {
    fn apply(&mut self, channel: MotorChannel, output: MotorOutput) -> Result<(), ActuatorError> {
        match channel {
            MotorChannel::Left => self.left.drive(output),
            MotorChannel::Right => self.right.drive(output),
        }
    }
}
