//! Actuator mapper: signed percent speed → H-bridge direction + PWM duty.

use super::command::SPEED_MAX;

/// Full-scale PWM duty.
pub const DUTY_MAX: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    /// Both bridge inputs high: shorts the motor for an active stop.
    Brake,
}

/// What one motor channel should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorOutput {
    pub direction: Direction,
    /// PWM duty, `0..=255`.
    pub duty: u8,
}

impl MotorOutput {
    pub const BRAKE: Self = Self {
        direction: Direction::Brake,
        duty: 0,
    };
}

/// Maps speeds onto `[min_duty, 255]`.
///
/// A non-zero `min_duty` keeps small speeds above the point where the
/// motor only buzzes without turning.
#[derive(Debug, Clone, Copy)]
pub struct ActuatorMapper {
    min_duty: u8,
}

impl ActuatorMapper {
    pub const fn new(min_duty: u8) -> Self {
        Self { min_duty }
    }

    pub fn map(&self, speed: i8) -> MotorOutput {
        let speed = speed.clamp(-SPEED_MAX, SPEED_MAX);
        if speed == 0 {
            return MotorOutput::BRAKE;
        }

        let direction = if speed > 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        };
        let magnitude = u32::from(speed.unsigned_abs());
        let floor = u32::from(self.min_duty);
        let span = u32::from(DUTY_MAX) - floor;
        let duty = floor + span * magnitude / SPEED_MAX as u32;

        MotorOutput {
            direction,
            duty: duty as u8,
        }
    }
}
