//! Simulated board for the host binary.
//!
//! Accepts every motor and LED write, remembers the latest value per
//! output and logs it at `debug` level. Nothing here ever fails.

use log::debug;

use crate::drive::{Direction, MotorOutput};
use crate::error::ActuatorError;
use crate::ports::{MotorChannel, MotorPort, StatusLedPort};

pub struct SimHardware {
    left: MotorOutput,
    right: MotorOutput,
    led: bool,
    motor_writes: u32,
    led_writes: u32,
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHardware {
    pub fn new() -> Self {
        Self {
            left: MotorOutput::BRAKE,
            right: MotorOutput::BRAKE,
            led: false,
            motor_writes: 0,
            led_writes: 0,
        }
    }

    pub fn motor(&self, channel: MotorChannel) -> MotorOutput {
        match channel {
            MotorChannel::Left => self.left,
            MotorChannel::Right => self.right,
        }
    }

    pub fn led(&self) -> bool {
        self.led
    }

    pub fn motor_writes(&self) -> u32 {
        self.motor_writes
    }

    pub fn led_writes(&self) -> u32 {
        self.led_writes
    }
}

impl MotorPort for SimHardware {
    fn apply(&mut self, channel: MotorChannel, output: MotorOutput) -> Result<(), ActuatorError> {
        let arrow = match output.direction {
            Direction::Forward => "fwd",
            Direction::Reverse => "rev",
            Direction::Brake => "brake",
        };
        debug!("SIM | motor {channel:?} {arrow} duty={}", output.duty);
        match channel {
            MotorChannel::Left => self.left = output,
            MotorChannel::Right => self.right = output,
        }
        self.motor_writes += 1;
        Ok(())
    }
}

impl StatusLedPort for SimHardware {
    fn set_level(&mut self, on: bool) -> Result<(), ActuatorError> {
        debug!("SIM | led {}", if on { "on" } else { "off" });
        self.led = on;
        self.led_writes += 1;
        Ok(())
    }
}
