//! Status LED on a single GPIO.
//!
//! Boards wire the indicator either to sink or source current, so the
//! pin polarity is configurable.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;
use crate::ports::StatusLedPort;

pub struct PinStatusLed<P> {
    pin: P,
    active_low: bool,
    current: bool,
}

impl<P: OutputPin> PinStatusLed<P> {
    /// LED lights when the pin is driven high.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            current: false,
        }
    }

    /// LED lights when the pin is driven low.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
            current: false,
        }
    }

    /// Last level written.
    pub fn is_on(&self) -> bool {
        self.current
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> StatusLedPort for PinStatusLed<P> {
    fn set_level(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.current = on;
        Ok(())
    }
}
