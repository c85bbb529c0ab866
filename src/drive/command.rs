//! Drive mailbox and the two-axis differential mix.

/// Largest speed magnitude, in percent.
pub const SPEED_MAX: i8 = 100;

/// Commanded wheel speeds in percent, `-100..=100`.
///
/// A mailbox: each `/drive` overwrites it, nothing queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveCommand {
    pub target_left: i8,
    pub target_right: i8,
}

/// Speeds actually applied after deadband and slew limiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoothedOutput {
    pub left: i8,
    pub right: i8,
}

impl DriveCommand {
    pub const STOP: Self = Self {
        target_left: 0,
        target_right: 0,
    };

    /// Mix joystick axes into wheel speeds.
    ///
    /// `x` is turn and `y` is forward, both clamped to `-100..=100`; `t`
    /// is a throttle percentage clamped to `0..=100`. Each side is
    /// clamped before scaling, and the scale truncates toward zero.
    pub fn from_joystick(x: i32, y: i32, t: i32) -> Self {
        let x = x.clamp(-100, 100);
        let y = y.clamp(-100, 100);
        let t = t.clamp(0, 100);

        let left = (y + x).clamp(-100, 100) * t / 100;
        let right = (y - x).clamp(-100, 100) * t / 100;

        Self {
            target_left: left as i8,
            target_right: right as i8,
        }
    }
}
