//! Drive train: command mixing, motion smoothing and actuator mapping.
//!
//! ```text
//!   /drive x,y,t ──▶ mix ──▶ DriveCommand ──▶ MotionSupervisor ──▶ SmoothedOutput
//!                                                                      │
//!                                              ActuatorMapper ◀────────┘
//!                                                    │
//!                                              MotorPort (HBridge, sim)
//! ```

pub mod actuator;
pub mod command;
pub mod hbridge;
pub mod supervisor;

pub use actuator::{ActuatorMapper, Direction, MotorOutput};
pub use command::{DriveCommand, SmoothedOutput};
pub use supervisor::{FailsafeState, MotionSupervisor, StepOutcome};
