//! Roverlink control-loop library.
//!
//! The runtime core of a Wi-Fi driven rover: a minimal HTTP command
//! router, a motion supervisor with deadband, slew limiting and failsafe,
//! and a status LED state machine, all advanced from one cooperative
//! [`Controller::tick`](controller::Controller::tick). Everything outside
//! the core (sockets, pins, time, logging) is reached through the port
//! traits in [`ports`] and [`net`], so the whole crate runs on the host.

#![deny(unused_must_use)]

pub mod codec;
pub mod config;
pub mod controller;
pub mod drive;
pub mod error;
pub mod events;
pub mod net;
pub mod ports;
pub mod router;
pub mod status;

pub mod adapters;

pub use config::ControllerConfig;
pub use controller::Controller;
pub use error::{Error, Result};
