//! Network boundary.
//!
//! [`transport`] holds the port traits the control loop polls; [`memory`]
//! provides in-process doubles for tests and fuzzing.

pub mod memory;
pub mod transport;

pub use transport::{Connection, Listener};
