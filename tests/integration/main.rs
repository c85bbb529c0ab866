//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the full [`Controller`]
//! through in-memory connections and recording mock adapters. All tests
//! run on the host with no sockets or hardware.
//!
//! [`Controller`]: roverlink::Controller

mod controller_tests;
mod failsafe_tests;
mod mock_hw;
mod status_tests;
