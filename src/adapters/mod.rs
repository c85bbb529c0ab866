//! Concrete implementations of the port traits.
//!
//! | Adapter    | Implements                   | Connects to                 |
//! |------------|------------------------------|-----------------------------|
//! | `hardware` | MotorPort, StatusLedPort     | H-bridge + LED pin (e-hal)  |
//! | `log_sink` | EventSink                    | `log` facade                |
//! | `sim_hw`   | MotorPort, StatusLedPort     | log output (host simulator) |
//! | `tcp`      | Listener, Connection         | `std::net` TCP socket       |
//! | `time`     | Clock                        | `std::time::Instant`        |

pub mod hardware;
pub mod log_sink;
pub mod sim_hw;
pub mod tcp;
pub mod time;
