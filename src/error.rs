//! Unified error types for the rover control core.
//!
//! One `Error` enum that every subsystem converts into, so the control
//! loop's handling stays uniform. All variants are `Copy`; nothing here
//! allocates.
//!
//! None of these ever crash the loop. Protocol errors drop the
//! connection without a response, validation errors become a 200 text
//! body, capacity errors are returned to the registering caller.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The request line was absent or malformed.
    Protocol(ProtocolError),
    /// A routed request carried missing or out-of-range parameters.
    Validation(ValidationError),
    /// A registry refused a registration.
    Capacity(CapacityError),
    /// A motor or LED write failed.
    Actuator(ActuatorError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Capacity(e) => write!(f, "capacity: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// No byte arrived within the bounded wait.
    Timeout,
    /// The peer closed before sending anything useful.
    Disconnected,
    /// The request line was blank.
    Empty,
    /// The request line exceeded the line buffer.
    LineTooLong,
    /// The request line was not valid UTF-8.
    NotUtf8,
    /// The connection reported a read error.
    ReadFailed,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request line timed out"),
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::Empty => write!(f, "empty request line"),
            Self::LineTooLong => write!(f, "request line too long"),
            Self::NotUtf8 => write!(f, "request line is not UTF-8"),
            Self::ReadFailed => write!(f, "connection read failed"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Parameter problems on `/btn` and `/sld`.
///
/// `Display` renders the exact text body sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingId,
    MissingValue,
    BadId,
}

impl ValidationError {
    /// Wire body for this error.
    pub const fn body(self) -> &'static str {
        match self {
            Self::MissingId => "Missing id",
            Self::MissingValue => "Missing v",
            Self::BadId => "Bad id",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.body())
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Capacity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// Every slot in the registry is taken.
    RegistryFull,
    /// The label does not fit the fixed label buffer.
    LabelTooLong,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "registry full"),
            Self::LabelTooLong => write!(f, "label too long"),
        }
    }
}

impl From<CapacityError> for Error {
    fn from(e: CapacityError) -> Self {
        Self::Capacity(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON document could not be parsed into a config.
    Parse,
    /// A field failed range validation. The message names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config could not be parsed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
