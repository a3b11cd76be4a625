//! Error types for the bridge

use core::fmt;

/// Configuration problems detected while building the bridge.
///
/// All of them are fatal: a bridge with an invalid configuration never starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Device or bridge name is empty
    EmptyName,
    /// Name does not fit into the fixed-size name buffer
    NameTooLong,
    /// Another device is already registered under this name
    DuplicateName,
    /// TCP port is not a valid listening port
    InvalidPort,
    /// Registry capacity exhausted
    TooManyDevices,
}

/// Failure reported by the light collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// Hardware is not reachable right now
    Unavailable,
    /// Collaborator queue is full
    Busy,
}

/// Error type for bridge operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration
    Configuration(ConfigurationError),
    /// Unknown device id
    NotFound,
    /// Brightness level outside of 0..=100
    InvalidRange,
    /// Light collaborator call failed, cached state left unchanged
    Hardware(HardwareError),
    /// Request could not be parsed
    MalformedRequest,
    /// Lifecycle operation not allowed in the current state
    InvalidState,
}

impl Error {
    /// HTTP status code reported to command clients.
    pub const fn status_code(self) -> u16 {
        match self {
            Error::NotFound => 404,
            Error::InvalidRange | Error::MalformedRequest => 400,
            Error::Hardware(_) | Error::InvalidState => 503,
            Error::Configuration(_) => 500,
        }
    }

    /// Short machine-readable error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::NotFound => "not_found",
            Error::InvalidRange => "invalid_range",
            Error::Hardware(_) => "hardware_unavailable",
            Error::MalformedRequest => "malformed_request",
            Error::InvalidState => "not_running",
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::EmptyName => write!(f, "name must not be empty"),
            ConfigurationError::NameTooLong => write!(f, "name is too long"),
            ConfigurationError::DuplicateName => write!(f, "duplicate device name"),
            ConfigurationError::InvalidPort => write!(f, "invalid TCP port"),
            ConfigurationError::TooManyDevices => write!(f, "too many devices"),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Unavailable => write!(f, "hardware unavailable"),
            HardwareError::Busy => write!(f, "hardware busy"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "configuration error: {}", e),
            Error::NotFound => write!(f, "device not found"),
            Error::InvalidRange => write!(f, "brightness out of range"),
            Error::Hardware(e) => write!(f, "hardware error: {}", e),
            Error::MalformedRequest => write!(f, "malformed request"),
            Error::InvalidState => write!(f, "bridge is not running"),
        }
    }
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        Error::Configuration(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}
