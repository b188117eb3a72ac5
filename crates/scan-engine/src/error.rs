//! Error types for the scan engine and its collaborators

use thiserror::Error;

/// Linux errno for "device or resource busy"
pub const EBUSY: i32 = 16;
/// Linux errno for "no such device"
pub const ENODEV: i32 = 19;
/// Linux errno for "operation not supported"
pub const EOPNOTSUPP: i32 = 95;

/// Failure reported by the kernel scan transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The radio is busy with another scan or operation; retryable
    #[error("radio busy")]
    Busy,
    /// The underlying device disappeared (driver unloaded, adapter removed)
    #[error("no such device")]
    NoDevice,
    /// The driver does not implement the requested command
    #[error("operation not supported by driver")]
    Unsupported,
    /// Any other kernel error code
    #[error("kernel returned errno {0}")]
    Errno(i32),
    /// Failure that did not come with an errno (e.g. malformed reply)
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Map a positive errno value to a transport error
    pub fn from_errno(errno: i32) -> Self {
        match errno.abs() {
            EBUSY => TransportError::Busy,
            ENODEV => TransportError::NoDevice,
            EOPNOTSUPP => TransportError::Unsupported,
            other => TransportError::Errno(other),
        }
    }

    /// The errno this error corresponds to, if any
    pub fn errno(&self) -> Option<i32> {
        match self {
            TransportError::Busy => Some(EBUSY),
            TransportError::NoDevice => Some(ENODEV),
            TransportError::Unsupported => Some(EOPNOTSUPP),
            TransportError::Errno(code) => Some(*code),
            TransportError::Other(_) => None,
        }
    }

    /// Whether the error means the device is gone and no retry can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::NoDevice)
    }
}

/// Failure reported by the hardware offload engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffloadError {
    #[error("offload engine not available")]
    NotAvailable,
    #[error("offload engine rejected request: {0}")]
    Rejected(String),
    #[error("offload engine failure: {0}")]
    Other(String),
}

/// Conditions that make an interface permanently unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("device for interface {interface} (index {index}) is gone")]
    DeviceGone { interface: String, index: u32 },
}

/// Errors raised while assembling or looking up engines
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} is required")]
    MissingComponent(&'static str),
    #[error("unknown interface: {0}")]
    UnknownInterface(String),
    #[error("interface already registered: {0}")]
    DuplicateInterface(String),
}
