//! Error types for rigbridge.
//!
//! All fallible operations across the bridge return [`Result<T>`], which
//! uses [`Error`] as the error type. Validation failures, lifecycle misuse,
//! and driver-reported failures are all captured here.

use crate::driver::Status;
use crate::types::ModelId;

/// The error type for all rigbridge operations.
///
/// `InvalidArgument`, `NotOpen` and `HandleDestroyed` are decided on the
/// caller's thread before a request is queued, so they never cost a driver
/// call. `Connection` and `Driver` carry the driver's own status code and
/// error text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A symbolic value, number, or name was not accepted for this model.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The driver's model registry does not know this model.
    #[error("invalid model: {0}")]
    InvalidModel(ModelId),

    /// The operation requires an open connection.
    #[error("rig is not open")]
    NotOpen,

    /// The handle has been destroyed (or destruction has been requested).
    #[error("rig handle has been destroyed")]
    HandleDestroyed,

    /// Connecting or disconnecting failed.
    #[error("connection error: {message} (code {code})")]
    Connection {
        /// Driver status code.
        code: i32,
        /// Driver error text for `code`.
        message: String,
    },

    /// Any other non-success outcome of a dispatched driver call.
    #[error("driver error {code}: {message}")]
    Driver {
        /// Driver status code.
        code: i32,
        /// Driver error text for `code`.
        message: String,
    },

    /// Bridge or handle configuration was rejected.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::Driver`] from a driver status and its text.
    pub fn driver(status: Status, message: impl Into<String>) -> Self {
        Error::Driver {
            code: status.code(),
            message: message.into(),
        }
    }

    /// Build a [`Error::Connection`] from a driver status and its text.
    pub fn connection(status: Status, message: impl Into<String>) -> Self {
        Error::Connection {
            code: status.code(),
            message: message.into(),
        }
    }

    /// The driver status code, for errors that carry one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Connection { code, .. } | Error::Driver { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
