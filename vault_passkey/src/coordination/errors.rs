//! Error types for the credential provider flows

use thiserror::Error;

use crate::origin::OriginError;
use crate::passkey::PasskeyError;

/// Errors that end a selection or registration flow
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// Caller or passkey failed an integrity check
    #[error("Security error: {0}")]
    Security(String),

    /// A directly addressed entry has no passkey
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request or collaborator result is missing required parts
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The request is neither a selection nor a registration
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    /// A flow was driven out of order
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error from Passkey operations
    #[error("Passkey error: {0}")]
    PasskeyError(PasskeyError),
}

/// How a failure is reported back to the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Security,
    NotFound,
    MalformedRequest,
    UnsupportedMode,
}

impl ErrorKind {
    /// Short message shown to the user when the request is cancelled.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Security => "This app is not allowed to use the selected passkey",
            Self::NotFound => "Unknown credential",
            Self::MalformedRequest => "The passkey request could not be completed",
            Self::UnsupportedMode => "Unsupported passkey request",
        }
    }
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Security(msg) => tracing::error!("Security error: {}", msg),
            Self::NotFound(msg) => tracing::error!("Not found: {}", msg),
            Self::MalformedRequest(msg) => tracing::error!("Malformed request: {}", msg),
            Self::UnsupportedMode(msg) => tracing::error!("Unsupported mode: {}", msg),
            Self::InvalidState(msg) => tracing::error!("Invalid state: {}", msg),
            Self::PasskeyError(err) => tracing::error!("Passkey error: {}", err),
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Security(_) => ErrorKind::Security,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedRequest(_) | Self::PasskeyError(_) => ErrorKind::MalformedRequest,
            Self::UnsupportedMode(_) | Self::InvalidState(_) => ErrorKind::UnsupportedMode,
        }
    }
}

impl From<PasskeyError> for CoordinationError {
    fn from(err: PasskeyError) -> Self {
        match err {
            PasskeyError::Security(msg) => Self::Security(msg),
            PasskeyError::MalformedRequest(msg) => Self::MalformedRequest(msg),
            other => Self::PasskeyError(other),
        }
    }
}

impl From<OriginError> for CoordinationError {
    fn from(err: OriginError) -> Self {
        PasskeyError::from(err).into()
    }
}
