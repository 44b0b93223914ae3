use thiserror::Error;

use crate::origin::OriginError;
use crate::utils::UtilError;

/// Errors that can occur while resolving passkey requests or building responses.
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// Caller could not be tied to a trusted origin, or credential material was tampered with
    #[error("Security error: {0}")]
    Security(String),

    /// A required request field is missing or unreadable
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Error in cryptographic operations (key generation, signing)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error with improperly formatted data
    #[error("Invalid format: {0}")]
    Format(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    /// Error from JSON serialization/deserialization
    #[error("Serde error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Origin failures always fail closed.
impl From<OriginError> for PasskeyError {
    fn from(err: OriginError) -> Self {
        Self::Security(err.to_string())
    }
}
