use thiserror::Error;

/// Errors raised while identifying or verifying a calling app or web origin.
#[derive(Debug, Error, Clone)]
pub enum OriginError {
    /// No trusted origin matched the caller
    #[error("Origin mismatch: {0}")]
    Mismatch(String),

    /// Malformed origin data such as a missing or non-hex fingerprint
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The asset-link document or privileged allowlist could not be obtained or parsed
    #[error("Asset links error: {0}")]
    AssetLinks(String),
}
