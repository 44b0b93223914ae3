use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;
use thiserror::Error;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

/// Decodes a signing-certificate fingerprint such as `91:F7:CB:...` into raw bytes.
///
/// Colons between hex pairs are ignored. An odd number of hex digits or any
/// character outside `[0-9a-fA-F:]` is rejected.
pub(crate) fn fingerprint_to_bytes(fingerprint: &str) -> Result<Vec<u8>, UtilError> {
    let compact: String = fingerprint.chars().filter(|c| *c != ':').collect();
    hex::decode(&compact).map_err(|e| match e {
        hex::FromHexError::OddLength => {
            UtilError::Format(format!("Fingerprint has odd length: {fingerprint}"))
        }
        hex::FromHexError::InvalidHexCharacter { c, index } => UtilError::Format(format!(
            "Invalid hex character '{c}' at {index} in fingerprint"
        )),
        other => UtilError::Format(format!("Invalid fingerprint: {other}")),
    })
}

pub(crate) fn fingerprint_to_url_safe_base64(fingerprint: &str) -> Result<String, UtilError> {
    Ok(base64url_encode(&fingerprint_to_bytes(fingerprint)?))
}

/// Rewrites a fingerprint into the uppercase colon-separated form used by
/// asset-link documents, e.g. `91f7cb` becomes `91:F7:CB`.
pub(crate) fn normalize_fingerprint(fingerprint: &str) -> Result<String, UtilError> {
    let bytes = fingerprint_to_bytes(fingerprint)?;
    Ok(bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":"))
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
