//! Request provenance codes
//!
//! When a request is relaunched with a target entry id (the node id), the
//! launcher attaches an HMAC of that id. Only requests carrying a code issued
//! by this process for the same node are allowed to address an entry directly.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::errors::PasskeyError;
use crate::utils::{base64url_encode, gen_random_bytes};

type HmacSha256 = Hmac<Sha256>;

const KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct ProvenanceKey {
    key: Vec<u8>,
}

impl fmt::Debug for ProvenanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProvenanceKey([redacted])")
    }
}

impl ProvenanceKey {
    pub fn generate() -> Result<Self, PasskeyError> {
        Ok(Self {
            key: gen_random_bytes(KEY_LEN)?,
        })
    }

    pub fn from_bytes(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    pub fn issue(&self, node_id: &Uuid) -> Result<String, PasskeyError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PasskeyError::Crypto(format!("Invalid provenance key: {e}")))?;
        mac.update(node_id.as_bytes());
        Ok(base64url_encode(&mac.finalize().into_bytes()))
    }

    pub fn verify(&self, node_id: &Uuid, code: &str) -> bool {
        match self.issue(node_id) {
            Ok(expected) => expected.as_bytes().ct_eq(code.as_bytes()).into(),
            Err(e) => {
                tracing::error!("Provenance code could not be computed: {}", e);
                false
            }
        }
    }
}

/// Rejects a request that names a node without a valid code for it.
///
/// Requests without a node id pass; they cannot bypass the picker.
pub fn check_request_provenance(
    key: &ProvenanceKey,
    node_id: Option<&Uuid>,
    auth_code: Option<&str>,
) -> Result<(), PasskeyError> {
    let Some(node_id) = node_id else {
        return Ok(());
    };

    match auth_code {
        Some(code) if key.verify(node_id, code) => Ok(()),
        Some(_) => {
            tracing::error!("Provenance code does not match node {}", node_id);
            Err(PasskeyError::Security(
                "Invalid request provenance".to_string(),
            ))
        }
        None => {
            tracing::error!("Provenance code missing for node {}", node_id);
            Err(PasskeyError::Security(
                "Missing request provenance".to_string(),
            ))
        }
    }
}
