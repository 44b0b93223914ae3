//! Authenticator data and attestation object encoding
//!
//! Layout of authenticator data:
//! `SHA-256(rp id) (32) || flags (1) || counter (4, big endian) || attested credential data?`
//!
//! Attested credential data:
//! `AAGUID (16) || credential id length (2, big endian) || credential id || COSE key`

use ciborium::value::Value as CborValue;
use ring::digest;
use uuid::Uuid;

use super::errors::PasskeyError;

pub(crate) const FLAG_UP: u8 = 0x01;
pub(crate) const FLAG_UV: u8 = 0x04;
pub(crate) const FLAG_BE: u8 = 0x08;
pub(crate) const FLAG_BS: u8 = 0x10;
pub(crate) const FLAG_AT: u8 = 0x40;

pub(crate) fn flags(user_verified: bool, backup_eligibility: bool, backup_state: bool) -> u8 {
    let mut flags = FLAG_UP;
    if user_verified {
        flags |= FLAG_UV;
    }
    if backup_eligibility {
        flags |= FLAG_BE;
    }
    if backup_state {
        flags |= FLAG_BS;
    }
    flags
}

pub(crate) fn authenticator_data(
    relying_party: &str,
    flags: u8,
    counter: u32,
    attested_credential_data: Option<&[u8]>,
) -> Vec<u8> {
    let rp_id_hash = digest::digest(&digest::SHA256, relying_party.as_bytes());

    let mut data = Vec::with_capacity(37 + attested_credential_data.map_or(0, <[u8]>::len));
    data.extend_from_slice(rp_id_hash.as_ref());
    match attested_credential_data {
        Some(attested) => {
            data.push(flags | FLAG_AT);
            data.extend_from_slice(&counter.to_be_bytes());
            data.extend_from_slice(attested);
        }
        None => {
            data.push(flags & !FLAG_AT);
            data.extend_from_slice(&counter.to_be_bytes());
        }
    }
    data
}

pub(crate) fn attested_credential_data(
    aaguid: &Uuid,
    credential_id: &[u8],
    cose_public_key: &[u8],
) -> Result<Vec<u8>, PasskeyError> {
    let id_len = u16::try_from(credential_id.len())
        .map_err(|_| PasskeyError::Format("Credential id too long".to_string()))?;

    let mut data = Vec::with_capacity(18 + credential_id.len() + cose_public_key.len());
    data.extend_from_slice(aaguid.as_bytes());
    data.extend_from_slice(&id_len.to_be_bytes());
    data.extend_from_slice(credential_id);
    data.extend_from_slice(cose_public_key);
    Ok(data)
}

/// CBOR `{"fmt": "none", "attStmt": {}, "authData": <bytes>}`.
pub(crate) fn none_attestation_object(auth_data: Vec<u8>) -> Result<Vec<u8>, PasskeyError> {
    let attestation = CborValue::Map(vec![
        (
            CborValue::Text("fmt".to_string()),
            CborValue::Text("none".to_string()),
        ),
        (
            CborValue::Text("attStmt".to_string()),
            CborValue::Map(Vec::new()),
        ),
        (
            CborValue::Text("authData".to_string()),
            CborValue::Bytes(auth_data),
        ),
    ]);

    let mut encoded = Vec::new();
    ciborium::ser::into_writer(&attestation, &mut encoded)
        .map_err(|e| PasskeyError::Format(format!("Failed to encode attestation object: {e}")))?;
    Ok(encoded)
}
