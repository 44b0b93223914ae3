use ciborium::value::{Integer, Value as CborValue};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};

use crate::passkey::errors::PasskeyError;

/// COSE algorithm identifier for ECDSA P-256 with SHA-256.
pub const COSE_ALG_ES256: i64 = -7;

pub(crate) struct GeneratedKey {
    pub(crate) pkcs8: Vec<u8>,
    pub(crate) public_key: Vec<u8>,
}

pub(crate) fn generate_es256_key() -> Result<GeneratedKey, PasskeyError> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
        .map_err(|_| PasskeyError::Crypto("Failed to generate P-256 key".to_string()))?;
    let public_key = public_key_from_pkcs8(pkcs8.as_ref())?;

    Ok(GeneratedKey {
        pkcs8: pkcs8.as_ref().to_vec(),
        public_key,
    })
}

fn load_key_pair(pkcs8: &[u8]) -> Result<EcdsaKeyPair, PasskeyError> {
    EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &SystemRandom::new())
        .map_err(|e| PasskeyError::Crypto(format!("Invalid private key: {e}")))
}

/// Uncompressed SEC1 point (`0x04 || x || y`).
pub(crate) fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>, PasskeyError> {
    Ok(load_key_pair(pkcs8)?.public_key().as_ref().to_vec())
}

/// ASN.1 DER encoded ECDSA signature over `message`.
pub(crate) fn sign_es256(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>, PasskeyError> {
    let key_pair = load_key_pair(pkcs8)?;
    let signature = key_pair
        .sign(&SystemRandom::new(), message)
        .map_err(|_| PasskeyError::Crypto("Signing failed".to_string()))?;
    Ok(signature.as_ref().to_vec())
}

/// Encodes a P-256 public key as a COSE_Key map.
///
/// Layout: `{1: 2 (EC2), 3: -7 (ES256), -1: 1 (P-256), -2: x, -3: y}`.
pub(crate) fn cose_encode_es256(public_key: &[u8]) -> Result<Vec<u8>, PasskeyError> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(PasskeyError::Format(
            "Expected an uncompressed P-256 public key".to_string(),
        ));
    }

    let cose_key = CborValue::Map(vec![
        (
            CborValue::Integer(Integer::from(1)),
            CborValue::Integer(Integer::from(2)),
        ),
        (
            CborValue::Integer(Integer::from(3)),
            CborValue::Integer(Integer::from(COSE_ALG_ES256)),
        ),
        (
            CborValue::Integer(Integer::from(-1)),
            CborValue::Integer(Integer::from(1)),
        ),
        (
            CborValue::Integer(Integer::from(-2)),
            CborValue::Bytes(public_key[1..33].to_vec()),
        ),
        (
            CborValue::Integer(Integer::from(-3)),
            CborValue::Bytes(public_key[33..65].to_vec()),
        ),
    ]);

    let mut encoded = Vec::new();
    ciborium::ser::into_writer(&cose_key, &mut encoded)
        .map_err(|e| PasskeyError::Format(format!("Failed to encode COSE key: {e}")))?;
    Ok(encoded)
}
