use ring::digest;
use serde::Serialize;

use super::errors::PasskeyError;
use crate::utils::base64url_encode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClientDataType {
    Get,
    Create,
}

impl ClientDataType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "webauthn.get",
            Self::Create => "webauthn.create",
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CollectedClientData<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    challenge: &'a str,
    origin: &'a str,
    cross_origin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    android_package_name: Option<&'a str>,
}

/// Client data that the signature is computed over.
///
/// A privileged browser assembles client data itself and only hands over the
/// hash. For every other caller the JSON is built here, binding the challenge
/// to the verified origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientDataResponse {
    Defined { hash: Vec<u8> },
    Built { json: Vec<u8> },
}

impl ClientDataResponse {
    pub(crate) fn for_request(
        supplied_hash: Option<&[u8]>,
        type_: ClientDataType,
        challenge: &str,
        origin: &str,
        android_package_name: Option<&str>,
    ) -> Result<Self, PasskeyError> {
        if let Some(hash) = supplied_hash {
            if hash.len() != digest::SHA256_OUTPUT_LEN {
                return Err(PasskeyError::MalformedRequest(format!(
                    "Client data hash must be {} bytes, got {}",
                    digest::SHA256_OUTPUT_LEN,
                    hash.len()
                )));
            }
            return Ok(Self::Defined {
                hash: hash.to_vec(),
            });
        }

        let json = serde_json::to_vec(&CollectedClientData {
            type_: type_.as_str(),
            challenge,
            origin,
            cross_origin: false,
            android_package_name,
        })?;
        tracing::debug!("Built {} client data for {}", type_.as_str(), origin);
        Ok(Self::Built { json })
    }

    /// SHA-256 of the client data, the value appended to authenticator data
    /// before signing.
    pub fn hash(&self) -> Vec<u8> {
        match self {
            Self::Defined { hash } => hash.clone(),
            Self::Built { json } => digest::digest(&digest::SHA256, json).as_ref().to_vec(),
        }
    }

    /// Base64url client data JSON, when it was built locally.
    pub fn json_base64(&self) -> Option<String> {
        match self {
            Self::Defined { .. } => None,
            Self::Built { json } => Some(base64url_encode(json)),
        }
    }
}
