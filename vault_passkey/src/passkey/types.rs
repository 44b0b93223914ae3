use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client_data::ClientDataResponse;
use crate::origin::{CallingAppInfo, VerifiedOrigin};

/// A credential as stored in a vault entry.
///
/// Equality is field-for-field; registration relies on it to detect a passkey
/// that was altered between minting and persistence.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passkey {
    pub username: String,
    /// PKCS#8 document of the P-256 private key, base64url encoded.
    pub private_key: String,
    pub credential_id: String,
    pub user_handle: String,
    pub relying_party: String,
    pub signature_counter: u32,
    pub backup_eligibility: Option<bool>,
    pub backup_state: Option<bool>,
}

impl fmt::Debug for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passkey")
            .field("username", &self.username)
            .field("private_key", &"[redacted]")
            .field("credential_id", &self.credential_id)
            .field("user_handle", &self.user_handle)
            .field("relying_party", &self.relying_party)
            .field("signature_counter", &self.signature_counter)
            .field("backup_eligibility", &self.backup_eligibility)
            .field("backup_state", &self.backup_state)
            .finish()
    }
}

/// Inbound "get credential" request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GetCredentialRequest {
    /// WebAuthn `PublicKeyCredentialRequestOptions` as JSON.
    pub request_json: String,
    /// Hash of client data already assembled by a privileged browser.
    pub client_data_hash: Option<Vec<u8>>,
    pub calling_app: CallingAppInfo,
}

/// Inbound "create credential" request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateCredentialRequest {
    /// WebAuthn `PublicKeyCredentialCreationOptions` as JSON.
    pub request_json: String,
    pub client_data_hash: Option<Vec<u8>>,
    pub calling_app: CallingAppInfo,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct RequestOptionsJson {
    pub(super) rp_id: Option<String>,
    pub(super) challenge: Option<String>,
    #[serde(default)]
    pub(super) allow_credentials: Vec<CredentialDescriptor>,
    pub(super) user_verification: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(super) struct CredentialDescriptor {
    #[serde(rename = "type", default)]
    pub(super) type_: Option<String>,
    pub(super) id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreationOptionsJson {
    pub(super) rp: Option<RelyingPartyEntity>,
    pub(super) user: Option<UserEntity>,
    pub(super) challenge: Option<String>,
    #[serde(default)]
    pub(super) pub_key_cred_params: Vec<PubKeyCredParam>,
}

#[derive(Deserialize, Debug)]
pub(super) struct RelyingPartyEntity {
    pub(super) id: Option<String>,
    pub(super) name: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserEntity {
    pub(super) id: Option<String>,
    #[serde(default)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) display_name: String,
}

#[derive(Deserialize, Debug)]
pub(super) struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) alg: i64,
}

/// Resolved shape of a "get credential" request. Read-only once built.
#[derive(Clone, Debug)]
pub struct UsageParameters {
    pub(super) relying_party: String,
    pub(super) challenge: String,
    pub(super) allowed_credential_ids: Vec<String>,
    pub(super) user_verification: Option<String>,
    pub(super) user_verified: bool,
    pub(super) client_data_hash: Option<Vec<u8>>,
    pub(super) caller: VerifiedOrigin,
}

impl UsageParameters {
    pub fn relying_party(&self) -> &str {
        &self.relying_party
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn allowed_credential_ids(&self) -> &[String] {
        &self.allowed_credential_ids
    }

    /// User verification requirement as stated by the relying party.
    pub fn user_verification(&self) -> Option<&str> {
        self.user_verification.as_deref()
    }

    pub fn caller(&self) -> &VerifiedOrigin {
        &self.caller
    }
}

/// Resolved shape of a "create credential" request, including the minted
/// credential id and public key. Read-only once built.
#[derive(Clone, Debug)]
pub struct CreationParameters {
    pub(super) relying_party: String,
    pub(super) relying_party_name: Option<String>,
    pub(super) user_handle: String,
    pub(super) user_name: String,
    pub(super) user_display_name: String,
    pub(super) challenge: String,
    pub(super) algorithms: Vec<i64>,
    pub(super) credential_id: String,
    pub(super) cose_public_key: Vec<u8>,
    pub(super) aaguid: Uuid,
    pub(super) user_verified: bool,
    pub(super) backup_eligibility: bool,
    pub(super) backup_state: bool,
    pub(super) client_data: ClientDataResponse,
    pub(super) caller: VerifiedOrigin,
}

impl CreationParameters {
    pub fn relying_party(&self) -> &str {
        &self.relying_party
    }

    pub fn relying_party_name(&self) -> Option<&str> {
        self.relying_party_name.as_deref()
    }

    pub fn user_handle(&self) -> &str {
        &self.user_handle
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn user_display_name(&self) -> &str {
        &self.user_display_name
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn algorithms(&self) -> &[i64] {
        &self.algorithms
    }

    pub fn credential_id(&self) -> &str {
        &self.credential_id
    }

    pub fn caller(&self) -> &VerifiedOrigin {
        &self.caller
    }
}

/// Signed assertion produced for a "get credential" request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionResponse {
    pub credential_id: String,
    /// Base64url encoded authenticator data.
    pub authenticator_data: String,
    /// Base64url encoded ASN.1 DER signature.
    pub signature: String,
    pub user_handle: String,
    /// Base64url encoded client data, absent when the caller supplied its own hash.
    pub client_data_json: Option<String>,
    pub signature_counter: u32,
}

/// Attestation produced for a "create credential" request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationResponse {
    pub credential_id: String,
    /// Base64url encoded CBOR attestation object.
    pub attestation_object: String,
    pub authenticator_data: String,
    pub client_data_json: Option<String>,
    pub public_key_algorithm: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyCredentialJson<'a, R: Serialize> {
    id: &'a str,
    raw_id: &'a str,
    #[serde(rename = "type")]
    type_: &'static str,
    authenticator_attachment: &'static str,
    response: R,
    client_extension_results: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssertionJson<'a> {
    #[serde(rename = "clientDataJSON", skip_serializing_if = "Option::is_none")]
    client_data_json: Option<&'a str>,
    authenticator_data: &'a str,
    signature: &'a str,
    user_handle: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationJson<'a> {
    #[serde(rename = "clientDataJSON", skip_serializing_if = "Option::is_none")]
    client_data_json: Option<&'a str>,
    attestation_object: &'a str,
    authenticator_data: &'a str,
    public_key_algorithm: i64,
    transports: [&'static str; 2],
}

impl AssertionResponse {
    /// Renders the platform `PublicKeyCredential` object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PublicKeyCredentialJson {
            id: &self.credential_id,
            raw_id: &self.credential_id,
            type_: "public-key",
            authenticator_attachment: "platform",
            response: AssertionJson {
                client_data_json: self.client_data_json.as_deref(),
                authenticator_data: &self.authenticator_data,
                signature: &self.signature,
                user_handle: &self.user_handle,
            },
            client_extension_results: serde_json::Map::new(),
        })
    }
}

impl AttestationResponse {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PublicKeyCredentialJson {
            id: &self.credential_id,
            raw_id: &self.credential_id,
            type_: "public-key",
            authenticator_attachment: "platform",
            response: AttestationJson {
                client_data_json: self.client_data_json.as_deref(),
                attestation_object: &self.attestation_object,
                authenticator_data: &self.authenticator_data,
                public_key_algorithm: self.public_key_algorithm,
                transports: ["internal", "hybrid"],
            },
            client_extension_results: serde_json::Map::new(),
        })
    }
}
