use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair,
    UnparsedPublicKey,
};
use serde_json::json;
use vault_passkey::{
    AssertionResponse, CallingAppInfo, CreateCredentialRequest, GetCredentialRequest, Passkey,
    StaticAssetSource,
};

pub const RP_ID: &str = "example.com";
pub const APP_PACKAGE: &str = "com.example.app";
pub const APP_FINGERPRINT: &str = "91:F7:CB:F9:D6:81:53:1B:C7:A5:8F:B8:33:CC:A1:4D:AB:ED:E5:09";
pub const BROWSER_PACKAGE: &str = "com.android.chrome";
pub const BROWSER_FINGERPRINT: &str = "F0:FD:6C:5B:41:0F:25:CB:25:C3:B5:33:46:C8:97:2F:AE:30:F8:EE";

/// Asset links for example.com trusting the test app, and an allowlist with one browser.
pub fn asset_source() -> StaticAssetSource {
    StaticAssetSource::new()
        .with_asset_links(
            "https://example.com",
            json!([{
                "relation": [
                    "delegate_permission/common.handle_all_urls",
                    "delegate_permission/common.get_login_creds"
                ],
                "target": {
                    "namespace": "android_app",
                    "package_name": APP_PACKAGE,
                    "sha256_cert_fingerprints": [APP_FINGERPRINT]
                }
            }])
            .to_string(),
        )
        .with_privileged_apps(
            json!({"apps": [{
                "type": "android",
                "info": {
                    "package_name": BROWSER_PACKAGE,
                    "signatures": [{"build": "release", "cert_fingerprint_sha256": BROWSER_FINGERPRINT}]
                }
            }]})
            .to_string(),
        )
}

pub fn native_caller() -> CallingAppInfo {
    CallingAppInfo::native(APP_PACKAGE, APP_FINGERPRINT)
}

pub fn browser_caller() -> CallingAppInfo {
    CallingAppInfo::browser(BROWSER_PACKAGE, BROWSER_FINGERPRINT, "https://example.com")
}

pub fn get_request(calling_app: CallingAppInfo) -> GetCredentialRequest {
    GetCredentialRequest {
        request_json: json!({
            "rpId": RP_ID,
            "challenge": "dGVzdC1jaGFsbGVuZ2U",
            "allowCredentials": [],
            "userVerification": "preferred"
        })
        .to_string(),
        client_data_hash: None,
        calling_app,
    }
}

pub fn create_request(calling_app: CallingAppInfo) -> CreateCredentialRequest {
    CreateCredentialRequest {
        request_json: json!({
            "rp": {"id": RP_ID, "name": "Example"},
            "user": {"id": "dXNlci0xMjM", "name": "alice@example.com", "displayName": "Alice"},
            "challenge": "cmVnaXN0ZXItY2hhbGxlbmdl",
            "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
            "authenticatorSelection": {"residentKey": "required"}
        })
        .to_string(),
        client_data_hash: None,
        calling_app,
    }
}

/// A passkey for example.com with a freshly generated key.
pub fn stored_passkey(username: &str) -> Passkey {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
        .expect("Failed to generate key");
    let id: [u8; 16] = rand_id();

    Passkey {
        username: username.to_string(),
        private_key: URL_SAFE_NO_PAD.encode(pkcs8.as_ref()),
        credential_id: URL_SAFE_NO_PAD.encode(id),
        user_handle: URL_SAFE_NO_PAD.encode(username.as_bytes()),
        relying_party: RP_ID.to_string(),
        signature_counter: 3,
        backup_eligibility: Some(true),
        backup_state: Some(false),
    }
}

fn rand_id() -> [u8; 16] {
    *uuid::Uuid::new_v4().as_bytes()
}

pub fn decode(value: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD.decode(value).expect("Failed to decode base64url")
}

/// Client data JSON of a locally built assertion, parsed.
pub fn client_data(response: &AssertionResponse) -> serde_json::Value {
    let raw = decode(
        response
            .client_data_json
            .as_deref()
            .expect("Assertion carries no client data"),
    );
    serde_json::from_slice(&raw).expect("Client data is not JSON")
}

/// Checks the assertion signature against the passkey's public key over
/// `authenticatorData || SHA-256(clientDataJSON)`.
pub fn assert_signature_valid(passkey: &Passkey, response: &AssertionResponse) {
    let key_pair = EcdsaKeyPair::from_pkcs8(
        &ECDSA_P256_SHA256_ASN1_SIGNING,
        &decode(&passkey.private_key),
        &SystemRandom::new(),
    )
    .expect("Passkey holds an invalid private key");

    let client_data_json = decode(response.client_data_json.as_deref().unwrap_or_default());
    let mut signed = decode(&response.authenticator_data);
    signed.extend_from_slice(digest::digest(&digest::SHA256, &client_data_json).as_ref());

    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, key_pair.public_key().as_ref())
        .verify(&signed, &decode(&response.signature))
        .expect("Assertion signature does not verify");
}
