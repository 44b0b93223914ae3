use super::authenticator::{
    attested_credential_data, authenticator_data, flags, none_attestation_object,
};
use super::client_data::{ClientDataResponse, ClientDataType};
use super::errors::PasskeyError;
use super::keys::{COSE_ALG_ES256, cose_encode_es256, generate_es256_key, sign_es256};
use super::types::{
    AssertionResponse, AttestationResponse, CreateCredentialRequest, CreationOptionsJson,
    CreationParameters, GetCredentialRequest, Passkey, RequestOptionsJson, UsageParameters,
};
use crate::config::{ProviderConfig, UserVerification};
use crate::origin::{AppOrigin, AssetSource, VerifiedOrigin, WebOrigin, verify_calling_app};
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes};

const PUBLIC_KEY_TYPE: &str = "public-key";
const CREDENTIAL_ID_LEN: usize = 16;

/// Parses a "get credential" request and establishes who is asking.
///
/// A non-empty `app_origin` is the identity the caller was previously known
/// under and must agree with the freshly verified one.
#[tracing::instrument(skip_all, fields(package = %request.calling_app.package_name))]
pub async fn resolve_usage_parameters(
    request: &GetCredentialRequest,
    assets: &dyn AssetSource,
    app_origin: &AppOrigin,
    config: &ProviderConfig,
) -> Result<UsageParameters, PasskeyError> {
    let options: RequestOptionsJson = serde_json::from_str(&request.request_json)
        .map_err(|e| PasskeyError::MalformedRequest(format!("Invalid request options: {e}")))?;

    let relying_party = required_relying_party(options.rp_id)?;
    let challenge = required(options.challenge, "challenge")?;
    let allowed_credential_ids = options
        .allow_credentials
        .into_iter()
        .filter(|c| c.type_.as_deref().is_none_or(|t| t == PUBLIC_KEY_TYPE))
        .map(|c| c.id)
        .collect();

    let caller = verify_calling_app(&relying_party, &request.calling_app, assets).await?;
    if !app_origin.is_empty() {
        ensure_same_caller(&caller, app_origin, &relying_party)?;
    }
    tracing::debug!("Usage parameters resolved for {}", caller.canonical);

    Ok(UsageParameters {
        relying_party,
        challenge,
        allowed_credential_ids,
        user_verification: options.user_verification,
        user_verified: config.user_verification != UserVerification::Discouraged,
        client_data_hash: request.client_data_hash.clone(),
        caller,
    })
}

/// Parses a "create credential" request and mints the passkey that will be
/// offered for registration.
#[tracing::instrument(skip_all, fields(package = %request.calling_app.package_name))]
pub async fn resolve_creation_parameters(
    request: &CreateCredentialRequest,
    assets: &dyn AssetSource,
    config: &ProviderConfig,
) -> Result<(Passkey, AppOrigin, CreationParameters), PasskeyError> {
    let options: CreationOptionsJson = serde_json::from_str(&request.request_json)
        .map_err(|e| PasskeyError::MalformedRequest(format!("Invalid creation options: {e}")))?;

    let rp = options
        .rp
        .ok_or_else(|| PasskeyError::MalformedRequest("Missing relying party".to_string()))?;
    let relying_party = required_relying_party(rp.id)?;
    let user = options
        .user
        .ok_or_else(|| PasskeyError::MalformedRequest("Missing user".to_string()))?;
    let user_handle = required(user.id, "user id")?;
    base64url_decode(&user_handle).map_err(|_| {
        PasskeyError::MalformedRequest("User id is not base64url encoded".to_string())
    })?;
    let challenge = required(options.challenge, "challenge")?;

    let algorithms: Vec<i64> = options
        .pub_key_cred_params
        .iter()
        .filter(|p| p.type_ == PUBLIC_KEY_TYPE)
        .map(|p| p.alg)
        .collect();
    if !options.pub_key_cred_params.is_empty() && !algorithms.contains(&COSE_ALG_ES256) {
        return Err(PasskeyError::MalformedRequest(format!(
            "unsupported algorithm: {algorithms:?}"
        )));
    }

    let credential_id = base64url_encode(&gen_random_bytes(CREDENTIAL_ID_LEN)?);
    let key = generate_es256_key()?;
    let cose_public_key = cose_encode_es256(&key.public_key)?;
    let passkey = Passkey {
        username: user.name.clone(),
        private_key: base64url_encode(&key.pkcs8),
        credential_id: credential_id.clone(),
        user_handle: user_handle.clone(),
        relying_party: relying_party.clone(),
        signature_counter: 0,
        backup_eligibility: Some(config.backup_eligibility),
        backup_state: Some(config.backup_state),
    };

    let caller = verify_calling_app(&relying_party, &request.calling_app, assets).await?;
    let client_data = ClientDataResponse::for_request(
        request.client_data_hash.as_deref(),
        ClientDataType::Create,
        &challenge,
        &caller.canonical,
        android_package_name(&caller),
    )?;
    tracing::debug!(
        "Minted credential {} for {} on behalf of {}",
        credential_id,
        relying_party,
        caller.canonical
    );

    let parameters = CreationParameters {
        relying_party,
        relying_party_name: rp.name,
        user_handle,
        user_name: user.name,
        user_display_name: user.display_name,
        challenge,
        algorithms,
        credential_id,
        cose_public_key,
        aaguid: config.aaguid,
        user_verified: config.user_verification != UserVerification::Discouraged,
        backup_eligibility: config.backup_eligibility,
        backup_state: config.backup_state,
        client_data,
        caller: caller.clone(),
    };

    Ok((passkey, caller.app_origin, parameters))
}

/// Signs an assertion with `passkey` after checking it may answer this request.
///
/// `app_origin` is the identity recorded with the chosen entry. A native
/// caller must match it exactly; a web caller must match it when present and
/// always belong to the relying party.
pub fn build_verified_assertion_response(
    usage: &UsageParameters,
    app_origin: &AppOrigin,
    passkey: &Passkey,
) -> Result<AssertionResponse, PasskeyError> {
    if passkey.relying_party != usage.relying_party {
        tracing::error!(
            "Passkey for {} offered to {}",
            passkey.relying_party,
            usage.relying_party
        );
        return Err(PasskeyError::Security(format!(
            "Passkey is not bound to {}",
            usage.relying_party
        )));
    }
    if !usage.allowed_credential_ids.is_empty()
        && !usage.allowed_credential_ids.contains(&passkey.credential_id)
    {
        return Err(PasskeyError::Security(
            "Credential is not allowed by the request".to_string(),
        ));
    }

    let origin = ensure_same_caller(&usage.caller, app_origin, &usage.relying_party)?;
    let client_data = ClientDataResponse::for_request(
        usage.client_data_hash.as_deref(),
        ClientDataType::Get,
        &usage.challenge,
        &origin,
        android_package_name(&usage.caller),
    )?;

    let signature_counter = passkey.signature_counter.saturating_add(1);
    let auth_data = authenticator_data(
        &usage.relying_party,
        flags(
            usage.user_verified,
            passkey.backup_eligibility.unwrap_or(false),
            passkey.backup_state.unwrap_or(false),
        ),
        signature_counter,
        None,
    );

    let pkcs8 = base64url_decode(&passkey.private_key)?;
    let mut signed_data = auth_data.clone();
    signed_data.extend_from_slice(&client_data.hash());
    let signature = sign_es256(&pkcs8, &signed_data)?;

    tracing::debug!(
        "Signed assertion for {} with counter {}",
        passkey.credential_id,
        signature_counter
    );

    Ok(AssertionResponse {
        credential_id: passkey.credential_id.clone(),
        authenticator_data: base64url_encode(&auth_data),
        signature: base64url_encode(&signature),
        user_handle: passkey.user_handle.clone(),
        client_data_json: client_data.json_base64(),
        signature_counter,
    })
}

/// Packs the minted credential into a "none" attestation.
pub fn build_attestation_response(
    parameters: &CreationParameters,
) -> Result<AttestationResponse, PasskeyError> {
    let credential_id = base64url_decode(&parameters.credential_id)?;
    let attested = attested_credential_data(
        &parameters.aaguid,
        &credential_id,
        &parameters.cose_public_key,
    )?;
    let auth_data = authenticator_data(
        &parameters.relying_party,
        flags(
            parameters.user_verified,
            parameters.backup_eligibility,
            parameters.backup_state,
        ),
        0,
        Some(&attested),
    );
    let attestation_object = none_attestation_object(auth_data.clone())?;

    Ok(AttestationResponse {
        credential_id: parameters.credential_id.clone(),
        attestation_object: base64url_encode(&attestation_object),
        authenticator_data: base64url_encode(&auth_data),
        client_data_json: parameters.client_data.json_base64(),
        public_key_algorithm: COSE_ALG_ES256,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, PasskeyError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PasskeyError::MalformedRequest(format!("Missing {field}")))
}

fn required_relying_party(value: Option<String>) -> Result<String, PasskeyError> {
    let relying_party = required(value, "relying party id")?;
    WebOrigin::from_relying_party(&relying_party)
        .map_err(|e| PasskeyError::MalformedRequest(e.to_string()))?;
    Ok(relying_party)
}

/// Returns the origin to bind into client data once `claimed` agrees with the
/// verified caller.
fn ensure_same_caller(
    caller: &VerifiedOrigin,
    claimed: &AppOrigin,
    relying_party: &str,
) -> Result<String, PasskeyError> {
    match caller.app_origin.web_origins().first() {
        Some(web_origin) => {
            if !web_origin.matches_relying_party(relying_party) {
                return Err(PasskeyError::Security(format!(
                    "Origin {web_origin} does not belong to {relying_party}"
                )));
            }
            if !claimed.is_empty() && !claimed.web_origins().contains(web_origin) {
                return Err(PasskeyError::Security(format!(
                    "Origin {web_origin} does not match {}",
                    claimed.to_name().unwrap_or("the selected entry")
                )));
            }
            Ok(web_origin.to_string())
        }
        None => Ok(caller.app_origin.check_app_origin(claimed)?),
    }
}

fn android_package_name(caller: &VerifiedOrigin) -> Option<&str> {
    if caller.app_origin.web_origins().is_empty() {
        caller
            .app_origin
            .android_origins()
            .first()
            .map(|o| o.package_name.as_str())
    } else {
        None
    }
}
