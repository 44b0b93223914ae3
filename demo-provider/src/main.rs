use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_passkey::{
    CallingAppInfo, CreateCredentialRequest, CredentialProvider, GetCredentialRequest,
    ProviderConfig, ProviderRequest, ProviderResponse, StaticAssetSource,
};

mod ports;

use crate::ports::{AutoPicker, MemoryVault};

const RP_ID: &str = "example.com";
const DEMO_PACKAGE: &str = "com.example.demo";
const DEMO_FINGERPRINT: &str = "B3:14:C8:0A:9E:11:3F:42:77:D5:60:1B:CE:08:9A:21:F4:6D:3C:95";

fn demo_assets() -> StaticAssetSource {
    StaticAssetSource::new().with_asset_links(
        "https://example.com",
        json!([{
            "relation": ["delegate_permission/common.get_login_creds"],
            "target": {
                "namespace": "android_app",
                "package_name": DEMO_PACKAGE,
                "sha256_cert_fingerprints": [DEMO_FINGERPRINT]
            }
        }])
        .to_string(),
    )
}

fn report(step: &str, response: &ProviderResponse) -> Result<(), Box<dyn std::error::Error>> {
    match response {
        ProviderResponse::Assertion(assertion) => {
            println!("{step}: assertion\n{}", assertion.to_json()?)
        }
        ProviderResponse::Attestation(attestation) => {
            println!("{step}: attestation\n{}", attestation.to_json()?)
        }
        ProviderResponse::Registered => println!("{step}: registered"),
        ProviderResponse::Cancelled { kind, notice } => {
            println!("{step}: cancelled ({kind:?}): {notice}")
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_provider=debug,vault_passkey=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProviderConfig::from_env();
    tracing::debug!("Provider config: {:?}", config);

    let vault = MemoryVault::new("Demo vault");
    let provider = CredentialProvider::new(
        vault.clone(),
        Arc::new(AutoPicker::new(vault.clone())),
        Arc::new(demo_assets()),
        config,
    )?;
    let caller = CallingAppInfo::native(DEMO_PACKAGE, DEMO_FINGERPRINT);

    let registration = ProviderRequest::registration(CreateCredentialRequest {
        request_json: json!({
            "rp": {"id": RP_ID, "name": "Example"},
            "user": {"id": "ZGVtby11c2Vy", "name": "demo@example.com", "displayName": "Demo"},
            "challenge": "ZGVtby1yZWdpc3RyYXRpb24",
            "pubKeyCredParams": [{"type": "public-key", "alg": -7}]
        })
        .to_string(),
        client_data_hash: None,
        calling_app: caller.clone(),
    });
    report("Registration", &provider.handle(&registration).await)?;

    let get_request = GetCredentialRequest {
        request_json: json!({
            "rpId": RP_ID,
            "challenge": "ZGVtby1hc3NlcnRpb24",
            "userVerification": "preferred"
        })
        .to_string(),
        client_data_hash: None,
        calling_app: caller,
    };
    let selection = ProviderRequest::selection(get_request.clone());
    report("Selection", &provider.handle(&selection).await)?;

    if let Some(node_id) = vault.first_entry_id().await {
        let relaunch = ProviderRequest::selection(get_request)
            .with_node_id(node_id, provider.provenance_key())?;
        report("Auto selection", &provider.handle(&relaunch).await)?;
    }

    Ok(())
}
