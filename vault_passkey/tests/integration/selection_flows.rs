use uuid::Uuid;
use vault_passkey::{
    AndroidOrigin, AppOrigin, CallingAppInfo, ErrorKind, LaunchMode, PendingOperation,
    ProviderRequest, ProviderResponse, SelectionFlow, SelectionResult, SelectionState, WebOrigin,
};

use crate::common::*;

fn app_origin() -> AppOrigin {
    AppOrigin::new().with_android_origin(AndroidOrigin::new(
        APP_PACKAGE,
        Some(APP_FINGERPRINT.to_string()),
    ))
}

fn web_app_origin() -> AppOrigin {
    AppOrigin::new().with_web_origin(WebOrigin::new("https://example.com").unwrap())
}

/// Closed vault: the user opens it, picks the passkey registered through the
/// browser, and the assertion is bound to the site and that credential.
#[tokio::test]
async fn test_selection_from_closed_vault_through_browser() {
    let setup = TestProvider::open();
    let registered = setup
        .provider
        .handle(&ProviderRequest::registration(create_request(browser_caller())))
        .await;
    let ProviderResponse::Attestation(attestation) = registered else {
        panic!("Registration failed: {registered:?}");
    };
    let passkey = setup.vault.entries().await[0].passkey.clone().unwrap();
    setup.vault.set_open(false).await;

    let request = ProviderRequest::selection(get_request(browser_caller()));
    let mut flow = SelectionFlow::new(&setup.provider);
    let response = flow.run(&request).await.expect("Selection failed");

    assert_eq!(flow.state(), SelectionState::Done);
    assert_eq!(flow.pending(), PendingOperation::None);
    assert_eq!(
        setup.picker.calls().await,
        vec!["manual_registration", "open_vault", "manual_selection"]
    );

    assert_eq!(response.credential_id, attestation.credential_id);
    assert_eq!(response.credential_id, passkey.credential_id);
    assert_eq!(response.user_handle, passkey.user_handle);
    assert_eq!(response.signature_counter, 1);

    let client_data = client_data(&response);
    assert_eq!(client_data["type"], "webauthn.get");
    assert_eq!(client_data["origin"], "https://example.com");
    assert_eq!(client_data["challenge"], "dGVzdC1jaGFsbGVuZ2U");
    assert_signature_valid(&passkey, &response);
}

#[tokio::test]
async fn test_selection_for_native_app() {
    let setup = TestProvider::open();
    let passkey = stored_passkey("alice");
    setup
        .vault
        .insert(Some(passkey.clone()), Some(app_origin()))
        .await;

    let response = setup
        .provider
        .handle(&ProviderRequest::selection(get_request(native_caller())))
        .await;
    let ProviderResponse::Assertion(response) = response else {
        panic!("Selection failed: {response:?}");
    };

    assert_eq!(response.signature_counter, passkey.signature_counter + 1);
    let client_data = client_data(&response);
    assert!(
        client_data["origin"]
            .as_str()
            .unwrap()
            .starts_with("android:apk-key-hash:")
    );
    assert_eq!(client_data["androidPackageName"], APP_PACKAGE);
    assert_signature_valid(&passkey, &response);

    // Hits during selection are logged, the user still chooses.
    assert_eq!(setup.picker.calls().await, vec!["manual_selection"]);
}

#[tokio::test]
async fn test_auto_selection_by_node_id() {
    let setup = TestProvider::open();
    let passkey = stored_passkey("alice");
    let node_id = setup
        .vault
        .insert(Some(passkey.clone()), Some(app_origin()))
        .await;
    let request = ProviderRequest::selection(get_request(native_caller()))
        .with_node_id(node_id, setup.provider.provenance_key())
        .unwrap();

    let mut flow = SelectionFlow::new(&setup.provider);
    let response = flow.run(&request).await.expect("Selection failed");

    assert_eq!(flow.state(), SelectionState::Done);
    assert!(setup.picker.calls().await.is_empty());
    assert_eq!(response.credential_id, passkey.credential_id);
    assert_signature_valid(&passkey, &response);
}

#[tokio::test]
async fn test_auto_selection_on_entry_without_passkey() {
    let setup = TestProvider::open();
    let node_id = setup.vault.insert(None, Some(app_origin())).await;
    let request = ProviderRequest::selection(get_request(native_caller()))
        .with_node_id(node_id, setup.provider.provenance_key())
        .unwrap();

    let mut flow = SelectionFlow::new(&setup.provider);
    let err = flow.run(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(flow.state(), SelectionState::Failed);
    assert!(setup.picker.calls().await.is_empty());

    assert_eq!(
        setup.provider.handle(&request).await,
        ProviderResponse::Cancelled {
            kind: ErrorKind::NotFound,
            notice: "Unknown credential".to_string(),
        }
    );
}

#[tokio::test]
async fn test_auto_selection_on_unknown_entry() {
    let setup = TestProvider::open();
    let request = ProviderRequest::selection(get_request(native_caller()))
        .with_node_id(Uuid::new_v4(), setup.provider.provenance_key())
        .unwrap();

    let response = setup.provider.handle(&request).await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::NotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn test_auto_selection_with_forged_provenance() {
    let setup = TestProvider::open();
    let node_id = setup
        .vault
        .insert(Some(stored_passkey("alice")), Some(app_origin()))
        .await;
    let mut request = ProviderRequest::selection(get_request(native_caller()));
    request.node_id = Some(node_id);
    request.auth_code = Some("Zm9yZ2Vk".to_string());

    let mut flow = SelectionFlow::new(&setup.provider);
    let err = flow.run(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Security);
    assert_eq!(flow.state(), SelectionState::Failed);
}

#[tokio::test]
async fn test_auto_selection_code_from_other_provider() {
    let setup = TestProvider::open();
    let other = TestProvider::open();
    let node_id = setup
        .vault
        .insert(Some(stored_passkey("alice")), Some(app_origin()))
        .await;
    let request = ProviderRequest::selection(get_request(native_caller()))
        .with_node_id(node_id, other.provider.provenance_key())
        .unwrap();

    let response = setup.provider.handle(&request).await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::Security,
            ..
        }
    ));
}

/// An entry created for one app cannot answer another app.
#[tokio::test]
async fn test_auto_selection_rejects_entry_of_other_app() {
    let setup = TestProvider::open();
    let foreign = AppOrigin::new().with_android_origin(AndroidOrigin::new(
        "com.example.other",
        Some(APP_FINGERPRINT.to_string()),
    ));
    let node_id = setup
        .vault
        .insert(Some(stored_passkey("alice")), Some(foreign))
        .await;
    let request = ProviderRequest::selection(get_request(native_caller()))
        .with_node_id(node_id, setup.provider.provenance_key())
        .unwrap();

    let mut flow = SelectionFlow::new(&setup.provider);
    let err = flow.run(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
}

#[tokio::test]
async fn test_selection_from_untrusted_app() {
    let setup = TestProvider::open();
    setup
        .vault
        .insert(Some(stored_passkey("alice")), Some(app_origin()))
        .await;
    let caller = CallingAppInfo::native("com.example.evil", APP_FINGERPRINT);

    let mut flow = SelectionFlow::new(&setup.provider);
    let err = flow
        .run(&ProviderRequest::selection(get_request(caller)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Security);
    assert!(setup.picker.calls().await.is_empty());
}

#[tokio::test]
async fn test_selection_from_unprivileged_browser() {
    let setup = TestProvider::open();
    let caller = CallingAppInfo::browser("com.shady.browser", "AB:CD", "https://example.com");

    let response = setup
        .provider
        .handle(&ProviderRequest::selection(get_request(caller)))
        .await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::Security,
            ..
        }
    ));
}

#[tokio::test]
async fn test_selection_cancelled_by_user() {
    let vault = InMemoryVault::new(true);
    let picker = ScriptedPicker::new(vault.clone()).with_selection(SelectionScript::Cancel);
    let setup = TestProvider::new(vault, picker);

    let mut flow = SelectionFlow::new(&setup.provider);
    let err = flow
        .run(&ProviderRequest::selection(get_request(native_caller())))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedRequest);
    assert_eq!(flow.state(), SelectionState::Failed);
    assert_eq!(flow.pending(), PendingOperation::None);
}

#[tokio::test]
async fn test_selection_result_without_app_origin() {
    let vault = InMemoryVault::new(true);
    let picker =
        ScriptedPicker::new(vault.clone()).with_selection(SelectionScript::Fixed(SelectionResult {
            passkey: Some(stored_passkey("alice")),
            app_origin: None,
        }));
    let setup = TestProvider::new(vault, picker);

    let response = setup
        .provider
        .handle(&ProviderRequest::selection(get_request(native_caller())))
        .await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::MalformedRequest,
            ..
        }
    ));
}

#[tokio::test]
async fn test_selection_of_passkey_for_other_site() {
    let mut passkey = stored_passkey("alice");
    passkey.relying_party = "other.com".to_string();
    let vault = InMemoryVault::new(true);
    let picker =
        ScriptedPicker::new(vault.clone()).with_selection(SelectionScript::Fixed(SelectionResult {
            passkey: Some(passkey),
            app_origin: Some(web_app_origin()),
        }));
    let setup = TestProvider::new(vault, picker);

    let response = setup
        .provider
        .handle(&ProviderRequest::selection(get_request(browser_caller())))
        .await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::Security,
            ..
        }
    ));
}

#[tokio::test]
async fn test_privileged_browser_with_client_data_hash() {
    let passkey = stored_passkey("alice");
    let vault = InMemoryVault::new(true);
    vault
        .insert(Some(passkey.clone()), Some(web_app_origin()))
        .await;
    let setup = TestProvider::new(vault.clone(), ScriptedPicker::new(vault));

    let mut get = get_request(browser_caller());
    get.client_data_hash = Some(vec![0x5a; 32]);
    let response = setup
        .provider
        .handle(&ProviderRequest::selection(get))
        .await;

    let ProviderResponse::Assertion(response) = response else {
        panic!("Selection failed: {response:?}");
    };
    assert!(response.client_data_json.is_none());
    let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
    assert!(json["response"].get("clientDataJSON").is_none());
}

#[tokio::test]
async fn test_claimed_origin_must_match_caller() {
    let setup = TestProvider::open();
    let request =
        ProviderRequest::selection(get_request(native_caller())).with_app_origin(web_app_origin());

    let response = setup.provider.handle(&request).await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::Security,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unsupported_modes() {
    let setup = TestProvider::open();

    for mode in [LaunchMode::Default, LaunchMode::Search] {
        let mut request = ProviderRequest::selection(get_request(native_caller()));
        request.mode = mode;
        assert_eq!(
            setup.provider.handle(&request).await,
            ProviderResponse::Cancelled {
                kind: ErrorKind::UnsupportedMode,
                notice: ErrorKind::UnsupportedMode.notice().to_string(),
            }
        );
    }
    assert!(setup.picker.calls().await.is_empty());
}

#[tokio::test]
async fn test_selection_without_get_request() {
    let setup = TestProvider::open();
    let mut request = ProviderRequest::selection(get_request(native_caller()));
    request.get_request = None;

    let response = setup.provider.handle(&request).await;
    assert!(matches!(
        response,
        ProviderResponse::Cancelled {
            kind: ErrorKind::MalformedRequest,
            ..
        }
    ));
}

#[tokio::test]
async fn test_selection_flow_runs_once() {
    let setup = TestProvider::open();
    setup
        .vault
        .insert(Some(stored_passkey("alice")), Some(app_origin()))
        .await;
    let request = ProviderRequest::selection(get_request(native_caller()));

    let mut flow = SelectionFlow::new(&setup.provider);
    flow.run(&request).await.unwrap();
    assert!(flow.run(&request).await.is_err());
    assert_eq!(flow.state(), SelectionState::Done);
}
