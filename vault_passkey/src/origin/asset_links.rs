//! Digital Asset Links lookup
//!
//! A relying party proves which native apps may use its credentials by
//! publishing `/.well-known/assetlinks.json`. Browsers allowed to assert web
//! origins on behalf of a site are listed in a separate privileged allowlist.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use super::errors::OriginError;
use super::types::{AndroidOrigin, AppOrigin, WebOrigin};
use crate::config::ProviderConfig;
use crate::utils::normalize_fingerprint;

const GET_LOGIN_CREDS: &str = "delegate_permission/common.get_login_creds";
const ANDROID_APP_NAMESPACE: &str = "android_app";

/// Source of the documents used to establish trust in a caller.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Raw `assetlinks.json` published by `origin`.
    async fn asset_links(&self, origin: &WebOrigin) -> Result<String, OriginError>;

    /// Raw privileged-browser allowlist.
    async fn privileged_apps(&self) -> Result<String, OriginError>;
}

/// Fetches asset links over HTTPS and reads the privileged allowlist from disk.
pub struct HttpAssetSource {
    client: reqwest::Client,
    privileged_apps_file: Option<PathBuf>,
}

impl HttpAssetSource {
    pub fn new(config: &ProviderConfig) -> Result<Self, OriginError> {
        let client = reqwest::Client::builder()
            .timeout(config.asset_links_timeout)
            .build()
            .map_err(|e| OriginError::AssetLinks(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            privileged_apps_file: config.privileged_apps_file.clone(),
        })
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn asset_links(&self, origin: &WebOrigin) -> Result<String, OriginError> {
        let url = origin.asset_links_url();
        tracing::debug!("Fetching asset links from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OriginError::AssetLinks(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            tracing::error!("Asset links fetch failed with status: {}", response.status());
            return Err(OriginError::AssetLinks(format!(
                "HTTP status {} for {url}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| OriginError::AssetLinks(format!("Failed to read body: {e}")))
    }

    async fn privileged_apps(&self) -> Result<String, OriginError> {
        match &self.privileged_apps_file {
            Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                OriginError::AssetLinks(format!(
                    "Failed to read privileged apps {}: {e}",
                    path.display()
                ))
            }),
            None => {
                tracing::debug!("No privileged apps file configured");
                Ok(r#"{"apps":[]}"#.to_string())
            }
        }
    }
}

/// In-memory documents, keyed by origin.
#[derive(Debug, Clone)]
pub struct StaticAssetSource {
    asset_links: HashMap<String, String>,
    privileged_apps: String,
}

impl Default for StaticAssetSource {
    fn default() -> Self {
        Self {
            asset_links: HashMap::new(),
            privileged_apps: r#"{"apps":[]}"#.to_string(),
        }
    }
}

impl StaticAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_links(mut self, origin: &str, document: impl Into<String>) -> Self {
        self.asset_links
            .insert(origin.trim_end_matches('/').to_string(), document.into());
        self
    }

    pub fn with_privileged_apps(mut self, document: impl Into<String>) -> Self {
        self.privileged_apps = document.into();
        self
    }
}

#[async_trait]
impl AssetSource for StaticAssetSource {
    async fn asset_links(&self, origin: &WebOrigin) -> Result<String, OriginError> {
        self.asset_links
            .get(origin.as_str())
            .cloned()
            .ok_or_else(|| OriginError::AssetLinks(format!("No asset links for {origin}")))
    }

    async fn privileged_apps(&self) -> Result<String, OriginError> {
        Ok(self.privileged_apps.clone())
    }
}

#[derive(Deserialize, Debug)]
struct AssetStatement {
    #[serde(default)]
    relation: Vec<String>,
    target: AssetTarget,
}

#[derive(Deserialize, Debug)]
struct AssetTarget {
    namespace: String,
    package_name: Option<String>,
    #[serde(default)]
    sha256_cert_fingerprints: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct PrivilegedApps {
    #[serde(default)]
    apps: Vec<PrivilegedApp>,
}

#[derive(Deserialize, Debug)]
struct PrivilegedApp {
    #[serde(rename = "type")]
    type_: String,
    info: PrivilegedAppInfo,
}

#[derive(Deserialize, Debug)]
struct PrivilegedAppInfo {
    package_name: String,
    #[serde(default)]
    signatures: Vec<PrivilegedSignature>,
}

#[derive(Deserialize, Debug)]
struct PrivilegedSignature {
    #[serde(default)]
    build: Option<String>,
    cert_fingerprint_sha256: String,
}

/// Android apps an asset-link document authorises to use the site's credentials.
pub fn parse_asset_links(document: &str) -> Result<AppOrigin, OriginError> {
    let statements: Vec<AssetStatement> = serde_json::from_str(document)
        .map_err(|e| OriginError::AssetLinks(format!("Invalid assetlinks.json: {e}")))?;

    let mut trusted = AppOrigin::new();
    for statement in statements {
        if statement.target.namespace != ANDROID_APP_NAMESPACE
            || !statement.relation.iter().any(|r| r == GET_LOGIN_CREDS)
        {
            continue;
        }
        let Some(package_name) = statement.target.package_name else {
            continue;
        };
        for fingerprint in &statement.target.sha256_cert_fingerprints {
            push_normalized(&mut trusted, &package_name, fingerprint);
        }
    }

    tracing::debug!(
        "Asset links trust {} android origin(s)",
        trusted.android_origins().len()
    );
    Ok(trusted)
}

/// Browsers allowed to report the web origin they are acting for.
pub fn parse_privileged_apps(document: &str) -> Result<AppOrigin, OriginError> {
    let allowlist: PrivilegedApps = serde_json::from_str(document)
        .map_err(|e| OriginError::AssetLinks(format!("Invalid privileged allowlist: {e}")))?;

    let mut trusted = AppOrigin::new();
    for app in allowlist.apps.into_iter().filter(|a| a.type_ == "android") {
        for signature in &app.info.signatures {
            tracing::trace!(
                "Privileged {} build {:?}",
                app.info.package_name,
                signature.build
            );
            push_normalized(
                &mut trusted,
                &app.info.package_name,
                &signature.cert_fingerprint_sha256,
            );
        }
    }
    Ok(trusted)
}

fn push_normalized(trusted: &mut AppOrigin, package_name: &str, fingerprint: &str) {
    match normalize_fingerprint(fingerprint) {
        Ok(fingerprint) => {
            trusted.add_android_origin(AndroidOrigin::new(package_name, Some(fingerprint)))
        }
        Err(e) => tracing::warn!("Skipping fingerprint of {}: {}", package_name, e),
    }
}
