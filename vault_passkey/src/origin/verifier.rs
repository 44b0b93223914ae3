use serde::{Deserialize, Serialize};

use super::asset_links::{AssetSource, parse_asset_links, parse_privileged_apps};
use super::errors::OriginError;
use super::types::{AndroidOrigin, AppOrigin, WebOrigin};
use crate::utils::normalize_fingerprint;

/// What the platform reports about the app that issued a credential request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallingAppInfo {
    pub package_name: String,
    /// SHA-256 fingerprints of the caller's signing certificates, hex encoded.
    pub signing_fingerprints: Vec<String>,
    /// Web origin reported by a browser acting for a site.
    pub origin: Option<String>,
}

impl CallingAppInfo {
    pub fn native(package_name: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            signing_fingerprints: vec![fingerprint.into()],
            origin: None,
        }
    }

    pub fn browser(
        package_name: impl Into<String>,
        fingerprint: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::native(package_name, fingerprint)
        }
    }

    fn candidate(&self) -> Result<AppOrigin, OriginError> {
        let mut candidate = AppOrigin::new();
        for fingerprint in &self.signing_fingerprints {
            let fingerprint = normalize_fingerprint(fingerprint)
                .map_err(|e| OriginError::InvalidArgument(e.to_string()))?;
            candidate.add_android_origin(AndroidOrigin::new(
                self.package_name.clone(),
                Some(fingerprint),
            ));
        }
        if candidate.is_empty() {
            return Err(OriginError::Mismatch(format!(
                "{} presented no signing certificate",
                self.package_name
            )));
        }
        Ok(candidate)
    }
}

/// A caller identity that passed verification, with the string bound into client data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedOrigin {
    pub app_origin: AppOrigin,
    pub canonical: String,
}

/// Establishes who is calling on behalf of `relying_party`.
///
/// A browser reporting a web origin must be on the privileged allowlist and the
/// origin must belong to the relying party. A native app must be listed in the
/// relying party's asset links with the exact signing fingerprint.
pub async fn verify_calling_app(
    relying_party: &str,
    caller: &CallingAppInfo,
    assets: &dyn AssetSource,
) -> Result<VerifiedOrigin, OriginError> {
    let candidate = caller.candidate()?;

    match caller.origin.as_deref() {
        Some(origin) => {
            let privileged = parse_privileged_apps(&assets.privileged_apps().await?)?;
            let browser_origin = privileged.check_app_origin(&candidate)?;
            tracing::debug!(
                "Privileged browser {} ({}) reports origin {}",
                caller.package_name,
                browser_origin,
                origin
            );

            let fallback = candidate.android_origins()[0].clone();
            let app_origin = AppOrigin::classify(origin, fallback.clone())?;
            let canonical = match app_origin.web_origins().first() {
                Some(web_origin) => {
                    if !web_origin.matches_relying_party(relying_party) {
                        return Err(OriginError::Mismatch(format!(
                            "Origin {web_origin} does not belong to {relying_party}"
                        )));
                    }
                    web_origin.to_string()
                }
                None => fallback.to_android_origin()?,
            };

            Ok(VerifiedOrigin {
                app_origin: app_origin.into_verified(),
                canonical,
            })
        }
        None => {
            let site = WebOrigin::from_relying_party(relying_party)?;
            let trusted = parse_asset_links(&assets.asset_links(&site).await?)?;
            let canonical = trusted.check_app_origin(&candidate)?;

            let mut app_origin = AppOrigin::new();
            for android_origin in candidate.android_origins() {
                if trusted.android_origins().contains(android_origin) {
                    app_origin.add_android_origin(android_origin.clone());
                }
            }
            tracing::debug!("Verified {} for {}", canonical, relying_party);

            Ok(VerifiedOrigin {
                app_origin: app_origin.into_verified(),
                canonical,
            })
        }
    }
}
