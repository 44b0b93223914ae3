use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::OriginError;
use crate::utils::fingerprint_to_url_safe_base64;

pub const RELYING_PARTY_DEFAULT_PROTOCOL: &str = "https";

const ANDROID_ORIGIN_PREFIX: &str = "android:apk-key-hash:";

/// Identity claimed by a caller: the apps that signed the request and the web
/// origins it speaks for.
///
/// `verified` is only ever set by the verifier after a trusted android origin
/// matched, so a value built by hand always starts unverified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AppOrigin {
    verified: bool,
    android_origins: Vec<AndroidOrigin>,
    web_origins: Vec<WebOrigin>,
}

impl AppOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub(crate) fn into_verified(mut self) -> Self {
        self.verified = true;
        self
    }

    pub fn android_origins(&self) -> &[AndroidOrigin] {
        &self.android_origins
    }

    pub fn web_origins(&self) -> &[WebOrigin] {
        &self.web_origins
    }

    pub fn add_android_origin(&mut self, android_origin: AndroidOrigin) {
        self.android_origins.push(android_origin);
    }

    pub fn add_web_origin(&mut self, web_origin: WebOrigin) {
        self.web_origins.push(web_origin);
    }

    pub fn with_android_origin(mut self, android_origin: AndroidOrigin) -> Self {
        self.add_android_origin(android_origin);
        self
    }

    pub fn with_web_origin(mut self, web_origin: WebOrigin) -> Self {
        self.add_web_origin(web_origin);
        self
    }

    /// Treats `self` as the trusted set and looks for an android origin of
    /// `candidate` with the same package name and fingerprint.
    ///
    /// Returns the canonical `android:apk-key-hash:` string of the first trusted
    /// origin that matched.
    pub fn check_app_origin(&self, candidate: &AppOrigin) -> Result<String, OriginError> {
        let matched = self.android_origins.iter().find(|trusted| {
            candidate.android_origins.iter().any(|other| {
                other.package_name == trusted.package_name
                    && other.fingerprint == trusted.fingerprint
            })
        });

        match matched {
            Some(origin) => origin.to_android_origin(),
            None => {
                tracing::warn!(
                    "No trusted signature for {}",
                    candidate.to_name().unwrap_or("unknown caller")
                );
                Err(OriginError::Mismatch(format!(
                    "Wrong signature for {}",
                    candidate.to_name().unwrap_or("unknown caller")
                )))
            }
        }
    }

    /// Decides whether `origin` names a web page or a native app.
    ///
    /// Anything outside the trusted web scheme is treated as an unknown source and
    /// the caller is recorded as `fallback` instead. An origin in the web scheme
    /// that does not parse is an error, never a fallback.
    pub fn classify(origin: &str, fallback: AndroidOrigin) -> Result<Self, OriginError> {
        let mut app_origin = Self::new();
        if origin.starts_with(RELYING_PARTY_DEFAULT_PROTOCOL) {
            let web_origin = WebOrigin::new(origin).map_err(|e| {
                OriginError::Mismatch(format!("Malformed web origin {origin}: {e}"))
            })?;
            app_origin.add_web_origin(web_origin);
        } else {
            tracing::warn!("Unknown verified origin {}", origin);
            app_origin.add_android_origin(fallback);
        }
        Ok(app_origin)
    }

    pub fn clear(&mut self) {
        self.android_origins.clear();
        self.web_origins.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.android_origins.is_empty() && self.web_origins.is_empty()
    }

    pub fn to_name(&self) -> Option<&str> {
        if let Some(android_origin) = self.android_origins.first() {
            Some(&android_origin.package_name)
        } else {
            self.web_origins.first().map(|web| web.as_str())
        }
    }
}

/// A native app identified by its package name and the SHA-256 fingerprint of
/// its signing certificate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AndroidOrigin {
    pub package_name: String,
    pub fingerprint: Option<String>,
}

impl AndroidOrigin {
    pub fn new(package_name: impl Into<String>, fingerprint: Option<String>) -> Self {
        Self {
            package_name: package_name.into(),
            fingerprint,
        }
    }

    /// Builds `android:apk-key-hash:<base64url>` from the hex fingerprint.
    pub fn to_android_origin(&self) -> Result<String, OriginError> {
        let fingerprint = self.fingerprint.as_deref().ok_or_else(|| {
            OriginError::InvalidArgument(format!(
                "Fingerprint of {} cannot be null",
                self.package_name
            ))
        })?;
        let encoded = fingerprint_to_url_safe_base64(fingerprint)
            .map_err(|e| OriginError::InvalidArgument(e.to_string()))?;
        Ok(format!("{ANDROID_ORIGIN_PREFIX}{encoded}"))
    }
}

impl fmt::Display for AndroidOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.package_name,
            self.fingerprint.as_deref().unwrap_or("null")
        )
    }
}

/// A `https://host[:port]` origin.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WebOrigin {
    origin: String,
}

impl WebOrigin {
    pub fn new(origin: &str) -> Result<Self, OriginError> {
        let scheme_prefix = format!("{RELYING_PARTY_DEFAULT_PROTOCOL}://");
        if !origin.starts_with(&scheme_prefix) {
            return Err(OriginError::InvalidArgument(format!(
                "Origin {origin} does not use the {RELYING_PARTY_DEFAULT_PROTOCOL} scheme"
            )));
        }
        let parsed = Url::parse(origin)
            .map_err(|e| OriginError::InvalidArgument(format!("Invalid origin {origin}: {e}")))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(OriginError::InvalidArgument(format!(
                "Origin {origin} has no host"
            )));
        }
        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_relying_party(relying_party: &str) -> Result<Self, OriginError> {
        Self::new(&format!("{RELYING_PARTY_DEFAULT_PROTOCOL}://{relying_party}"))
    }

    pub fn as_str(&self) -> &str {
        &self.origin
    }

    pub fn asset_links_url(&self) -> String {
        format!("{}/.well-known/assetlinks.json", self.origin)
    }

    /// True when the origin's host is the relying party id or one of its subdomains.
    pub fn matches_relying_party(&self, relying_party: &str) -> bool {
        let Ok(parsed) = Url::parse(&self.origin) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let relying_party = relying_party.to_ascii_lowercase();
        !relying_party.is_empty()
            && (host == relying_party || host.ends_with(&format!(".{relying_party}")))
    }
}

impl fmt::Display for WebOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin)
    }
}
