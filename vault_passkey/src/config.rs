use std::{env, path::PathBuf, time::Duration};

use uuid::Uuid;

/// How the provider reports user verification in authenticator data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

impl UserVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

/// Provider settings shared by every flow.
///
/// Values come from the environment through [`ProviderConfig::from_env`]; invalid
/// values are logged and replaced by their defaults.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Advertise new passkeys as eligible for backup (BE flag).
    pub backup_eligibility: bool,
    /// Advertise new passkeys as currently backed up (BS flag).
    pub backup_state: bool,
    /// Whether the UV flag is set. Unlocking the vault counts as verification.
    pub user_verification: UserVerification,
    /// AAGUID written into attested credential data.
    pub aaguid: Uuid,
    /// Timeout for fetching `/.well-known/assetlinks.json`.
    pub asset_links_timeout: Duration,
    /// JSON allowlist of browsers permitted to speak for web origins.
    pub privileged_apps_file: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backup_eligibility: true,
            backup_state: false,
            user_verification: UserVerification::Preferred,
            aaguid: Uuid::nil(),
            asset_links_timeout: Duration::from_secs(30),
            privileged_apps_file: None,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backup_eligibility: bool_var("PASSKEY_BACKUP_ELIGIBILITY", defaults.backup_eligibility),
            backup_state: bool_var("PASSKEY_BACKUP_STATE", defaults.backup_state),
            user_verification: match env::var("PASSKEY_USER_VERIFICATION").ok() {
                None => defaults.user_verification,
                Some(v) => match v.to_lowercase().as_str() {
                    "required" => UserVerification::Required,
                    "preferred" => UserVerification::Preferred,
                    "discouraged" => UserVerification::Discouraged,
                    invalid => {
                        tracing::warn!(
                            "Invalid user verification: {}. Using default 'preferred'",
                            invalid
                        );
                        defaults.user_verification
                    }
                },
            },
            aaguid: match env::var("PASSKEY_AAGUID").ok() {
                None => defaults.aaguid,
                Some(v) => Uuid::parse_str(v.trim()).unwrap_or_else(|e| {
                    tracing::warn!("Invalid PASSKEY_AAGUID {}: {}. Using nil AAGUID", v, e);
                    defaults.aaguid
                }),
            },
            asset_links_timeout: match env::var("ASSET_LINKS_TIMEOUT").ok() {
                None => defaults.asset_links_timeout,
                Some(v) => v.trim().parse::<u64>().map(Duration::from_secs).unwrap_or_else(|e| {
                    tracing::warn!(
                        "Invalid ASSET_LINKS_TIMEOUT {}: {}. Using default {:?}",
                        v,
                        e,
                        defaults.asset_links_timeout
                    );
                    defaults.asset_links_timeout
                }),
            },
            privileged_apps_file: env::var("PASSKEY_PRIVILEGED_APPS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

fn bool_var(name: &str, default: bool) -> bool {
    env::var(name).map_or(default, |v| match v.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        invalid => {
            tracing::warn!("Invalid {}: {}. Using default '{}'", name, invalid, default);
            default
        }
    })
}
