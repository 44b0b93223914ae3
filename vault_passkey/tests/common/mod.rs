pub mod fixtures;
pub mod mock_ports;

use std::sync::{Arc, Once};

pub use fixtures::*;
pub use mock_ports::{InMemoryVault, RegistrationScript, ScriptedPicker, SelectionScript};

use vault_passkey::{CredentialProvider, ProviderConfig};

/// Loads `.env_test` once and reads the provider configuration from it.
pub fn test_config() -> ProviderConfig {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
    ProviderConfig::from_env()
}

pub struct TestProvider {
    pub provider: CredentialProvider,
    pub vault: Arc<InMemoryVault>,
    pub picker: Arc<ScriptedPicker>,
}

impl TestProvider {
    pub fn new(vault: Arc<InMemoryVault>, picker: ScriptedPicker) -> Self {
        let picker = Arc::new(picker);
        let provider = CredentialProvider::new(
            vault.clone(),
            picker.clone(),
            Arc::new(asset_source()),
            test_config(),
        )
        .expect("Failed to create provider");

        Self {
            provider,
            vault,
            picker,
        }
    }

    /// Provider over a vault that is already open, with default picker scripts.
    pub fn open() -> Self {
        let vault = InMemoryVault::new(true);
        Self::new(vault.clone(), ScriptedPicker::new(vault))
    }
}
