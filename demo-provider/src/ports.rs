use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;
use vault_passkey::{
    EntryInfo, Passkey, PickerPort, RegisterInfo, SearchInfo, SearchOutcome, SelectionResult,
    VaultHandle, VaultPort,
};

/// Vault kept in memory for the lifetime of the process.
pub struct MemoryVault {
    handle: VaultHandle,
    entries: Mutex<Vec<EntryInfo>>,
}

impl MemoryVault {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            handle: VaultHandle {
                id: Uuid::new_v4(),
                name: name.to_string(),
            },
            entries: Mutex::new(Vec::new()),
        })
    }

    pub async fn first_entry_id(&self) -> Option<Uuid> {
        self.entries.lock().await.first().map(|entry| entry.id)
    }

    async fn matching(&self, relying_party: Option<&str>) -> Vec<EntryInfo> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| {
                entry
                    .passkey
                    .as_ref()
                    .is_some_and(|p| Some(p.relying_party.as_str()) == relying_party)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl VaultPort for MemoryVault {
    async fn get_entry_by_id(&self, id: Uuid) -> Option<EntryInfo> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    async fn search(&self, search_info: &SearchInfo) -> SearchOutcome {
        let matches = self.matching(search_info.relying_party.as_deref()).await;
        if matches.is_empty() {
            SearchOutcome::NotFound {
                vault: self.handle.clone(),
            }
        } else {
            SearchOutcome::Found {
                vault: self.handle.clone(),
                matches,
            }
        }
    }

    async fn create_entry(&self, register_info: RegisterInfo) -> Option<Passkey> {
        let passkey = register_info.passkey;
        let entry = EntryInfo {
            id: Uuid::new_v4(),
            title: passkey.relying_party.clone(),
            username: passkey.username.clone(),
            passkey: Some(passkey.clone()),
            app_origin: Some(register_info.app_origin),
        };
        tracing::info!("Stored passkey for {} in entry {}", entry.title, entry.id);
        self.entries.lock().await.push(entry);
        Some(passkey)
    }
}

/// Picker that accepts every prompt without user interaction.
pub struct AutoPicker {
    vault: Arc<MemoryVault>,
}

impl AutoPicker {
    pub fn new(vault: Arc<MemoryVault>) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl PickerPort for AutoPicker {
    async fn prompt_manual_selection(
        &self,
        vault: &VaultHandle,
        search_info: Option<&SearchInfo>,
    ) -> Option<SelectionResult> {
        tracing::info!("Selecting a passkey from {}", vault.name);
        let relying_party = search_info.and_then(|s| s.relying_party.as_deref());
        self.vault
            .matching(relying_party)
            .await
            .into_iter()
            .next()
            .map(|entry| SelectionResult {
                passkey: entry.passkey,
                app_origin: entry.app_origin,
            })
    }

    async fn prompt_manual_registration(
        &self,
        vault: &VaultHandle,
        register_info: RegisterInfo,
    ) -> Option<Passkey> {
        tracing::info!(
            "Registering {} in {}",
            register_info.passkey.username,
            vault.name
        );
        self.vault.create_entry(register_info).await
    }

    async fn prompt_open_vault(&self, _search_info: &SearchInfo) -> Option<VaultHandle> {
        Some(self.vault.handle.clone())
    }
}
