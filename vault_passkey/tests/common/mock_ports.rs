//! In-memory vault and a scripted picker standing in for the vault UI.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;
use vault_passkey::{
    AppOrigin, EntryInfo, Passkey, PickerPort, RegisterInfo, SearchInfo, SearchOutcome,
    SelectionResult, VaultHandle, VaultPort,
};

pub struct InMemoryVault {
    handle: VaultHandle,
    open: Mutex<bool>,
    entries: Mutex<Vec<EntryInfo>>,
}

impl InMemoryVault {
    pub fn new(open: bool) -> Arc<Self> {
        Arc::new(Self {
            handle: VaultHandle {
                id: Uuid::new_v4(),
                name: "Test vault".to_string(),
            },
            open: Mutex::new(open),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn handle(&self) -> VaultHandle {
        self.handle.clone()
    }

    pub async fn set_open(&self, open: bool) {
        *self.open.lock().await = open;
    }

    pub async fn insert(&self, passkey: Option<Passkey>, app_origin: Option<AppOrigin>) -> Uuid {
        let id = Uuid::new_v4();
        let username = passkey
            .as_ref()
            .map(|p| p.username.clone())
            .unwrap_or_default();
        self.entries.lock().await.push(EntryInfo {
            id,
            title: "example.com".to_string(),
            username,
            passkey,
            app_origin,
        });
        id
    }

    pub async fn entries(&self) -> Vec<EntryInfo> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl VaultPort for InMemoryVault {
    async fn get_entry_by_id(&self, id: Uuid) -> Option<EntryInfo> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    async fn search(&self, search_info: &SearchInfo) -> SearchOutcome {
        if !*self.open.lock().await {
            return SearchOutcome::Closed;
        }

        let matches: Vec<EntryInfo> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|entry| {
                entry.passkey.as_ref().is_some_and(|p| {
                    Some(p.relying_party.as_str()) == search_info.relying_party.as_deref()
                })
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            SearchOutcome::NotFound {
                vault: self.handle(),
            }
        } else {
            SearchOutcome::Found {
                vault: self.handle(),
                matches,
            }
        }
    }

    async fn create_entry(&self, register_info: RegisterInfo) -> Option<Passkey> {
        let passkey = register_info.passkey;
        self.insert(Some(passkey.clone()), Some(register_info.app_origin))
            .await;
        Some(passkey)
    }
}

/// How the picker answers a selection prompt.
#[derive(Clone, Debug)]
pub enum SelectionScript {
    /// The first entry whose passkey belongs to the searched relying party.
    FirstMatch,
    Fixed(SelectionResult),
    Cancel,
}

/// How the picker answers a registration prompt.
#[derive(Clone, Debug)]
pub enum RegistrationScript {
    /// Store the offered passkey unchanged.
    Store,
    /// Hand back a different passkey.
    Replace(Passkey),
    Cancel,
}

pub struct ScriptedPicker {
    vault: Arc<InMemoryVault>,
    selection: SelectionScript,
    registration: RegistrationScript,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedPicker {
    pub fn new(vault: Arc<InMemoryVault>) -> Self {
        Self {
            vault,
            selection: SelectionScript::FirstMatch,
            registration: RegistrationScript::Store,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_selection(mut self, selection: SelectionScript) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_registration(mut self, registration: RegistrationScript) -> Self {
        self.registration = registration;
        self
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PickerPort for ScriptedPicker {
    async fn prompt_manual_selection(
        &self,
        vault: &VaultHandle,
        search_info: Option<&SearchInfo>,
    ) -> Option<SelectionResult> {
        self.calls.lock().await.push("manual_selection");
        assert_eq!(vault, &self.vault.handle());

        match &self.selection {
            SelectionScript::FirstMatch => {
                let relying_party = search_info.and_then(|s| s.relying_party.clone());
                self.vault
                    .entries()
                    .await
                    .into_iter()
                    .find(|entry| {
                        entry.passkey.as_ref().map(|p| &p.relying_party) == relying_party.as_ref()
                    })
                    .map(|entry| SelectionResult {
                        passkey: entry.passkey,
                        app_origin: entry.app_origin,
                    })
            }
            SelectionScript::Fixed(result) => Some(result.clone()),
            SelectionScript::Cancel => None,
        }
    }

    async fn prompt_manual_registration(
        &self,
        vault: &VaultHandle,
        register_info: RegisterInfo,
    ) -> Option<Passkey> {
        self.calls.lock().await.push("manual_registration");
        assert_eq!(vault, &self.vault.handle());

        match &self.registration {
            RegistrationScript::Store => self.vault.create_entry(register_info).await,
            RegistrationScript::Replace(passkey) => Some(passkey.clone()),
            RegistrationScript::Cancel => None,
        }
    }

    async fn prompt_open_vault(&self, _search_info: &SearchInfo) -> Option<VaultHandle> {
        self.calls.lock().await.push("open_vault");
        self.vault.set_open(true).await;
        Some(self.vault.handle())
    }
}
