//! Collaborators the flows suspend on: the vault and the user-facing pickers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::origin::AppOrigin;
use crate::passkey::Passkey;

/// Criteria used to look up entries in the vault.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub application_id: Option<String>,
    pub web_domain: Option<String>,
    pub relying_party: Option<String>,
    pub manual_selection: bool,
}

impl SearchInfo {
    pub(crate) fn for_relying_party(&self, relying_party: &str) -> Self {
        let mut search_info = self.clone();
        if search_info.relying_party.is_none() {
            search_info.relying_party = Some(relying_party.to_string());
        }
        search_info
    }
}

/// An opened vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultHandle {
    pub id: Uuid,
    pub name: String,
}

/// Projection of a vault entry.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryInfo {
    pub id: Uuid,
    pub title: String,
    pub username: String,
    pub passkey: Option<Passkey>,
    pub app_origin: Option<AppOrigin>,
}

/// Result of searching the vault.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Found {
        vault: VaultHandle,
        matches: Vec<EntryInfo>,
    },
    NotFound {
        vault: VaultHandle,
    },
    /// No vault is open.
    Closed,
}

/// Everything needed to store a newly minted passkey.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterInfo {
    pub search_info: SearchInfo,
    pub passkey: Passkey,
    pub app_origin: AppOrigin,
}

/// What the user picked in the selection dialog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionResult {
    pub passkey: Option<Passkey>,
    pub app_origin: Option<AppOrigin>,
}

#[async_trait]
pub trait VaultPort: Send + Sync {
    async fn get_entry_by_id(&self, id: Uuid) -> Option<EntryInfo>;

    async fn search(&self, search_info: &SearchInfo) -> SearchOutcome;

    /// Persists the passkey and returns it as stored. Called by the registration
    /// picker, not by the flows.
    async fn create_entry(&self, register_info: RegisterInfo) -> Option<Passkey>;
}

/// User interaction. `None` means the user backed out.
#[async_trait]
pub trait PickerPort: Send + Sync {
    async fn prompt_manual_selection(
        &self,
        vault: &VaultHandle,
        search_info: Option<&SearchInfo>,
    ) -> Option<SelectionResult>;

    /// Lets the user place the passkey in an entry. Implementations persist it
    /// through [`VaultPort::create_entry`] and return the passkey as stored, which
    /// must equal the one in `register_info`.
    async fn prompt_manual_registration(
        &self,
        vault: &VaultHandle,
        register_info: RegisterInfo,
    ) -> Option<Passkey>;

    async fn prompt_open_vault(&self, search_info: &SearchInfo) -> Option<VaultHandle>;
}
