use super::errors::CoordinationError;
use super::launcher::{CredentialProvider, ProviderRequest};
use super::pending::{PendingOperation, PendingSlot};
use super::ports::{SearchInfo, SearchOutcome, VaultHandle};
use crate::origin::AppOrigin;
use crate::passkey::{
    AssertionResponse, UsageParameters, build_verified_assertion_response,
    check_request_provenance, resolve_usage_parameters,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    Init,
    ParametersResolved,
    AutoSelect,
    SearchDelegated,
    ResponseBuilt,
    Failed,
    Done,
}

/// Resolves one "get credential" request to an existing passkey.
pub struct SelectionFlow<'a> {
    provider: &'a CredentialProvider,
    state: SelectionState,
    pending: PendingSlot,
}

impl<'a> SelectionFlow<'a> {
    pub fn new(provider: &'a CredentialProvider) -> Self {
        Self {
            provider,
            state: SelectionState::Init,
            pending: PendingSlot::default(),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn pending(&self) -> PendingOperation {
        self.pending.current()
    }

    /// Drives the flow to `Done` or `Failed`. A flow runs once.
    #[tracing::instrument(skip_all, fields(node_id = ?request.node_id))]
    pub async fn run(
        &mut self,
        request: &ProviderRequest,
    ) -> Result<AssertionResponse, CoordinationError> {
        if self.state != SelectionState::Init {
            return Err(CoordinationError::InvalidState(format!(
                "Selection already ran and is {:?}",
                self.state
            ))
            .log());
        }

        match self.select(request).await {
            Ok(response) => {
                self.transition(SelectionState::ResponseBuilt);
                self.transition(SelectionState::Done);
                Ok(response)
            }
            Err(e) => {
                self.transition(SelectionState::Failed);
                Err(e.log())
            }
        }
    }

    async fn select(
        &mut self,
        request: &ProviderRequest,
    ) -> Result<AssertionResponse, CoordinationError> {
        let provider = self.provider;
        let get_request = request.get_request.as_ref().ok_or_else(|| {
            CoordinationError::MalformedRequest("Missing get credential request".to_string())
        })?;

        check_request_provenance(
            &provider.provenance,
            request.node_id.as_ref(),
            request.auth_code.as_deref(),
        )?;
        let usage = resolve_usage_parameters(
            get_request,
            provider.assets.as_ref(),
            &request.app_origin,
            &provider.config,
        )
        .await?;
        self.transition(SelectionState::ParametersResolved);

        match request.node_id {
            Some(node_id) => {
                self.transition(SelectionState::AutoSelect);
                let entry = provider.vault.get_entry_by_id(node_id).await.ok_or_else(|| {
                    CoordinationError::NotFound(format!("no passkey for id {node_id}"))
                })?;
                let passkey = entry.passkey.ok_or_else(|| {
                    CoordinationError::NotFound(format!("no passkey for id {node_id}"))
                })?;

                let app_origin = if request.app_origin.is_empty() {
                    entry.app_origin.unwrap_or_default()
                } else {
                    request.app_origin.clone()
                };
                Ok(build_verified_assertion_response(
                    &usage,
                    &app_origin,
                    &passkey,
                )?)
            }
            None => {
                self.transition(SelectionState::SearchDelegated);
                let search_info = request.search_info.for_relying_party(usage.relying_party());
                let vault = self.open_vault(&search_info).await?;
                self.prompt_selection(&usage, &vault, &search_info).await
            }
        }
    }

    async fn open_vault(
        &mut self,
        search_info: &SearchInfo,
    ) -> Result<VaultHandle, CoordinationError> {
        let provider = self.provider;
        match provider.vault.search(search_info).await {
            SearchOutcome::Found { vault, matches } => {
                tracing::warn!(
                    "{} entries matched during selection, asking the user instead",
                    matches.len()
                );
                Ok(vault)
            }
            SearchOutcome::NotFound { vault } => Ok(vault),
            SearchOutcome::Closed => self
                .pending
                .run(
                    PendingOperation::AwaitingSelection,
                    provider.picker.prompt_open_vault(search_info),
                )
                .await?
                .ok_or_else(|| {
                    CoordinationError::MalformedRequest("Vault was not opened".to_string())
                }),
        }
    }

    async fn prompt_selection(
        &mut self,
        usage: &UsageParameters,
        vault: &VaultHandle,
        search_info: &SearchInfo,
    ) -> Result<AssertionResponse, CoordinationError> {
        let provider = self.provider;
        let selection = self
            .pending
            .run(
                PendingOperation::AwaitingSelection,
                provider
                    .picker
                    .prompt_manual_selection(vault, Some(search_info)),
            )
            .await?
            .ok_or_else(|| CoordinationError::MalformedRequest("No passkey selected".to_string()))?;

        let passkey = selection.passkey.ok_or_else(|| {
            CoordinationError::MalformedRequest("Selection returned no passkey".to_string())
        })?;
        let app_origin: AppOrigin = selection.app_origin.ok_or_else(|| {
            CoordinationError::MalformedRequest("Selection returned no app origin".to_string())
        })?;

        Ok(build_verified_assertion_response(
            usage,
            &app_origin,
            &passkey,
        )?)
    }

    fn transition(&mut self, next: SelectionState) {
        tracing::debug!("Selection {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
