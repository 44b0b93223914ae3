use super::errors::CoordinationError;
use super::launcher::{CredentialProvider, ProviderRequest};
use super::pending::{PendingOperation, PendingSlot};
use super::ports::{RegisterInfo, SearchInfo, SearchOutcome, VaultHandle};
use crate::passkey::{
    AttestationResponse, build_attestation_response, check_request_provenance,
    resolve_creation_parameters,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    Init,
    ParametersResolved,
    AutoRegister,
    ManualCreate,
    ResultReceived,
    Verified,
    Rejected,
    Failed,
    Done,
}

/// Resolves one "create credential" request into a stored passkey.
pub struct RegistrationFlow<'a> {
    provider: &'a CredentialProvider,
    state: RegistrationState,
    pending: PendingSlot,
}

impl<'a> RegistrationFlow<'a> {
    pub fn new(provider: &'a CredentialProvider) -> Self {
        Self {
            provider,
            state: RegistrationState::Init,
            pending: PendingSlot::default(),
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn pending(&self) -> PendingOperation {
        self.pending.current()
    }

    /// Drives the flow to `Done`, `Rejected` or `Failed`.
    ///
    /// Returns `None` when a target entry was given: the minted passkey is not
    /// written to that entry and no attestation is produced.
    #[tracing::instrument(skip_all, fields(node_id = ?request.node_id))]
    pub async fn run(
        &mut self,
        request: &ProviderRequest,
    ) -> Result<Option<AttestationResponse>, CoordinationError> {
        if self.state != RegistrationState::Init {
            return Err(CoordinationError::InvalidState(format!(
                "Registration already ran and is {:?}",
                self.state
            ))
            .log());
        }

        match self.register(request).await {
            Ok(response) => {
                self.transition(RegistrationState::Done);
                Ok(response)
            }
            Err(e) => {
                if self.state != RegistrationState::Rejected {
                    self.transition(RegistrationState::Failed);
                }
                Err(e.log())
            }
        }
    }

    async fn register(
        &mut self,
        request: &ProviderRequest,
    ) -> Result<Option<AttestationResponse>, CoordinationError> {
        let provider = self.provider;
        let create_request = request.create_request.as_ref().ok_or_else(|| {
            CoordinationError::MalformedRequest("Missing create credential request".to_string())
        })?;

        check_request_provenance(
            &provider.provenance,
            request.node_id.as_ref(),
            request.auth_code.as_deref(),
        )?;
        let (generated, app_origin, parameters) = resolve_creation_parameters(
            create_request,
            provider.assets.as_ref(),
            &provider.config,
        )
        .await?;
        self.transition(RegistrationState::ParametersResolved);

        if let Some(node_id) = request.node_id {
            self.transition(RegistrationState::AutoRegister);
            tracing::warn!(
                "Automatic registration into entry {} does not store credential {}",
                node_id,
                generated.credential_id
            );
            return Ok(None);
        }

        self.transition(RegistrationState::ManualCreate);
        let search_info = request
            .search_info
            .for_relying_party(parameters.relying_party());
        let vault = self.open_vault(&search_info).await?;

        let register_info = RegisterInfo {
            search_info,
            passkey: generated.clone(),
            app_origin,
        };
        let returned = self
            .pending
            .run(
                PendingOperation::AwaitingRegistration,
                provider
                    .picker
                    .prompt_manual_registration(&vault, register_info),
            )
            .await?;
        self.transition(RegistrationState::ResultReceived);

        if returned.as_ref() != Some(&generated) {
            self.transition(RegistrationState::Rejected);
            return Err(CoordinationError::Security(
                "passkey modified before registration".to_string(),
            ));
        }
        self.transition(RegistrationState::Verified);

        Ok(Some(build_attestation_response(&parameters)?))
    }

    async fn open_vault(
        &mut self,
        search_info: &SearchInfo,
    ) -> Result<VaultHandle, CoordinationError> {
        let provider = self.provider;
        match provider.vault.search(search_info).await {
            SearchOutcome::Found { vault, .. } | SearchOutcome::NotFound { vault } => Ok(vault),
            SearchOutcome::Closed => self
                .pending
                .run(
                    PendingOperation::AwaitingRegistration,
                    provider.picker.prompt_open_vault(search_info),
                )
                .await?
                .ok_or_else(|| {
                    CoordinationError::MalformedRequest("Vault was not opened".to_string())
                }),
        }
    }

    fn transition(&mut self, next: RegistrationState) {
        tracing::debug!("Registration {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
