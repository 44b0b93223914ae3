use std::sync::Arc;

use uuid::Uuid;

use super::errors::{CoordinationError, ErrorKind};
use super::ports::{PickerPort, SearchInfo, VaultPort};
use super::registration::RegistrationFlow;
use super::selection::SelectionFlow;
use crate::config::ProviderConfig;
use crate::origin::{AppOrigin, AssetSource};
use crate::passkey::{
    AssertionResponse, AttestationResponse, CreateCredentialRequest, GetCredentialRequest,
    ProvenanceKey,
};

/// What the provider was launched to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LaunchMode {
    #[default]
    Default,
    Search,
    Selection,
    Registration,
}

/// A request handed to the provider, possibly relaunched with a target entry.
#[derive(Clone, Debug, Default)]
pub struct ProviderRequest {
    pub mode: LaunchMode,
    pub get_request: Option<GetCredentialRequest>,
    pub create_request: Option<CreateCredentialRequest>,
    /// Identity the caller was previously known under, if any.
    pub app_origin: AppOrigin,
    pub search_info: SearchInfo,
    /// Entry to use without showing a picker.
    pub node_id: Option<Uuid>,
    pub auth_code: Option<String>,
}

impl ProviderRequest {
    pub fn selection(get_request: GetCredentialRequest) -> Self {
        Self {
            mode: LaunchMode::Selection,
            get_request: Some(get_request),
            ..Default::default()
        }
    }

    pub fn registration(create_request: CreateCredentialRequest) -> Self {
        Self {
            mode: LaunchMode::Registration,
            create_request: Some(create_request),
            ..Default::default()
        }
    }

    pub fn with_app_origin(mut self, app_origin: AppOrigin) -> Self {
        self.app_origin = app_origin;
        self
    }

    pub fn with_search_info(mut self, search_info: SearchInfo) -> Self {
        self.search_info = search_info;
        self
    }

    /// Targets `node_id` and attaches a provenance code for it.
    pub fn with_node_id(
        mut self,
        node_id: Uuid,
        key: &ProvenanceKey,
    ) -> Result<Self, CoordinationError> {
        self.auth_code = Some(key.issue(&node_id)?);
        self.node_id = Some(node_id);
        Ok(self)
    }
}

/// Outcome reported back to the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderResponse {
    Assertion(AssertionResponse),
    Attestation(AttestationResponse),
    /// Registration finished without producing an attestation.
    Registered,
    Cancelled { kind: ErrorKind, notice: String },
}

impl ProviderResponse {
    fn cancelled(err: &CoordinationError) -> Self {
        let kind = err.kind();
        Self::Cancelled {
            kind,
            notice: kind.notice().to_string(),
        }
    }
}

/// Entry point that dispatches each request to a fresh flow.
pub struct CredentialProvider {
    pub(super) vault: Arc<dyn VaultPort>,
    pub(super) picker: Arc<dyn PickerPort>,
    pub(super) assets: Arc<dyn AssetSource>,
    pub(super) provenance: ProvenanceKey,
    pub(super) config: ProviderConfig,
}

impl CredentialProvider {
    pub fn new(
        vault: Arc<dyn VaultPort>,
        picker: Arc<dyn PickerPort>,
        assets: Arc<dyn AssetSource>,
        config: ProviderConfig,
    ) -> Result<Self, CoordinationError> {
        Ok(Self {
            vault,
            picker,
            assets,
            provenance: ProvenanceKey::generate()?,
            config,
        })
    }

    /// Key used to sign relaunched requests.
    pub fn provenance_key(&self) -> &ProvenanceKey {
        &self.provenance
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[tracing::instrument(skip_all, fields(mode = ?request.mode))]
    pub async fn handle(&self, request: &ProviderRequest) -> ProviderResponse {
        match request.mode {
            LaunchMode::Selection => {
                let mut flow = SelectionFlow::new(self);
                match flow.run(request).await {
                    Ok(response) => ProviderResponse::Assertion(response),
                    Err(e) => ProviderResponse::cancelled(&e),
                }
            }
            LaunchMode::Registration => {
                let mut flow = RegistrationFlow::new(self);
                match flow.run(request).await {
                    Ok(Some(response)) => ProviderResponse::Attestation(response),
                    Ok(None) => ProviderResponse::Registered,
                    Err(e) => ProviderResponse::cancelled(&e),
                }
            }
            mode => {
                let err =
                    CoordinationError::UnsupportedMode(format!("{mode:?} is not a passkey request"))
                        .log();
                ProviderResponse::cancelled(&err)
            }
        }
    }
}
