//! vault_passkey - Passkey credential provider core for password vaults
//!
//! This crate verifies which app or website is asking for a passkey, resolves
//! WebAuthn get/create requests against vault entries, and signs the resulting
//! assertions and attestations.

mod config;
mod coordination;
mod origin;
mod passkey;
mod utils;

pub use config::{ProviderConfig, UserVerification};

pub use coordination::{
    CoordinationError, CredentialProvider, EntryInfo, ErrorKind, LaunchMode, PendingOperation,
    PickerPort, ProviderRequest, ProviderResponse, RegisterInfo, RegistrationFlow,
    RegistrationState, SearchInfo, SearchOutcome, SelectionFlow, SelectionResult, SelectionState,
    VaultHandle, VaultPort,
};

pub use origin::{
    AndroidOrigin, AppOrigin, AssetSource, CallingAppInfo, HttpAssetSource, OriginError,
    RELYING_PARTY_DEFAULT_PROTOCOL, StaticAssetSource, VerifiedOrigin, WebOrigin,
    parse_asset_links, parse_privileged_apps, verify_calling_app,
};

pub use passkey::{
    AssertionResponse, AttestationResponse, COSE_ALG_ES256, ClientDataResponse,
    CreateCredentialRequest, CreationParameters, GetCredentialRequest, Passkey, PasskeyError,
    ProvenanceKey, UsageParameters, build_attestation_response, build_verified_assertion_response,
    check_request_provenance, resolve_creation_parameters, resolve_usage_parameters,
};

pub use utils::UtilError;
