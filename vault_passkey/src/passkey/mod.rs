mod authenticator;
mod client_data;
mod errors;
mod keys;
mod provenance;
mod resolver;
mod types;

pub use client_data::ClientDataResponse;
pub use errors::PasskeyError;
pub use keys::COSE_ALG_ES256;
pub use provenance::{ProvenanceKey, check_request_provenance};
pub use resolver::{
    build_attestation_response, build_verified_assertion_response, resolve_creation_parameters,
    resolve_usage_parameters,
};
pub use types::{
    AssertionResponse, AttestationResponse, CreateCredentialRequest, CreationParameters,
    GetCredentialRequest, Passkey, UsageParameters,
};
