mod errors;
mod launcher;
mod pending;
mod ports;
mod registration;
mod selection;

pub use errors::{CoordinationError, ErrorKind};
pub use launcher::{CredentialProvider, LaunchMode, ProviderRequest, ProviderResponse};
pub use pending::PendingOperation;
pub use ports::{
    EntryInfo, PickerPort, RegisterInfo, SearchInfo, SearchOutcome, SelectionResult, VaultHandle,
    VaultPort,
};
pub use registration::{RegistrationFlow, RegistrationState};
pub use selection::{SelectionFlow, SelectionState};
