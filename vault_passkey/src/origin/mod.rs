mod asset_links;
mod errors;
mod types;
mod verifier;

pub use asset_links::{
    AssetSource, HttpAssetSource, StaticAssetSource, parse_asset_links, parse_privileged_apps,
};
pub use errors::OriginError;
pub use types::{AndroidOrigin, AppOrigin, RELYING_PARTY_DEFAULT_PROTOCOL, WebOrigin};
pub use verifier::{CallingAppInfo, VerifiedOrigin, verify_calling_app};
