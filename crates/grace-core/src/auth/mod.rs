//! Authentication domain module: identity provider port and error mapping.

mod codes;
mod provider;

pub use codes::map_provider_code;
pub use provider::{AuthUser, IdentityProvider, ProviderAuthState};
