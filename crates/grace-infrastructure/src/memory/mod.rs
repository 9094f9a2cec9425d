//! In-memory backend used by tests and local development.

mod identity;
mod store;

pub use identity::InMemoryIdentityProvider;
pub use store::InMemoryDocumentStore;
