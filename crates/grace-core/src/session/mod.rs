//! Session state and its observable store.

mod state;
mod store;

pub use state::SessionState;
pub use store::{SessionStore, Subscription};
