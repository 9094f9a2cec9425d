//! Adapters for a Firebase project: Identity Toolkit for accounts and
//! Firestore for profile and dossier records, both over REST.

mod client;
mod firestore;
mod identity;
pub mod value;

pub use client::{TokenSource, map_firestore_status};
pub use firestore::FirestoreDocumentStore;
pub use identity::FirebaseIdentityProvider;
