//! Session state: the in-memory credential store and its persisted snapshot

pub mod credential_store;
pub mod snapshot;

pub use credential_store::CredentialStore;
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore};
