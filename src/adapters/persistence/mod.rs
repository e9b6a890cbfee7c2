//! Persistence adapters. Implement ProfileStore.

pub mod sqlite_store;

pub use sqlite_store::SqliteProfileStore;
