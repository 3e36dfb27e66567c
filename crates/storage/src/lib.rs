#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{CachedIdentity, IdentityCache, InMemoryRepository, Storage, StorageError};
