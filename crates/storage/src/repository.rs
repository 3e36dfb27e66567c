use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentornet_core::model::StudentId;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Identity entry as kept by the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIdentity {
    pub student_id: StudentId,
    pub stored_at: DateTime<Utc>,
}

/// Session-scoped cache for the resolved student identity.
///
/// Writes are write-through: callers store an identity only after it has
/// been resolved successfully.
#[async_trait]
pub trait IdentityCache: Send + Sync {
    /// Read the cached identity, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read, or if the
    /// stored value is malformed.
    async fn load_identity(&self) -> Result<Option<CachedIdentity>, StorageError>;

    /// Persist a resolved identity, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the identity cannot be stored.
    async fn store_identity(&self, identity: &CachedIdentity) -> Result<(), StorageError>;

    /// Forget the cached identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    async fn clear_identity(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    identity: Arc<Mutex<Option<CachedIdentity>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with an identity.
    #[must_use]
    pub fn with_identity(identity: CachedIdentity) -> Self {
        Self {
            identity: Arc::new(Mutex::new(Some(identity))),
        }
    }
}

#[async_trait]
impl IdentityCache for InMemoryRepository {
    async fn load_identity(&self) -> Result<Option<CachedIdentity>, StorageError> {
        let guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn store_identity(&self, identity: &CachedIdentity) -> Result<(), StorageError> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(identity.clone());
        Ok(())
    }

    async fn clear_identity(&self) -> Result<(), StorageError> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.take();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub identity: Arc<dyn IdentityCache>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let identity: Arc<dyn IdentityCache> = Arc::new(InMemoryRepository::new());
        Self { identity }
    }
}
