use async_trait::async_trait;

use crate::repository::{CachedIdentity, IdentityCache, StorageError};

use super::SqliteRepository;
use super::mapping::map_identity_row;

#[async_trait]
impl IdentityCache for SqliteRepository {
    async fn load_identity(&self) -> Result<Option<CachedIdentity>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_id, stored_at
            FROM identity_cache
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_identity_row).transpose()
    }

    async fn store_identity(&self, identity: &CachedIdentity) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO identity_cache (id, student_id, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                student_id = excluded.student_id,
                stored_at = excluded.stored_at
            ",
        )
        .bind(1_i64)
        .bind(identity.student_id.as_str())
        .bind(identity.stored_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_identity(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM identity_cache WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
