//! PostgreSQL-backed SSH key store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{NewSshPublicKey, SshPublicKey};

use super::SshKeyStore;

/// SSH key persistence over an injected connection pool.
#[derive(Debug, Clone)]
pub struct PgSshKeyStore {
    pool: DbPool,
}

impl PgSshKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SshKeyStore for PgSshKeyStore {
    async fn upsert(&self, new: NewSshPublicKey) -> Result<SshPublicKey, AppError> {
        // One conditional statement keyed by virtual_machine_id: rotation
        // overwrites in place and concurrent writers serialize at the row.
        let key = sqlx::query_as::<_, SshPublicKey>(
            r#"
            INSERT INTO ssh_public_keys (virtual_machine_id, key, filename)
            VALUES ($1, $2, $3)
            ON CONFLICT (virtual_machine_id) DO UPDATE
            SET key = EXCLUDED.key,
                filename = EXCLUDED.filename,
                updated_at = NOW(),
                deleted_at = NULL
            RETURNING *
            "#,
        )
        .bind(new.virtual_machine_id)
        .bind(&new.key)
        .bind(&new.filename)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(vm_id = %key.virtual_machine_id, filename = %key.filename, "ssh key material stored");
        Ok(key)
    }

    async fn get_by_vm(&self, vm_id: Uuid) -> Result<Option<SshPublicKey>, AppError> {
        let key = sqlx::query_as::<_, SshPublicKey>(
            "SELECT * FROM ssh_public_keys WHERE virtual_machine_id = $1 AND deleted_at IS NULL",
        )
        .bind(vm_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    async fn delete_by_vm(&self, vm_id: Uuid) -> Result<(), AppError> {
        // Soft delete then purge; both phases tolerate an absent row
        sqlx::query(
            "UPDATE ssh_public_keys SET deleted_at = NOW() WHERE virtual_machine_id = $1 AND deleted_at IS NULL",
        )
        .bind(vm_id)
        .execute(&self.pool)
        .await?;

        sqlx::query("DELETE FROM ssh_public_keys WHERE virtual_machine_id = $1")
            .bind(vm_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(vm_id = %vm_id, "ssh key material deleted");
        Ok(())
    }
}
