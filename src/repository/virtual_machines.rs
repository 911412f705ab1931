//! PostgreSQL-backed virtual machine store.
//!
//! The create path owns the name-collision policy: a unique violation on
//! the machine name retries the insert with a generated suffix instead of
//! failing the provisioning flow.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{NewVirtualMachine, VirtualMachine};

use super::VirtualMachineStore;

/// Unique index backing the machine name column.
const NAME_CONSTRAINT: &str = "virtual_machines_name_key";

/// Upper bound on suffixed insert attempts. With a random 8-hex suffix a
/// second collision is already vanishingly unlikely.
const MAX_NAME_ATTEMPTS: u32 = 4;

/// Append a random disambiguating suffix to a requested machine name.
pub fn disambiguate_name(name: &str) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    format!("{name}-{}", &tag[..8])
}

/// Virtual machine persistence over an injected connection pool.
#[derive(Debug, Clone)]
pub struct PgVirtualMachineStore {
    pool: DbPool,
}

impl PgVirtualMachineStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn try_insert(
        &self,
        new: &NewVirtualMachine,
        name: &str,
    ) -> Result<VirtualMachine, AppError> {
        let vm = sqlx::query_as::<_, VirtualMachine>(
            r#"
            INSERT INTO virtual_machines (owner_id, name, item_path, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.owner_id)
        .bind(name)
        .bind(&new.item_path)
        .bind(&new.ip_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(vm)
    }
}

#[async_trait]
impl VirtualMachineStore for PgVirtualMachineStore {
    async fn create(&self, new: NewVirtualMachine) -> Result<VirtualMachine, AppError> {
        let mut name = new.name.clone();

        for _ in 0..MAX_NAME_ATTEMPTS {
            match self.try_insert(&new, &name).await {
                Ok(vm) => {
                    tracing::info!(vm_id = %vm.id, name = %vm.name, owner_id = %vm.owner_id, "virtual machine created");
                    return Ok(vm);
                }
                Err(err) if err.is_unique_violation() => {
                    if err.constraint() == Some(NAME_CONSTRAINT) {
                        // Name taken: regenerate and retry, never fail the create
                        name = disambiguate_name(&new.name);
                        tracing::debug!(requested = %new.name, retry_as = %name, "machine name collision, suffixing");
                        continue;
                    }
                    // owner_id or ip_address collision has no resolution policy
                    return Err(AppError::Conflict(format!(
                        "virtual machine violates {}",
                        err.constraint().unwrap_or("a unique constraint")
                    )));
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::Conflict(format!(
            "could not find a free name for {} after {} attempts",
            new.name, MAX_NAME_ATTEMPTS
        )))
    }

    async fn get(&self, id: Uuid) -> Result<Option<VirtualMachine>, AppError> {
        let vm = sqlx::query_as::<_, VirtualMachine>(
            "SELECT * FROM virtual_machines WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vm)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Key material goes first, in the same transaction, so the machine
        // purge cannot trip the foreign key on
        // ssh_public_keys.virtual_machine_id
        sqlx::query(
            "UPDATE ssh_public_keys SET deleted_at = NOW() WHERE virtual_machine_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM ssh_public_keys WHERE virtual_machine_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Soft delete the machine, retained for audit
        let marked = sqlx::query(
            "UPDATE virtual_machines SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Permanent purge; an already-absent row is success
        sqlx::query("DELETE FROM virtual_machines WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(vm_id = %id, newly_deleted = marked > 0, "virtual machine deleted");
        Ok(())
    }
}
