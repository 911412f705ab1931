//! PostgreSQL-backed customer store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{Customer, NewCustomer};

use super::CustomerStore;

/// Customer persistence over an injected connection pool.
#[derive(Debug, Clone)]
pub struct PgCustomerStore {
    pool: DbPool,
}

impl PgCustomerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn create(&self, new: NewCustomer) -> Result<Customer, AppError> {
        let result = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(customer) => {
                tracing::info!(customer_id = %customer.id, username = %customer.username, "customer created");
                Ok(customer)
            }
            Err(e) => {
                let err = AppError::from(e);
                // No resolution policy for username/email collisions
                if err.is_unique_violation() {
                    return Err(AppError::Conflict(format!(
                        "customer {} already exists",
                        new.username
                    )));
                }
                Err(err)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        // Phase one: mark as deleted, retained for the audit trail
        let marked = sqlx::query(
            "UPDATE customers SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // Phase two: permanent purge. Zero affected rows means the row was
        // already gone, which is success.
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(customer_id = %id, newly_deleted = marked > 0, "customer deleted");
        Ok(())
    }
}
