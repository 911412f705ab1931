//! Customer data model.
//!
//! This module defines:
//! - `Customer`: Database entity representing a tenant-owning customer
//! - `NewCustomer`: Validated input for creating customers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Cost factor for hashing customer account passwords.
///
/// Account passwords are verified on every login, so this stays one notch
/// below the cost used for one-shot root secrets.
const ACCOUNT_PASSWORD_COST: u32 = 14;

/// Represents a customer record from the database.
///
/// # Database Table
///
/// Maps to the `customers` table. Each customer:
/// - Owns at most one `VirtualMachine` (via `virtual_machines.owner_id`)
/// - Is identified by a unique username and unique email
///
/// # Immutability
///
/// `username` and `email` are write-once: they are set at registration and
/// the repository layer never updates them afterwards.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Customer {
    /// Unique identifier for this customer
    pub id: Uuid,

    /// Login name, unique across all customers
    pub username: String,

    /// Contact email, unique across all customers
    pub email: String,

    /// bcrypt hash of the account password
    ///
    /// The plaintext password is hashed in `NewCustomer::new` and never
    /// stored or logged.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Timestamp when the customer registered
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last update
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker; `None` for live rows
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Validated input for creating a new customer.
///
/// The password is hashed at construction time, so the plaintext never
/// travels further than this constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    /// Login name for the new customer
    pub username: String,

    /// Contact email
    pub email: String,

    /// bcrypt hash of the supplied password
    pub password_hash: String,
}

impl NewCustomer {
    /// Build a new customer record, hashing the plaintext password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Hash` if the hashing primitive fails.
    pub fn new(username: &str, password: &str, email: &str) -> Result<Self, AppError> {
        let password_hash = bcrypt::hash(password, ACCOUNT_PASSWORD_COST)?;
        Ok(Self {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
        })
    }
}
