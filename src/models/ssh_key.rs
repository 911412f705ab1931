//! SSH key material attached to a virtual machine.
//!
//! A machine holds at most one live key row. Rotation overwrites the `key`
//! column in place, keyed by `virtual_machine_id`; it never inserts a
//! second row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Represents the stored credential reference for one virtual machine.
///
/// # Database Table
///
/// Maps to the `ssh_public_keys` table. `virtual_machine_id` is unique, so
/// the table enforces the one-key-per-machine invariant.
///
/// # Contents
///
/// `key` is an opaque blob from this subsystem's point of view: a PEM
/// certificate for the certificate strategy, or the bcrypt hash of the root
/// secret for the root-password strategy. Plaintext secrets are never
/// written here.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SshPublicKey {
    /// Unique identifier for this key row
    pub id: Uuid,

    /// The machine this key belongs to (unique)
    pub virtual_machine_id: Uuid,

    /// Opaque credential content
    pub key: Option<String>,

    /// File name the material is delivered under
    pub filename: String,

    /// Timestamp when the row was first created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last rotation
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker; `None` for live rows
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for attaching key material to a machine.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSshPublicKey {
    /// The machine the key belongs to
    pub virtual_machine_id: Uuid,

    /// Opaque credential content
    pub key: String,

    /// Delivery file name
    pub filename: String,
}

impl NewSshPublicKey {
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the content is not valid UTF-8,
    /// the same check the certificate upload path applies. Malformed
    /// material is rejected, never silently rewritten.
    pub fn new(virtual_machine_id: Uuid, key: &[u8], filename: &str) -> Result<Self, AppError> {
        let key = String::from_utf8(key.to_vec())
            .map_err(|_| AppError::Validation("key content is not valid UTF-8".to_string()))?;
        Ok(Self {
            virtual_machine_id,
            key,
            filename: filename.to_owned(),
        })
    }
}
