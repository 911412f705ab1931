//! Error types shared across the credential subsystem.
//!
//! This module defines all errors the library surfaces to its callers.
//! Each variant corresponds to one failure class; control-plane failures
//! are logged with context at the call site before being wrapped here.
//!
//! # Error Categories
//!
//! - **Connectivity**: Host/network unreachable or a deadline expired
//! - **NotFound**: VM, host system, or certificate missing
//! - **Conflict**: Unique-constraint violation that policy could not resolve
//! - **Validation**: Malformed credential material or a rejected signing request
//! - **MetadataRetrieval**: Guest attribute fetch from the control plane failed
//! - **Database**: Any sqlx::Error from repository operations

/// Subsystem-wide error type.
///
/// There is no fatal variant: the worst outcome anywhere in this library
/// is a single operation returning one of these to its caller. A failure
/// for one virtual machine never affects another.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The control plane was unreachable or an operation hit its deadline.
    #[error("control plane unreachable: {0}")]
    Connectivity(String),

    /// A virtual machine, host system, or installed certificate is missing.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique constraint fired and no automatic resolution policy applied.
    ///
    /// Name collisions on VirtualMachine create are resolved by suffixing
    /// and never surface as this variant; everything else does.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Credential material was malformed or rejected by the signing endpoint.
    #[error("invalid credential material: {0}")]
    Validation(String),

    /// The batched guest attribute fetch failed, so root credentials
    /// cannot be returned for this machine.
    #[error("failed to retrieve guest metadata: {0}")]
    MetadataRetrieval(String),

    /// Database operation failed (connection error, query error).
    ///
    /// Wraps any sqlx::Error via `#[from]`.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The one-way hashing primitive failed.
    #[error("hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Configuration could not be loaded from the environment.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),
}

impl AppError {
    /// Whether the underlying database error was a unique-constraint violation.
    ///
    /// Used by the VirtualMachine create path to decide between the
    /// name-suffixing retry and surfacing a `Conflict`.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// Name of the violated constraint, when the database reports one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.constraint(),
            _ => None,
        }
    }
}
