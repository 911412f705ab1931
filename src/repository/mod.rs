//! Repository contracts and their PostgreSQL implementations.
//!
//! The managers consume persistence only through these store traits, so
//! tests can substitute in-memory fakes. The `Pg*` implementations hold an
//! injected [`crate::db::DbPool`]; there are no process-wide handles.
//!
//! # Deletion policy
//!
//! Every delete is two-phase: mark the row with `deleted_at` (soft delete),
//! then purge it permanently. Both phases tolerate an already-absent row;
//! deleting twice is success, not an error.

pub mod customers;
pub mod ssh_keys;
pub mod virtual_machines;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Customer, NewCustomer, NewSshPublicKey, NewVirtualMachine, SshPublicKey, VirtualMachine,
};

pub use customers::PgCustomerStore;
pub use ssh_keys::PgSshKeyStore;
pub use virtual_machines::PgVirtualMachineStore;

/// Persistence contract for customer profiles.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Persist a new customer. Unique-violation on username or email
    /// surfaces as `AppError::Conflict`.
    async fn create(&self, new: NewCustomer) -> Result<Customer, AppError>;

    /// Fetch a live customer by id.
    async fn get(&self, id: Uuid) -> Result<Option<Customer>, AppError>;

    /// Fetch a live customer by username.
    async fn get_by_username(&self, username: &str) -> Result<Option<Customer>, AppError>;

    /// Fetch a live customer by email.
    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, AppError>;

    /// Soft-delete then purge. Idempotent.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

/// Persistence contract for virtual machines.
#[async_trait]
pub trait VirtualMachineStore: Send + Sync {
    /// Persist a newly provisioned machine.
    ///
    /// A name collision never fails the create: the store retries with a
    /// generated disambiguating suffix. Collisions on `owner_id` or
    /// `ip_address` are surfaced as `AppError::Conflict`.
    async fn create(&self, new: NewVirtualMachine) -> Result<VirtualMachine, AppError>;

    /// Fetch a live machine by id.
    async fn get(&self, id: Uuid) -> Result<Option<VirtualMachine>, AppError>;

    /// Soft-delete then purge the machine and its key material, in that
    /// order within one transaction. Idempotent.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

/// Persistence contract for per-machine SSH key material.
#[async_trait]
pub trait SshKeyStore: Send + Sync {
    /// Insert or overwrite the key row for a machine.
    ///
    /// A single conditional statement keyed by `virtual_machine_id`, so
    /// concurrent rotations for the same machine serialize at the row and
    /// the last completed write wins.
    async fn upsert(&self, new: NewSshPublicKey) -> Result<SshPublicKey, AppError>;

    /// Fetch the live key row for a machine, if any.
    async fn get_by_vm(&self, vm_id: Uuid) -> Result<Option<SshPublicKey>, AppError>;

    /// Soft-delete then purge the key row for a machine. Idempotent.
    async fn delete_by_vm(&self, vm_id: Uuid) -> Result<(), AppError>;
}
