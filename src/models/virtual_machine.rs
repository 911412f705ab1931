//! Virtual machine data model.
//!
//! This module defines:
//! - `VirtualMachine`: Database entity for a provisioned machine
//! - `NewVirtualMachine`: Input for registering a machine at provisioning time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a virtual machine record from the database.
///
/// # Database Table
///
/// Maps to the `virtual_machines` table. Each machine:
/// - Belongs to exactly one customer (via `owner_id`, unique — one machine
///   per owner slot)
/// - Carries the provisioning inventory path and IP address it was created with
///
/// # Immutability
///
/// `owner_id`, `item_path` and `ip_address` are write-once: set at creation,
/// never updated by the repository layer. `name` may gain a disambiguating
/// suffix at create time but is never rewritten afterwards.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct VirtualMachine {
    /// Unique identifier for this machine
    pub id: Uuid,

    /// Foreign key to the customer that owns this machine
    pub owner_id: Uuid,

    /// Machine name, unique in inventory
    ///
    /// Also the source of the certificate distinguished name
    /// (`VirtualMachine-<name>`).
    pub name: String,

    /// Inventory path the machine was provisioned under
    pub item_path: String,

    /// Machine IP address, unique across all machines
    pub ip_address: String,

    /// Timestamp when the machine was registered
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last update
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker; `None` for live rows
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for registering a newly provisioned virtual machine.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVirtualMachine {
    /// Id of the owning customer
    pub owner_id: Uuid,

    /// Requested machine name; may be suffixed on collision
    pub name: String,

    /// Inventory path the machine lives under
    pub item_path: String,

    /// Machine IP address
    pub ip_address: String,
}

impl NewVirtualMachine {
    pub fn new(owner_id: Uuid, name: &str, item_path: &str, ip_address: &str) -> Self {
        Self {
            owner_id,
            name: name.to_owned(),
            item_path: item_path.to_owned(),
            ip_address: ip_address.to_owned(),
        }
    }
}
