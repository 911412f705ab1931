//! Root credential manager.
//!
//! Produces a random root secret for a machine and fetches the guest
//! metadata needed to authenticate with it. The plaintext secret is
//! returned to the caller exactly once; only its bcrypt hash is ever
//! persisted. Delivering the plaintext over a secure channel is the
//! caller's responsibility.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use uuid::Uuid;

use crate::control_plane::ControlPlane;
use crate::error::AppError;
use crate::models::{SshPublicKey, VirtualMachine};
use crate::repository::SshKeyStore;

/// Root credentials always authenticate as this account.
pub const ROOT_USERNAME: &str = "root";

/// Deadline for the batched guest attribute fetch.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Properties requested from the control plane's property collector.
const GUEST_ATTRIBUTES: [&str; 2] = ["name", "guest"];

/// A username/password pair for root login, plus the hash that gets stored.
///
/// `password` is the plaintext, handed out once and never persisted;
/// `password_hash` is what the repository layer keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCredentials {
    /// Always `root`
    pub username: String,

    /// Plaintext secret, returned once to the caller
    pub password: String,

    /// bcrypt hash of the secret, the only form that is persisted
    pub password_hash: String,
}

/// Root credential operations for one machine.
#[derive(Debug, Clone)]
pub struct RootCredentialsService<C: ControlPlane, K: SshKeyStore> {
    control_plane: Arc<C>,
    keys: Arc<K>,
    secret_cost: u32,
}

impl<C: ControlPlane, K: SshKeyStore> RootCredentialsService<C, K> {
    /// `secret_cost` is the bcrypt cost factor for generated secrets
    /// (see `Config::root_secret_cost`, default 15).
    pub fn new(control_plane: Arc<C>, keys: Arc<K>, secret_cost: u32) -> Self {
        Self {
            control_plane,
            keys,
            secret_cost,
        }
    }

    /// Generate a fresh root secret and confirm the machine's guest
    /// metadata is reachable.
    ///
    /// The secret is a collision-resistant random identifier fed through
    /// bcrypt at the configured cost. The credential pair is returned only
    /// if the attribute fetch succeeds; a fetch failure or its 10s deadline
    /// expiring surfaces as `MetadataRetrieval`.
    pub async fn generate(&self, vm: &VirtualMachine) -> Result<RootCredentials, AppError> {
        let plaintext = Uuid::new_v4().to_string();
        let password_hash = bcrypt::hash(&plaintext, self.secret_cost)?;

        let attributes = match timeout(
            METADATA_TIMEOUT,
            self.control_plane.retrieve_attributes(vm, &GUEST_ATTRIBUTES),
        )
        .await
        {
            Ok(Ok(attributes)) => attributes,
            Ok(Err(e)) => {
                tracing::error!(vm = %vm.name, error = %e, "guest attribute fetch failed");
                return Err(AppError::MetadataRetrieval(e.to_string()));
            }
            Err(_) => {
                tracing::error!(vm = %vm.name, "guest attribute fetch timed out");
                return Err(AppError::MetadataRetrieval(format!(
                    "attribute fetch for {} timed out",
                    vm.name
                )));
            }
        };

        tracing::debug!(
            vm = %vm.name,
            guest = attributes.get("guest").map(String::as_str).unwrap_or("unknown"),
            "root credentials generated"
        );

        Ok(RootCredentials {
            username: ROOT_USERNAME.to_string(),
            password: plaintext,
            password_hash,
        })
    }

    /// Read the persisted credential reference for a machine.
    ///
    /// Pure repository lookup; no control-plane call.
    pub async fn stored_credentials(&self, vm_id: Uuid) -> Result<Option<SshPublicKey>, AppError> {
        self.keys.get_by_vm(vm_id).await
    }
}
