//! Shared fixtures: a scriptable control-plane fake and in-memory stores.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vm_credential_service::control_plane::{
    AttributeSet, ControlPlane, ControlPlaneError, HostCertificateInfo, HostRef,
};
use vm_credential_service::error::AppError;
use vm_credential_service::models::{
    Customer, NewCustomer, NewSshPublicKey, NewVirtualMachine, SshPublicKey, VirtualMachine,
};
use vm_credential_service::repository::virtual_machines::disambiguate_name;
use vm_credential_service::repository::{CustomerStore, SshKeyStore, VirtualMachineStore};

/// Certificate currently installed on a fake host.
struct InstalledCert {
    pem: String,
    distinguished_name: String,
}

/// Scriptable stand-in for the hypervisor control plane.
///
/// By default every call succeeds; the `failing_*` constructors flip one
/// failure mode. `with_stall` makes every call sleep first, for deadline
/// tests under a paused clock.
#[derive(Default)]
pub struct MockControlPlane {
    stall: Option<Duration>,
    fail_resolution: bool,
    reject_signing: bool,
    fail_attributes: bool,
    installed: Mutex<HashMap<String, InstalledCert>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = Some(stall);
        self
    }

    pub fn failing_resolution(mut self) -> Self {
        self.fail_resolution = true;
        self
    }

    pub fn rejecting_signing(mut self) -> Self {
        self.reject_signing = true;
        self
    }

    pub fn failing_attributes(mut self) -> Self {
        self.fail_attributes = true;
        self
    }

    async fn maybe_stall(&self) {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn resolve_host_system(
        &self,
        vm: &VirtualMachine,
    ) -> Result<HostRef, ControlPlaneError> {
        self.maybe_stall().await;
        if self.fail_resolution {
            return Err(ControlPlaneError::HostNotFound(vm.name.clone()));
        }
        Ok(HostRef::new(&format!("host-{}", vm.name)))
    }

    async fn generate_signing_request(
        &self,
        _host: &HostRef,
        distinguished_name: &str,
    ) -> Result<String, ControlPlaneError> {
        self.maybe_stall().await;
        if self.reject_signing {
            return Err(ControlPlaneError::SigningRejected(
                "certificate authority refused the request".to_string(),
            ));
        }
        Ok(format!(
            "-----BEGIN CERTIFICATE-----\n{distinguished_name}\n-----END CERTIFICATE-----\n"
        ))
    }

    async fn install_server_certificate(
        &self,
        host: &HostRef,
        pem: &str,
    ) -> Result<(), ControlPlaneError> {
        self.maybe_stall().await;
        let mut installed = self.installed.lock().unwrap();
        if let Some(existing) = installed.get(&host.moref) {
            if existing.pem == pem {
                return Err(ControlPlaneError::AlreadyInstalled(host.moref.clone()));
            }
        }
        // The mock issues PEM with the subject on the middle line
        let distinguished_name = pem.lines().nth(1).unwrap_or_default().to_string();
        installed.insert(
            host.moref.clone(),
            InstalledCert {
                pem: pem.to_string(),
                distinguished_name,
            },
        );
        Ok(())
    }

    async fn certificate_info(
        &self,
        host: &HostRef,
    ) -> Result<HostCertificateInfo, ControlPlaneError> {
        self.maybe_stall().await;
        let installed = self.installed.lock().unwrap();
        match installed.get(&host.moref) {
            Some(cert) => Ok(HostCertificateInfo {
                distinguished_name: cert.distinguished_name.clone(),
                issuer: Some("CN=mock-ca".to_string()),
                not_after: None,
            }),
            None => Err(ControlPlaneError::CertificateNotFound(host.moref.clone())),
        }
    }

    async fn retrieve_attributes(
        &self,
        vm: &VirtualMachine,
        fields: &[&str],
    ) -> Result<AttributeSet, ControlPlaneError> {
        self.maybe_stall().await;
        if self.fail_attributes {
            return Err(ControlPlaneError::Transport(
                "property collector unavailable".to_string(),
            ));
        }
        let mut attributes = AttributeSet::new();
        for field in fields {
            match *field {
                "name" => {
                    attributes.insert("name".to_string(), vm.name.clone());
                }
                "guest" => {
                    attributes.insert("guest".to_string(), "otherGuest64".to_string());
                }
                _ => {}
            }
        }
        Ok(attributes)
    }
}

/// In-memory customer store with the same conflict semantics as Postgres.
#[derive(Default)]
pub struct InMemoryCustomerStore {
    rows: Mutex<HashMap<Uuid, Customer>>,
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn create(&self, new: NewCustomer) -> Result<Customer, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|c| c.username == new.username || c.email == new.email)
        {
            return Err(AppError::Conflict(format!(
                "customer {} already exists",
                new.username
            )));
        }
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        // Absent row is success, like the two-phase Postgres delete
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// In-memory virtual machine store, including the name-suffixing policy.
#[derive(Default)]
pub struct InMemoryVirtualMachineStore {
    rows: Mutex<HashMap<Uuid, VirtualMachine>>,
    keys: Option<Arc<InMemorySshKeyStore>>,
}

impl InMemoryVirtualMachineStore {
    /// Link a key store so machine deletes drop key material too,
    /// mirroring the transactional purge in the Postgres store.
    pub fn with_keys(keys: Arc<InMemorySshKeyStore>) -> Self {
        Self {
            rows: Mutex::default(),
            keys: Some(keys),
        }
    }
}

#[async_trait]
impl VirtualMachineStore for InMemoryVirtualMachineStore {
    async fn create(&self, new: NewVirtualMachine) -> Result<VirtualMachine, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|vm| vm.owner_id == new.owner_id) {
            return Err(AppError::Conflict(
                "owner slot already occupied".to_string(),
            ));
        }
        if rows.values().any(|vm| vm.ip_address == new.ip_address) {
            return Err(AppError::Conflict("ip address already in use".to_string()));
        }
        let mut name = new.name.clone();
        while rows.values().any(|vm| vm.name == name) {
            name = disambiguate_name(&new.name);
        }
        let now = Utc::now();
        let vm = VirtualMachine {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name,
            item_path: new.item_path,
            ip_address: new.ip_address,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.insert(vm.id, vm.clone());
        Ok(vm)
    }

    async fn get(&self, id: Uuid) -> Result<Option<VirtualMachine>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.lock().unwrap().remove(&id);
        // Key material leaves with the machine, absent rows included
        if let Some(keys) = &self.keys {
            keys.rows.lock().unwrap().remove(&id);
        }
        Ok(())
    }
}

/// In-memory key store enforcing one row per machine via its map key.
#[derive(Default)]
pub struct InMemorySshKeyStore {
    rows: Mutex<HashMap<Uuid, SshPublicKey>>,
}

impl InMemorySshKeyStore {
    /// Number of live key rows, for invariant assertions.
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SshKeyStore for InMemorySshKeyStore {
    async fn upsert(&self, new: NewSshPublicKey) -> Result<SshPublicKey, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let row = rows
            .entry(new.virtual_machine_id)
            .and_modify(|row| {
                row.key = Some(new.key.clone());
                row.filename = new.filename.clone();
                row.updated_at = now;
            })
            .or_insert_with(|| SshPublicKey {
                id: Uuid::new_v4(),
                virtual_machine_id: new.virtual_machine_id,
                key: Some(new.key.clone()),
                filename: new.filename.clone(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            });
        Ok(row.clone())
    }

    async fn get_by_vm(&self, vm_id: Uuid) -> Result<Option<SshPublicKey>, AppError> {
        Ok(self.rows.lock().unwrap().get(&vm_id).cloned())
    }

    async fn delete_by_vm(&self, vm_id: Uuid) -> Result<(), AppError> {
        self.rows.lock().unwrap().remove(&vm_id);
        Ok(())
    }
}
