//! Credential strategy selection and dispatch.
//!
//! The two ways of establishing machine access — a signed certificate or a
//! root password — share the capability set {generate, upload, retrieve}.
//! [`CredentialStrategy`] is a closed tag dispatched by pattern match; a
//! future variant extends the enum and the match arms here without
//! touching any call site.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::control_plane::{ControlPlane, HostCertificateInfo};
use crate::error::AppError;
use crate::models::{NewSshPublicKey, SshPublicKey, VirtualMachine};
use crate::repository::SshKeyStore;

use super::certificate_service::{CertificateCredentials, CertificateService};
use super::root_credentials_service::{RootCredentials, RootCredentialsService};

/// File name the hashed root secret is stored under.
const ROOT_SECRET_FILENAME: &str = "root_password";

/// Which credential-establishment algorithm a machine uses.
///
/// The two strategies are mutually exclusive per machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStrategy {
    /// Signed certificate installed on the machine's host system.
    Certificate,
    /// Random root password injected by the guest provisioning transport.
    RootPassword,
}

/// Credential material produced by `generate`, tagged by strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Credentials {
    Certificate(CertificateCredentials),
    RootPassword(RootCredentials),
}

/// What `retrieve` hands back, tagged by strategy.
#[derive(Debug, Clone)]
pub enum RetrievedCredentials {
    /// Info about the certificate currently installed on the host.
    Certificate(HostCertificateInfo),
    /// The persisted credential reference for the machine.
    Stored(SshPublicKey),
}

/// Strategy-dispatched façade over the two credential managers.
///
/// Owns the shared control-plane handle and the key store; after a
/// successful `generate` it persists the result (certificate blob) or its
/// hash (root secret) as the machine's single key row.
#[derive(Debug, Clone)]
pub struct CredentialProvisioner<C: ControlPlane, K: SshKeyStore> {
    certificates: CertificateService<C>,
    root_credentials: RootCredentialsService<C, K>,
    keys: Arc<K>,
}

impl<C: ControlPlane, K: SshKeyStore> CredentialProvisioner<C, K> {
    pub fn new(control_plane: Arc<C>, keys: Arc<K>, root_secret_cost: u32) -> Self {
        Self {
            certificates: CertificateService::new(Arc::clone(&control_plane)),
            root_credentials: RootCredentialsService::new(
                control_plane,
                Arc::clone(&keys),
                root_secret_cost,
            ),
            keys,
        }
    }

    /// Produce credential material for the machine and persist it.
    ///
    /// Certificate strategy stores the PEM blob; root-password strategy
    /// stores only the bcrypt hash — the plaintext leaves through the
    /// returned value and nowhere else. Persisting overwrites the
    /// machine's key row in place (rotation, not accumulation).
    pub async fn generate(
        &self,
        vm: &VirtualMachine,
        strategy: CredentialStrategy,
    ) -> Result<Credentials, AppError> {
        match strategy {
            CredentialStrategy::Certificate => {
                let credentials = self.certificates.generate(vm).await?;
                self.keys
                    .upsert(NewSshPublicKey::new(
                        vm.id,
                        &credentials.content,
                        &credentials.filename,
                    )?)
                    .await?;
                Ok(Credentials::Certificate(credentials))
            }
            CredentialStrategy::RootPassword => {
                let credentials = self.root_credentials.generate(vm).await?;
                self.keys
                    .upsert(NewSshPublicKey::new(
                        vm.id,
                        credentials.password_hash.as_bytes(),
                        ROOT_SECRET_FILENAME,
                    )?)
                    .await?;
                Ok(Credentials::RootPassword(credentials))
            }
        }
    }

    /// Push generated material to the machine's host where the strategy
    /// requires it.
    ///
    /// Certificates are installed on the host system; root passwords are
    /// injected by the consuming guest-provisioning transport, so that arm
    /// is a successful no-op here.
    pub async fn upload(
        &self,
        vm: &VirtualMachine,
        credentials: &Credentials,
    ) -> Result<(), AppError> {
        match credentials {
            Credentials::Certificate(certificate) => {
                self.certificates.upload(vm, certificate).await
            }
            Credentials::RootPassword(_) => {
                tracing::debug!(vm = %vm.name, "root password strategy has no upload step");
                Ok(())
            }
        }
    }

    /// Read back the machine's current credential state.
    pub async fn retrieve(
        &self,
        vm: &VirtualMachine,
        strategy: CredentialStrategy,
    ) -> Result<RetrievedCredentials, AppError> {
        match strategy {
            CredentialStrategy::Certificate => {
                // The stored row supplies the delivery filename when present
                let filename = self
                    .keys
                    .get_by_vm(vm.id)
                    .await?
                    .map(|key| key.filename)
                    .unwrap_or_else(|| super::CERTIFICATE_FILENAME.to_string());

                let info = self.certificates.public_certificate(vm, &filename).await?;
                Ok(RetrievedCredentials::Certificate(info))
            }
            CredentialStrategy::RootPassword => {
                let stored = self
                    .root_credentials
                    .stored_credentials(vm.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("stored credentials for machine {}", vm.id))
                    })?;
                Ok(RetrievedCredentials::Stored(stored))
            }
        }
    }
}
