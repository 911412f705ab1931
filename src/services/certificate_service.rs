//! Certificate lifecycle manager.
//!
//! Generates, uploads, and reads back SSH/TLS-style certificates against
//! the host system of one virtual machine. Every operation is a single
//! logical round-trip: one host resolution followed by one management-API
//! call, each under its own deadline, with no internal retry. Retry policy
//! belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::control_plane::{ControlPlane, ControlPlaneError, HostCertificateInfo, HostRef};
use crate::error::AppError;
use crate::models::VirtualMachine;

/// Fixed output file name for generated certificate material.
pub const CERTIFICATE_FILENAME: &str = "ssh_key.pub";

/// Deadline for certificate generation and installation calls.
const MANAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for reading back installed certificate info.
const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Certificate subject for a machine: `VirtualMachine-<name>`.
pub fn distinguished_name(vm: &VirtualMachine) -> String {
    format!("VirtualMachine-{}", vm.name)
}

/// An opaque signed-certificate blob plus its delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateCredentials {
    /// PEM-style certificate content
    pub content: Vec<u8>,

    /// File name the certificate is delivered under
    pub filename: String,

    /// Subject distinguished name the certificate was issued for
    pub distinguished_name: String,
}

impl CertificateCredentials {
    pub fn new(content: Vec<u8>, filename: &str, distinguished_name: String) -> Self {
        Self {
            content,
            filename: filename.to_owned(),
            distinguished_name,
        }
    }
}

/// Certificate operations against one machine's host system.
///
/// Holds a shared, never-mutated control-plane handle; concurrent
/// operations on different machines run in parallel without locking.
#[derive(Debug, Clone)]
pub struct CertificateService<C: ControlPlane> {
    control_plane: Arc<C>,
}

impl<C: ControlPlane> CertificateService<C> {
    pub fn new(control_plane: Arc<C>) -> Self {
        Self { control_plane }
    }

    /// Resolve the host system backing `vm`, bounded by `deadline`.
    async fn resolve_host(
        &self,
        vm: &VirtualMachine,
        deadline: Duration,
    ) -> Result<HostRef, AppError> {
        match timeout(deadline, self.control_plane.resolve_host_system(vm)).await {
            Ok(Ok(host)) => Ok(host),
            Ok(Err(e)) => {
                tracing::error!(vm = %vm.name, error = %e, "failed to resolve host system");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(vm = %vm.name, "host system resolution timed out");
                Err(AppError::Connectivity(format!(
                    "resolving host system for {} timed out",
                    vm.name
                )))
            }
        }
    }

    /// Issue a signing request for the machine and wrap the resulting PEM
    /// content under the fixed output file name.
    ///
    /// # Errors
    ///
    /// - `NotFound`/`Connectivity` if the host system cannot be resolved
    /// - `Validation` if the certificate authority rejects the request
    pub async fn generate(&self, vm: &VirtualMachine) -> Result<CertificateCredentials, AppError> {
        let host = self.resolve_host(vm, MANAGE_TIMEOUT).await?;
        let dn = distinguished_name(vm);

        let pem = match timeout(
            MANAGE_TIMEOUT,
            self.control_plane.generate_signing_request(&host, &dn),
        )
        .await
        {
            Ok(Ok(pem)) => pem,
            Ok(Err(e)) => {
                tracing::error!(vm = %vm.name, dn = %dn, error = %e, "signing request failed");
                return Err(e.into());
            }
            Err(_) => {
                tracing::error!(vm = %vm.name, dn = %dn, "signing request timed out");
                return Err(AppError::Connectivity(format!(
                    "signing request for {dn} timed out"
                )));
            }
        };

        tracing::info!(vm = %vm.name, dn = %dn, "certificate generated");
        Ok(CertificateCredentials::new(
            pem.into_bytes(),
            CERTIFICATE_FILENAME,
            dn,
        ))
    }

    /// Install the certificate as the host's server certificate.
    ///
    /// Idempotent: re-installing a certificate that is already in place is
    /// success, not a failure. All failures are logged before returning.
    pub async fn upload(
        &self,
        vm: &VirtualMachine,
        credentials: &CertificateCredentials,
    ) -> Result<(), AppError> {
        let host = self.resolve_host(vm, MANAGE_TIMEOUT).await?;

        let pem = std::str::from_utf8(&credentials.content).map_err(|_| {
            AppError::Validation("certificate content is not valid UTF-8".to_string())
        })?;

        match timeout(
            MANAGE_TIMEOUT,
            self.control_plane.install_server_certificate(&host, pem),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::info!(vm = %vm.name, host = %host.moref, "certificate installed");
                Ok(())
            }
            Ok(Err(ControlPlaneError::AlreadyInstalled(_))) => {
                tracing::debug!(vm = %vm.name, host = %host.moref, "certificate already installed");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(vm = %vm.name, host = %host.moref, error = %e, "certificate installation failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(vm = %vm.name, host = %host.moref, "certificate installation timed out");
                Err(AppError::Connectivity(format!(
                    "installing certificate on host of {} timed out",
                    vm.name
                )))
            }
        }
    }

    /// Read back info about the certificate currently installed on the
    /// machine's host.
    ///
    /// A missing host or certificate is logged and returned as `NotFound`,
    /// never swallowed.
    pub async fn public_certificate(
        &self,
        vm: &VirtualMachine,
        filename: &str,
    ) -> Result<HostCertificateInfo, AppError> {
        let host = self.resolve_host(vm, READ_TIMEOUT).await?;

        match timeout(READ_TIMEOUT, self.control_plane.certificate_info(&host)).await {
            Ok(Ok(info)) => {
                tracing::debug!(vm = %vm.name, filename = %filename, dn = %info.distinguished_name, "certificate info retrieved");
                Ok(info)
            }
            Ok(Err(e)) => {
                tracing::error!(vm = %vm.name, filename = %filename, error = %e, "failed to read installed certificate");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(vm = %vm.name, filename = %filename, "certificate read timed out");
                Err(AppError::Connectivity(format!(
                    "reading certificate of {} timed out",
                    vm.name
                )))
            }
        }
    }
}
