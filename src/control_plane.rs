//! Consumed contract for the hypervisor control plane.
//!
//! The credential managers never talk to the control plane directly; they
//! go through the [`ControlPlane`] trait so tests can substitute a
//! deterministic fake. The shared handle is read-only from this
//! subsystem's perspective and is safe to share across concurrent
//! operations without locking.
//!
//! Deadlines are the caller's job: every trait method is a single raw
//! round-trip, and the managers wrap each call in `tokio::time::timeout`
//! with the deadline that operation carries. Dropping the timed-out future
//! cancels the in-flight call and releases its network resources.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::VirtualMachine;

/// Batched attribute fetch result, property-collector style.
///
/// Keys are the requested property paths (e.g. `name`, `guest`), values
/// their string renderings.
pub type AttributeSet = HashMap<String, String>;

/// Opaque reference to the host system a machine runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    /// Managed object reference of the host on the control plane
    pub moref: String,
}

impl HostRef {
    pub fn new(moref: &str) -> Self {
        Self {
            moref: moref.to_owned(),
        }
    }
}

/// Information about the certificate currently installed on a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCertificateInfo {
    /// Subject distinguished name of the installed certificate
    pub distinguished_name: String,

    /// Issuer distinguished name, when the host reports one
    pub issuer: Option<String>,

    /// Expiry of the installed certificate
    pub not_after: Option<DateTime<Utc>>,
}

/// Failures reported by the control plane itself.
///
/// These are raw transport-level outcomes; the managers log them with
/// context and wrap them into [`crate::error::AppError`] kinds before
/// returning to callers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControlPlaneError {
    /// The host system backing the machine could not be located.
    #[error("host system not found for {0}")]
    HostNotFound(String),

    /// No certificate is installed on the host.
    #[error("no certificate installed on host {0}")]
    CertificateNotFound(String),

    /// The submitted certificate is already the host's server certificate.
    ///
    /// Upload treats this as success (idempotent install).
    #[error("certificate already installed on host {0}")]
    AlreadyInstalled(String),

    /// The certificate authority rejected the signing request.
    #[error("signing request rejected: {0}")]
    SigningRejected(String),

    /// Transport failure talking to the control plane.
    #[error("control plane transport error: {0}")]
    Transport(String),
}

impl From<ControlPlaneError> for crate::error::AppError {
    fn from(err: ControlPlaneError) -> Self {
        use crate::error::AppError;
        match err {
            ControlPlaneError::HostNotFound(vm) => {
                AppError::NotFound(format!("host system for {vm}"))
            }
            ControlPlaneError::CertificateNotFound(host) => {
                AppError::NotFound(format!("certificate on host {host}"))
            }
            // Upload intercepts this before conversion; anywhere else it is
            // a genuine conflict.
            ControlPlaneError::AlreadyInstalled(host) => {
                AppError::Conflict(format!("certificate already installed on host {host}"))
            }
            ControlPlaneError::SigningRejected(reason) => AppError::Validation(reason),
            ControlPlaneError::Transport(reason) => AppError::Connectivity(reason),
        }
    }
}

/// Async contract with the host control-plane API.
///
/// One implementation wraps the real management endpoint; tests use a
/// scripted fake. Every method is a single logical round-trip with no
/// internal retry.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Resolve the host system currently running the given machine.
    async fn resolve_host_system(&self, vm: &VirtualMachine)
    -> Result<HostRef, ControlPlaneError>;

    /// Issue a certificate-signing request against the host's certificate
    /// authority endpoint, returning PEM-style content.
    async fn generate_signing_request(
        &self,
        host: &HostRef,
        distinguished_name: &str,
    ) -> Result<String, ControlPlaneError>;

    /// Install the given PEM content as the host's server certificate.
    async fn install_server_certificate(
        &self,
        host: &HostRef,
        pem: &str,
    ) -> Result<(), ControlPlaneError>;

    /// Read back information about the certificate installed on the host.
    async fn certificate_info(
        &self,
        host: &HostRef,
    ) -> Result<HostCertificateInfo, ControlPlaneError>;

    /// Batched read of named attributes of the machine's managed object.
    async fn retrieve_attributes(
        &self,
        vm: &VirtualMachine,
        fields: &[&str],
    ) -> Result<AttributeSet, ControlPlaneError>;
}
