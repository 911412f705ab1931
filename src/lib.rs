//! VM Credential Service - machine-access credential lifecycle.
//!
//! This library manages SSH certificates and root login secrets for virtual
//! machines on a hypervisor control plane, on behalf of tenant-owning
//! customers. It is invoked by an outer service layer; it defines no HTTP
//! or CLI surface of its own.
//!
//! # Architecture
//!
//! - **Models + Repository**: Customer / VirtualMachine / SSHPublicKey over
//!   PostgreSQL with sqlx, behind store traits
//! - **Control plane**: consumed async contract for host resolution,
//!   certificate management, and attribute fetches
//! - **Managers**: certificate lifecycle and root credentials, each call
//!   under its own deadline
//! - **Strategy**: certificate vs. root password, dispatched by tag
//!
//! # Typical Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build a `CredentialProvisioner` with the control-plane handle
//! 4. Generate, upload, and retrieve credentials per machine

pub mod config;
pub mod control_plane;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

use tracing_subscriber::EnvFilter;

/// Initialize logging with a tracing subscriber.
///
/// Reads the `RUST_LOG` environment variable (defaults to "info" level).
/// Call once from the embedding service's entry point.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
