//! Credential managers and the strategy dispatch over them.

pub mod certificate_service;
pub mod root_credentials_service;
pub mod strategy;

pub use certificate_service::{CertificateCredentials, CertificateService, CERTIFICATE_FILENAME};
pub use root_credentials_service::{RootCredentials, RootCredentialsService, ROOT_USERNAME};
pub use strategy::{CredentialProvisioner, CredentialStrategy, Credentials, RetrievedCredentials};
