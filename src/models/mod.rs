//! Entity models for the credential subsystem.

pub mod customer;
pub mod ssh_key;
pub mod virtual_machine;

pub use customer::{Customer, NewCustomer};
pub use ssh_key::{NewSshPublicKey, SshPublicKey};
pub use virtual_machine::{NewVirtualMachine, VirtualMachine};
