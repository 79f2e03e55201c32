// src/contracts/mod.rs
//! Smart contract bindings and their in-process stand-ins.

pub mod credential_registry;
pub mod did_registry;
pub mod memory;

pub use credential_registry::{CredentialRegistry, RegistryContract};
pub use did_registry::EthrDidRegistry;
pub use memory::MemoryRegistry;
