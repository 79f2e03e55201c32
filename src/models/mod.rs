// src/models/mod.rs
//! Data structures shared by every layer.

pub mod credential;
pub mod did;
pub mod registry;

pub use credential::{ClaimValue, Claims, CredentialPayload, SignedCredential, VerificationResult};
pub use did::{Did, DidDocument, VerificationMethod};
pub use registry::{Fingerprint, RegistryRecord, TxRef};
