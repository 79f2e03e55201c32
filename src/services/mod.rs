// src/services/mod.rs
//! Credential services: building, verification, registry access, workflow
//! orchestration and the HTTP API.

pub mod api_server;
pub mod credential_issuer;
pub mod lifecycle;
pub mod registry_client;
pub mod verifier;

pub use api_server::ApiServer;
pub use lifecycle::{
    BatchIssuance, BatchSummary, IssueRequest, Issued, Orchestrator, Outcome, Revocation,
    VerifiedCredential,
};
pub use registry_client::{fingerprint, RegistryClient};
