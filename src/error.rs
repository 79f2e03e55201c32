// src/error.rs
//! Error taxonomy for the credential lifecycle.
//!
//! Every component returns [`Error`] with the most specific variant it can
//! name. The orchestrator wraps it in a [`WorkflowError`] that records which
//! step failed, and the public workflow calls turn that into a failure
//! envelope instead of propagating it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All failures the pipeline can surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Wallet address is not `0x` followed by 40 hex digits.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Credential payload or issuance request is malformed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The wallet returned something that is not a hex string.
    #[error("wallet returned a non-hex signature: {0}")]
    InvalidHexSignature(String),

    /// The wallet refused or failed to sign.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The resolution network failed or does not know the method/network.
    #[error("DID resolution failed: {0}")]
    ResolutionError(String),

    /// The issuer DID of a credential could not be resolved.
    #[error("unknown issuer {did}: {reason}")]
    UnknownIssuer { did: String, reason: String },

    /// The signed artifact could not be parsed.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// The signature does not match any verification method of the issuer.
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    /// A DID document, stored content or registry record does not exist.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// A record already exists for this fingerprint.
    #[error("credential {0} is already registered")]
    AlreadyRegistered(String),

    /// The record was revoked before.
    #[error("credential {0} is already revoked")]
    AlreadyRevoked(String),

    /// No contract code at the configured registry address.
    #[error("no registry contract deployed at {address} on the current network")]
    RegistryNotDeployed { address: String },

    /// The pre-flight code lookup itself failed.
    #[error("registry unreachable: {0}")]
    RegistryUnreachable(String),

    /// Submitting or confirming an on-chain transaction failed.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// The credential is revoked in the registry.
    #[error("credential {0} has been revoked")]
    Revoked(String),

    /// The credential's `exp` lies in the past.
    #[error("credential expired at {0}")]
    Expired(i64),

    /// Stored content does not hash to the address it was fetched by.
    #[error("content mismatch: expected {expected}, got {actual}")]
    ContentMismatch { expected: String, actual: String },

    /// Transport or encoding failure of the content store.
    #[error("content store error: {0}")]
    Storage(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Maps the error onto the closed, serializable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAddress(_) | Error::InvalidPayload(_) => ErrorKind::InvalidInput,
            Error::InvalidHexSignature(_) => ErrorKind::InvalidHexSignature,
            Error::SigningFailed(_) => ErrorKind::SigningFailed,
            Error::ResolutionError(_) => ErrorKind::ResolutionError,
            Error::UnknownIssuer { .. } => ErrorKind::UnknownIssuer,
            Error::MalformedCredential(_) => ErrorKind::MalformedCredential,
            Error::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Error::AlreadyRevoked(_) => ErrorKind::AlreadyRevoked,
            Error::RegistryNotDeployed { .. } => ErrorKind::RegistryNotDeployed,
            Error::RegistryUnreachable(_) => ErrorKind::RegistryUnreachable,
            Error::TransactionFailed(_) => ErrorKind::TransactionFailed,
            Error::Revoked(_) => ErrorKind::Revoked,
            Error::Expired(_) => ErrorKind::Expired,
            Error::ContentMismatch { .. } => ErrorKind::ContentMismatch,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Closed error taxonomy rendered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    InvalidHexSignature,
    SigningFailed,
    ResolutionError,
    UnknownIssuer,
    MalformedCredential,
    SignatureInvalid,
    NotFound,
    AlreadyRegistered,
    AlreadyRevoked,
    RegistryNotDeployed,
    RegistryUnreachable,
    TransactionFailed,
    Revoked,
    Expired,
    ContentMismatch,
    Storage,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A component error annotated with the workflow step it happened in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step} failed: {error}")]
pub struct WorkflowError {
    pub step: &'static str,
    #[source]
    pub error: Error,
}

impl WorkflowError {
    pub fn new(step: &'static str, error: Error) -> Self {
        Self { step, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}
