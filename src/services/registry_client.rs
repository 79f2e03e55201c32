// src/services/registry_client.rs
//! Registry client.
//!
//! Maps credential fingerprints onto registry records and enforces the
//! record rules the contract surface does not: one registration per
//! fingerprint, and revocation only once. Every call starts with a
//! pre-flight check that a contract is deployed at the configured address.

use ethers_core::utils::to_checksum;
use log::{debug, info};
use std::sync::Arc;

use crate::contracts::credential_registry::RegistryContract;
use crate::error::Error;
use crate::models::credential::SignedCredential;
use crate::models::registry::{Fingerprint, RegistryRecord, TxRef};
use crate::storage::content_address::ContentAddress;
use crate::utils::crypto::hash_data;

/// Keccak-256 of the signed artifact's UTF-8 bytes.
pub fn fingerprint(signed: &SignedCredential) -> Fingerprint {
    Fingerprint::from_bytes(hash_data(signed.as_bytes()))
}

#[derive(Clone)]
pub struct RegistryClient {
    contract: Arc<dyn RegistryContract>,
}

impl RegistryClient {
    pub fn new(contract: Arc<dyn RegistryContract>) -> Self {
        Self { contract }
    }

    /// Fails unless contract code exists at the registry address.
    ///
    /// # Errors
    /// - `RegistryUnreachable` if the code lookup fails
    /// - `RegistryNotDeployed` if the address holds no code
    pub async fn preflight(&self) -> Result<(), Error> {
        let code = self.contract.code().await.map_err(|e| match e {
            Error::RegistryUnreachable(reason) => Error::RegistryUnreachable(reason),
            other => Error::RegistryUnreachable(other.to_string()),
        })?;
        if code.is_empty() {
            return Err(Error::RegistryNotDeployed {
                address: to_checksum(&self.contract.address(), None),
            });
        }
        Ok(())
    }

    /// Records `fingerprint` with its content address and subject.
    ///
    /// # Errors
    /// - `AlreadyRegistered` if a record exists
    /// - `TransactionFailed` if the submission fails or reverts
    pub async fn register(
        &self,
        fingerprint: &Fingerprint,
        content_address: &ContentAddress,
        subject_did: &str,
    ) -> Result<TxRef, Error> {
        self.preflight().await?;
        if self.contract.get_credential(fingerprint).await?.is_some() {
            return Err(Error::AlreadyRegistered(fingerprint.to_string()));
        }

        let tx = self
            .contract
            .issue_credential(fingerprint, &content_address.to_string(), subject_did)
            .await
            .map_err(as_transaction_failure)?;
        info!("Registered credential {fingerprint} in {tx}");
        Ok(tx)
    }

    /// # Errors
    /// `NotFound` if the fingerprint was never registered.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<RegistryRecord, Error> {
        self.preflight().await?;
        let record = self
            .contract
            .get_credential(fingerprint)
            .await?
            .ok_or_else(|| Error::not_found("credential", fingerprint.to_string()))?;
        debug!("Credential {fingerprint} found, revoked = {}", record.revoked);
        Ok(record)
    }

    /// Marks the record of `fingerprint` as revoked.
    ///
    /// # Errors
    /// - `NotFound` if the fingerprint was never registered
    /// - `AlreadyRevoked` if it is revoked already
    /// - `TransactionFailed` if the submission fails or reverts
    pub async fn revoke(&self, fingerprint: &Fingerprint) -> Result<TxRef, Error> {
        let record = self.lookup(fingerprint).await?;
        if record.revoked {
            return Err(Error::AlreadyRevoked(fingerprint.to_string()));
        }

        let tx = self
            .contract
            .revoke_credential(fingerprint)
            .await
            .map_err(as_transaction_failure)?;
        info!("Revoked credential {fingerprint} in {tx}");
        Ok(tx)
    }
}

fn as_transaction_failure(err: Error) -> Error {
    match err {
        Error::RegistryUnreachable(_) | Error::TransactionFailed(_) => err,
        other => Error::TransactionFailed(other.to_string()),
    }
}
