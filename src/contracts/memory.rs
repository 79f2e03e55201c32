// src/contracts/memory.rs
//! In-process stand-in for the registry contract.
//!
//! Mirrors the contract's observable behaviour: `msg.sender` becomes the
//! issuer, duplicate issuance and revoking unknown ids revert, and a
//! registry can be flagged as not deployed so the client's pre-flight check
//! fails the way it does against a wrong network.

use async_trait::async_trait;
use chrono::Utc;
use ethers_core::types::{Address, H256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::contracts::credential_registry::RegistryContract;
use crate::error::Error;
use crate::models::registry::{Fingerprint, RegistryRecord, TxRef};
use crate::utils::crypto::hash_data;

/// Placeholder runtime bytecode reported by a deployed memory registry.
const DEPLOYED_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

#[derive(Debug)]
pub struct MemoryRegistry {
    address: Address,
    sender: Address,
    deployed: AtomicBool,
    nonce: AtomicU64,
    records: Mutex<HashMap<Fingerprint, RegistryRecord>>,
}

impl MemoryRegistry {
    /// A deployed registry at `address` whose transactions are sent by
    /// `sender`.
    pub fn new(address: Address, sender: Address) -> Self {
        Self {
            address,
            sender,
            deployed: AtomicBool::new(true),
            nonce: AtomicU64::new(0),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// A registry address with no code behind it.
    pub fn undeployed(address: Address, sender: Address) -> Self {
        let registry = Self::new(address, sender);
        registry.set_deployed(false);
        registry
    }

    pub fn set_deployed(&self, deployed: bool) {
        self.deployed.store(deployed, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Fingerprint, RegistryRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_tx(&self, fingerprint: &Fingerprint) -> TxRef {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut preimage = fingerprint.as_bytes().to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        TxRef(H256::from(hash_data(&preimage)))
    }

    fn ensure_deployed(&self) -> Result<(), Error> {
        if self.deployed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::TransactionFailed("call to non-contract account".into()))
        }
    }
}

#[async_trait]
impl RegistryContract for MemoryRegistry {
    fn address(&self) -> Address {
        self.address
    }

    async fn code(&self) -> Result<Vec<u8>, Error> {
        if self.deployed.load(Ordering::SeqCst) {
            Ok(DEPLOYED_CODE.to_vec())
        } else {
            Ok(Vec::new())
        }
    }

    async fn issue_credential(
        &self,
        fingerprint: &Fingerprint,
        content_address: &str,
        subject_did: &str,
    ) -> Result<TxRef, Error> {
        self.ensure_deployed()?;
        let mut records = self.lock();
        if records.contains_key(fingerprint) {
            return Err(Error::TransactionFailed("execution reverted: credential exists".into()));
        }
        records.insert(
            *fingerprint,
            RegistryRecord {
                fingerprint: *fingerprint,
                content_address: content_address.to_string(),
                issuer: self.sender,
                subject_did: subject_did.to_string(),
                timestamp: Utc::now().timestamp().max(0) as u64,
                revoked: false,
            },
        );
        Ok(self.next_tx(fingerprint))
    }

    async fn get_credential(&self, fingerprint: &Fingerprint) -> Result<Option<RegistryRecord>, Error> {
        if !self.deployed.load(Ordering::SeqCst) {
            // eth_call against an empty account decodes to nothing.
            return Err(Error::RegistryUnreachable("empty return data".into()));
        }
        Ok(self.lock().get(fingerprint).cloned())
    }

    async fn revoke_credential(&self, fingerprint: &Fingerprint) -> Result<TxRef, Error> {
        self.ensure_deployed()?;
        let mut records = self.lock();
        let record = records
            .get_mut(fingerprint)
            .ok_or_else(|| Error::TransactionFailed("execution reverted: unknown credential".into()))?;
        if record.revoked {
            return Err(Error::TransactionFailed("execution reverted: already revoked".into()));
        }
        record.revoked = true;
        drop(records);
        Ok(self.next_tx(fingerprint))
    }
}
