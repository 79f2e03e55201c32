// src/storage/memory.rs
//! In-memory content store.
//!
//! Honours the same `put`/`get` contract as the IPFS store, so either can be
//! plugged into [`ContentAddressing`](crate::storage::ContentAddressing).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::Error;
use crate::storage::content_address::{address_of, ContentAddress};
use crate::storage::ContentStore;

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentAddress, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `get` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Overwrites the blob at `address`, bypassing addressing. Test hook for
    /// simulating a store that returns the wrong content.
    pub fn tamper(&self, address: &ContentAddress, bytes: Vec<u8>) {
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(*address, bytes);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentAddress, Error> {
        let address = address_of(&bytes)?;
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(address)
            .or_insert(bytes);
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(address)
            .cloned()
            .ok_or_else(|| Error::not_found("content", address.to_string()))
    }
}
