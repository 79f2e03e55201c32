// src/storage/mod.rs
//! Content addressing and the content stores behind it.

pub mod content_address;
pub mod ipfs_client;
pub mod memory;

pub use content_address::{address_of, ContentAddress};
pub use ipfs_client::IpfsContentStore;
pub use memory::MemoryContentStore;

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::error::Error;

/// External content store: `put(bytes) -> address`, `get(address) -> bytes`.
///
/// Implementations must key content by [`address_of`] and treat repeated
/// `put`s of the same bytes as a no-op. `get` fails with `NotFound` for
/// addresses that were never stored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentAddress, Error>;

    async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, Error>;
}

/// Content addressing component.
///
/// Computes addresses locally and holds the store to them in both
/// directions: the store's answer to `put` must be the computed address, and
/// bytes returned by `get` must hash back to the requested address.
#[derive(Clone)]
pub struct ContentAddressing {
    store: Arc<dyn ContentStore>,
}

impl ContentAddressing {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Stores `bytes` and returns their address.
    ///
    /// # Errors
    /// - `ContentMismatch` if the store answers with a different address
    /// - `Storage` for transport failures
    pub async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, Error> {
        let expected = address_of(bytes)?;
        let actual = self.store.put(bytes.to_vec()).await?;
        if actual != expected {
            return Err(Error::ContentMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        debug!("Stored {} bytes at {expected}", bytes.len());
        Ok(expected)
    }

    /// Fetches the bytes stored at `address`.
    ///
    /// # Errors
    /// - `NotFound` if nothing was stored there
    /// - `ContentMismatch` if the returned bytes hash to another address
    pub async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, Error> {
        let bytes = self.store.get(address).await?;
        let actual = address_of(&bytes)?;
        if actual != *address {
            return Err(Error::ContentMismatch {
                expected: address.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn addressing() -> (Arc<MemoryContentStore>, ContentAddressing) {
        let store = Arc::new(MemoryContentStore::new());
        (store.clone(), ContentAddressing::new(store))
    }

    #[tokio::test]
    async fn get_returns_what_put_stored() {
        let (_, content) = addressing();
        let address = assert_ok!(content.put(b"signed credential").await);
        assert_eq!(assert_ok!(content.get(&address).await), b"signed credential");
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let (store, content) = addressing();
        let first = assert_ok!(content.put(b"same").await);
        let second = assert_ok!(content.put(b"same").await);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_addresses_are_not_found() {
        let (_, content) = addressing();
        let address = address_of(b"never stored").unwrap();
        assert!(matches!(content.get(&address).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn detects_a_store_returning_other_bytes() {
        let (store, content) = addressing();
        let address = assert_ok!(content.put(b"original").await);
        store.tamper(&address, b"forged".to_vec());
        assert!(matches!(content.get(&address).await, Err(Error::ContentMismatch { .. })));
    }
}
