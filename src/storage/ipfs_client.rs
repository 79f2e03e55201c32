// src/storage/ipfs_client.rs
//! IPFS content store.
//!
//! Talks to an IPFS node's HTTP API (`/api/v0/add`, `/api/v0/cat`).
//!
//! # Features
//! - Adds content as a single raw-leaf CIDv1 block, so the node's CID equals
//!   the locally computed [`ContentAddress`]. Content larger than one chunk
//!   ([`MAX_CONTENT_LEN`]) would get a dag-pb root instead and is refused
//! - Streams `cat` responses into one buffer
//! - Bounded by a per-call timeout
//!
//! # Security Considerations
//! - All stored data is public by default (IPFS is a public network)
//! - Credentials contain their claims in clear text

use async_trait::async_trait;
use bytes::BytesMut;
use futures::TryStreamExt;
use ipfs_api_backend_hyper::{request, IpfsApi, IpfsClient, TryFromUri};
use log::debug;
use std::error::Error as StdError;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::error::Error;
use crate::storage::content_address::ContentAddress;
use crate::storage::ContentStore;

/// Largest content stored as a single block: the node's default chunk size
/// (`size-262144`).
pub const MAX_CONTENT_LEN: usize = 256 * 1024;

/// IPFS client wrapper.
///
/// The client's futures are not `Send`, so every call runs on a blocking
/// worker with its own current-thread runtime.
#[derive(Clone)]
pub struct IpfsContentStore {
    client: Arc<IpfsClient>,
    timeout: Duration,
}

impl IpfsContentStore {
    /// Creates a store for the node at `api_url`, e.g.
    /// `http://localhost:5001`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = IpfsClient::from_str(api_url)
            .map_err(|e| Error::Config(format!("invalid IPFS API url {api_url}: {e}")))?;
        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    /// Runs `op` against the client on a blocking worker.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(Arc<IpfsClient>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        let client = self.client.clone();
        let timeout = self.timeout;

        task::spawn_blocking(move || -> Result<T, Error> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::Storage(format!("cannot start IPFS runtime: {e}")))?;
            rt.block_on(async move {
                tokio::time::timeout(timeout, op(client))
                    .await
                    .map_err(|_| Error::Storage(format!("IPFS call timed out after {timeout:?}")))?
            })
        })
        .await
        .map_err(|e| Error::Storage(format!("IPFS worker failed: {e}")))?
    }
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentAddress, Error> {
        let size = bytes.len();
        if size > MAX_CONTENT_LEN {
            return Err(Error::Storage(format!(
                "{size} bytes exceed the single-block limit of {MAX_CONTENT_LEN}"
            )));
        }
        let hash = self
            .run(move |client| async move {
                let options = request::Add {
                    cid_version: Some(1),
                    raw_leaves: Some(true),
                    hash: Some("sha2-256"),
                    pin: Some(true),
                    ..Default::default()
                };
                client
                    .add_with_options(Cursor::new(bytes), options)
                    .await
                    .map(|response| response.hash)
                    .map_err(|e| Error::Storage(format!("IPFS add failed: {e}")))
            })
            .await?;
        debug!("IPFS stored {size} bytes as {hash}");
        hash.parse()
    }

    async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, Error> {
        let cid = address.to_string();
        self.run(move |client| async move {
            client
                .cat(&cid)
                .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                    acc.extend_from_slice(&chunk);
                    Ok(acc)
                })
                .await
                .map(|data| data.to_vec())
                .map_err(|e| classify_cat_error(&cid, &e))
        })
        .await
    }
}

/// Turns a failed `cat` into a typed error.
///
/// The node reports a missing block only through its error message (the
/// API error code is 0 for every failure), so this is the one place that
/// reads it.
fn classify_cat_error(cid: &str, err: &(dyn StdError + 'static)) -> Error {
    let message = err.to_string();
    if reports_missing_block(&message) {
        Error::not_found("content", cid)
    } else {
        Error::Storage(format!("IPFS cat {cid} failed: {message}"))
    }
}

fn reports_missing_block(message: &str) -> bool {
    ["not found", "no link named"]
        .iter()
        .any(|phrase| message.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_api_urls() {
        assert!(matches!(
            IpfsContentStore::new("not a url", Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn accepts_node_urls() {
        assert!(IpfsContentStore::new("http://localhost:5001", Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn refuses_content_larger_than_one_block() {
        // Nothing listens here; the size check runs before any request.
        let store = IpfsContentStore::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        match store.put(vec![0u8; MAX_CONTENT_LEN + 1]).await {
            Err(Error::Storage(reason)) => assert!(reason.contains("single-block limit"), "{reason}"),
            other => panic!("expected a storage error, got {other:?}"),
        }
    }

    #[test]
    fn missing_blocks_are_not_found() {
        let missing = std::io::Error::new(
            std::io::ErrorKind::Other,
            "block was not found locally (offline): ipld: could not find bafkrei",
        );
        assert!(matches!(
            classify_cat_error("bafkrei", &missing),
            Error::NotFound { what: "content", .. }
        ));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(matches!(classify_cat_error("bafkrei", &refused), Error::Storage(_)));
    }
}
