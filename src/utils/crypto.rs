// src/utils/crypto.rs
//! Hash functions used by the pipeline.
//!
//! Keccak-256 (Ethereum's hash) keys the on-chain registry; SHA-256 backs the
//! content addresses.

use ethers::utils::keccak256;
use ring::digest::{digest, SHA256};

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Example
/// ```
/// let hash = vc_registry::utils::crypto::hash_data(b"");
/// assert_eq!(hash[0], 0xc5);
/// ```
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Computes a SHA-256 digest of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}
