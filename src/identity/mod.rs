// src/identity/mod.rs
//! Identity component: DID derivation and resolution.

pub mod ethr;
pub mod resolver;

pub use ethr::EthrResolver;
pub use resolver::{DidResolver, HttpResolver, MemoryResolver};

use crate::error::Error;
use crate::models::did::Did;

/// DID method of every derived identity.
pub const ETHR_METHOD: &str = "ethr";

/// Derives the `did:ethr` identifier of a wallet address on `network`.
///
/// Pure and deterministic. The address is normalized to its EIP-55 checksum
/// form, so differently-cased spellings of one address map to one DID.
///
/// # Errors
/// - `InvalidAddress` if `address` is not `0x` followed by 40 hex digits
/// - `InvalidPayload` if `network` is blank
pub fn derive_did(address: &str, network: &str) -> Result<Did, Error> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidAddress(address.to_string()))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    if network.trim().is_empty() || network.contains(':') {
        return Err(Error::InvalidPayload(format!("invalid network name: {network:?}")));
    }
    let parsed: ethers_core::types::Address = address
        .parse()
        .map_err(|_| Error::InvalidAddress(address.to_string()))?;
    Ok(Did::new(
        ETHR_METHOD,
        network,
        ethers_core::utils::to_checksum(&parsed, None),
    ))
}
