// src/storage/content_address.rs
//! Content addresses.
//!
//! An address is a CIDv1 with the `raw` codec over a sha2-256 multihash of
//! the exact bytes, printed as base32 (`bafkrei...`). For single-block
//! content this is the CID an IPFS node assigns with `cid-version=1` and
//! `raw-leaves=true`.

use cid::multihash::Multihash;
use cid::Cid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::utils::crypto::sha256;

/// Multicodec code of raw binary content.
pub const RAW_CODEC: u64 = 0x55;
/// Multihash code of sha2-256.
pub const SHA2_256: u64 = 0x12;

/// A deterministic content digest used as the content store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(Cid);

impl ContentAddress {
    pub fn cid(&self) -> &Cid {
        &self.0
    }
}

/// Computes the content address of `bytes`.
pub fn address_of(bytes: &[u8]) -> Result<ContentAddress, Error> {
    let digest = sha256(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| Error::Storage(format!("cannot build multihash: {e}")))?;
    Ok(ContentAddress(Cid::new_v1(RAW_CODEC, hash)))
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cid::try_from(s)
            .map(ContentAddress)
            .map_err(|e| Error::Storage(format!("invalid content address {s:?}: {e}")))
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.to_string()
    }
}
