// src/models/registry.rs
//! On-chain registry data model.

use ethers_core::types::{Address, H256};
use ethers_core::utils::hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Keccak-256 digest of a signed credential, used as the registry key.
///
/// Rendered as `0x`-prefixed lowercase hex, which is also the
/// `credentialId` handed back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The fingerprint as a `bytes32` contract argument.
    pub fn to_h256(&self) -> H256 {
        H256::from(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|_| Error::InvalidPayload(format!("fingerprint is not hex: {s}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidPayload(format!("fingerprint must be 32 bytes: {s}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_string()
    }
}

/// Reference to a submitted transaction (its hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(pub H256);

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// A credential entry of the registry contract.
///
/// Only `revoked` ever changes after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub fingerprint: Fingerprint,
    pub content_address: String,
    /// Account that submitted the registration
    pub issuer: Address,
    pub subject_did: String,
    /// Block timestamp of the registration, epoch seconds
    pub timestamp: u64,
    pub revoked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_parses_its_own_rendering() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        let rendered = fp.to_string();
        assert_eq!(rendered.len(), 66);
        assert!(rendered.starts_with("0xabab"));
        assert_eq!(rendered.parse::<Fingerprint>().unwrap(), fp);
    }

    #[test]
    fn fingerprint_rejects_short_input() {
        assert!("0x1234".parse::<Fingerprint>().is_err());
        assert!("zz".parse::<Fingerprint>().is_err());
    }
}
