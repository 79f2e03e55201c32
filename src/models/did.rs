// src/models/did.rs
//! Decentralized Identifier (DID) data model implementation.
//!
//! Defines the DID string type used for issuers and subjects and the subset of
//! the [DID Core](https://www.w3.org/TR/did-core/) document model the verifier
//! needs to find an issuer's secp256k1 keys.

use ethers_core::types::Address;
use ethers_core::utils::{hex, public_key_to_address, to_checksum};
use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Verification method type of the default `did:ethr` controller key.
pub const RECOVERY_METHOD_2020: &str = "EcdsaSecp256k1RecoveryMethod2020";

/// A parsed `did:<method>:<network>:<id>` identifier.
///
/// # DID Format
/// ```text
/// did:ethr:sepolia:0xAbC...123
/// ```
/// The network segment is always present, so two DIDs for the same address on
/// different networks never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    network: String,
    id: String,
}

impl Did {
    pub fn new(
        method: impl Into<String>,
        network: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            network: network.into(),
            id: id.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// The method-specific identifier; a wallet address for `did:ethr`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parses the method-specific identifier as an Ethereum address.
    pub fn address(&self) -> Result<Address, Error> {
        Address::from_str(&self.id).map_err(|_| Error::InvalidAddress(self.id.clone()))
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}:{}", self.method, self.network, self.id)
    }
}

impl FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(network), Some(id))
                if !method.is_empty() && !network.is_empty() && !id.is_empty() =>
            {
                Ok(Did::new(method, network, id))
            }
            _ => Err(Error::InvalidPayload(format!("not a did:<method>:<network>:<id> string: {s}"))),
        }
    }
}

impl TryFrom<String> for Did {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

/// A DID Document representing a decentralized identity.
///
/// Only the members needed to authenticate a credential issuer are modelled;
/// unknown members are ignored when parsing resolver output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,

    /// The DID this document describes
    pub id: String,

    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationRelationship>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<VerificationRelationship>,
}

/// An entry of `authentication` / `assertionMethod`: a reference to a
/// verification method or an embedded one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum VerificationRelationship {
    Reference(String),
    Embedded(VerificationMethod),
}

/// A single key entry of a DID document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    /// CAIP-10 account id, e.g. `eip155:11155111:0xabc...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,
    /// SEC1-encoded secp256k1 public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
}

impl VerificationMethod {
    /// Ethereum address controlled by this key, if the method carries one.
    pub fn address(&self) -> Option<Address> {
        if let Some(account) = &self.blockchain_account_id {
            // CAIP-10 (`eip155:1:0x..`) or the legacy `0x..@eip155:1` form.
            let candidate = account
                .split('@')
                .next()
                .and_then(|head| head.rsplit(':').next())
                .unwrap_or_default();
            if let Ok(address) = Address::from_str(candidate) {
                return Some(address);
            }
        }
        if let Some(address) = self
            .ethereum_address
            .as_deref()
            .and_then(|a| Address::from_str(a).ok())
        {
            return Some(address);
        }
        let key_bytes = hex::decode(self.public_key_hex.as_deref()?.trim_start_matches("0x")).ok()?;
        let key = VerifyingKey::from_sec1_bytes(&key_bytes).ok()?;
        Some(public_key_to_address(&key))
    }
}

impl DidDocument {
    /// Builds the default document of a `did:ethr` identity whose registry
    /// owner is `owner`.
    pub fn ethr_default(did: &Did, owner: Address, chain_id: u64) -> Self {
        let did_string = did.to_string();
        let controller_id = format!("{did_string}#controller");
        DidDocument {
            context: Some(serde_json::json!([
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/suites/secp256k1recovery-2020/v2"
            ])),
            id: did_string.clone(),
            verification_method: vec![VerificationMethod {
                id: controller_id.clone(),
                type_: RECOVERY_METHOD_2020.to_string(),
                controller: did_string,
                blockchain_account_id: Some(format!(
                    "eip155:{chain_id}:{}",
                    to_checksum(&owner, None)
                )),
                ethereum_address: None,
                public_key_hex: None,
            }],
            authentication: vec![VerificationRelationship::Reference(controller_id.clone())],
            assertion_method: vec![VerificationRelationship::Reference(controller_id)],
        }
    }

    /// Verification methods allowed to sign credentials.
    ///
    /// Uses `assertionMethod` when present, otherwise every listed method.
    pub fn assertion_methods(&self) -> Vec<&VerificationMethod> {
        if self.assertion_method.is_empty() {
            return self.verification_method.iter().collect();
        }
        self.assertion_method
            .iter()
            .filter_map(|relationship| match relationship {
                VerificationRelationship::Embedded(method) => Some(method),
                VerificationRelationship::Reference(reference) => self
                    .verification_method
                    .iter()
                    .find(|method| same_method_id(&self.id, &method.id, reference)),
            })
            .collect()
    }
}

fn same_method_id(did: &str, method_id: &str, reference: &str) -> bool {
    let absolute = |id: &str| {
        if id.starts_with('#') {
            format!("{did}{id}")
        } else {
            id.to_string()
        }
    };
    absolute(method_id) == absolute(reference)
}
