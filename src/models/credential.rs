// src/models/credential.rs
//! Verifiable Credential data model implementation.
//!
//! Defines the JWT-VC claims set that issuers sign, the closed set of claim
//! value kinds, and the compact signed artifact that is stored and registered.
//! The layout follows the JWT encoding of the
//! [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/#json-web-token).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;

/// Base context of every issued credential.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Base type of every issued credential.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// A single claim value.
///
/// Claims are limited to scalars: strings, integers, finite
/// floats and booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::Text(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::Text(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

/// Issuer-defined claims, ordered by key so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, ClaimValue>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ClaimValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClaimValue)> {
        self.0.iter()
    }

    /// Checks the claims can be embedded in a `credentialSubject`.
    ///
    /// # Errors
    /// Returns `InvalidPayload` if the map is empty, a key is blank, the key
    /// `id` is used (it is reserved for the subject DID), or a float is not
    /// finite.
    pub fn validate(&self) -> Result<(), Error> {
        if self.0.is_empty() {
            return Err(Error::InvalidPayload("claims must not be empty".into()));
        }
        for (key, value) in &self.0 {
            if key.trim().is_empty() {
                return Err(Error::InvalidPayload("claim keys must not be blank".into()));
            }
            if key == "id" {
                return Err(Error::InvalidPayload(
                    "claim key `id` is reserved for the subject DID".into(),
                ));
            }
            if let ClaimValue::Float(f) = value {
                if !f.is_finite() {
                    return Err(Error::InvalidPayload(format!("claim `{key}` is not a finite number")));
                }
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Claims(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The `credentialSubject` object: the subject DID plus flattened claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: String,
    #[serde(flatten)]
    pub claims: Claims,
}

/// The `vc` member of the JWT claims set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcClaim {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub credential_subject: CredentialSubject,
}

/// The Credential Payload signed by the issuer.
///
/// # Fields
/// - `iss`: issuer DID
/// - `sub`: subject DID (required, non-empty)
/// - `nbf`: issuance time, epoch seconds
/// - `exp`: optional expiry, epoch seconds
/// - `vc`: the credential body carrying the claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialPayload {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    pub vc: VcClaim,
}

impl CredentialPayload {
    /// Assembles a payload and validates it.
    ///
    /// # Errors
    /// `InvalidPayload` if the subject or credential type is blank or the
    /// claims are invalid.
    pub fn new(
        issuer_did: &str,
        subject_did: &str,
        credential_type: Option<&str>,
        claims: Claims,
        issued_at: i64,
        expires_at: Option<i64>,
    ) -> Result<Self, Error> {
        if subject_did.trim().is_empty() {
            return Err(Error::InvalidPayload("subject DID is required".into()));
        }
        if issuer_did.trim().is_empty() {
            return Err(Error::InvalidPayload("issuer DID is required".into()));
        }
        if matches!(credential_type, Some(t) if t.trim().is_empty()) {
            return Err(Error::InvalidPayload("credential type must not be blank".into()));
        }
        claims.validate()?;
        if let Some(exp) = expires_at {
            if exp <= issued_at {
                return Err(Error::InvalidPayload("expiry must be after issuance".into()));
            }
        }

        let mut types = vec![VERIFIABLE_CREDENTIAL_TYPE.to_string()];
        if let Some(extra) = credential_type.filter(|t| *t != VERIFIABLE_CREDENTIAL_TYPE) {
            types.push(extra.to_string());
        }

        Ok(Self {
            iss: issuer_did.to_string(),
            sub: subject_did.to_string(),
            nbf: issued_at,
            exp: expires_at,
            vc: VcClaim {
                context: vec![CREDENTIALS_V1_CONTEXT.to_string()],
                types,
                credential_subject: CredentialSubject {
                    id: subject_did.to_string(),
                    claims,
                },
            },
        })
    }

    pub fn claims(&self) -> &Claims {
        &self.vc.credential_subject.claims
    }

    /// The most specific credential type, if the issuer gave one.
    pub fn credential_type(&self) -> Option<&str> {
        self.vc
            .types
            .iter()
            .map(String::as_str)
            .find(|t| *t != VERIFIABLE_CREDENTIAL_TYPE)
    }
}

/// A compact JWS (`header.payload.signature`) carrying a credential payload.
///
/// The string is the artifact: its bytes are what gets stored, fingerprinted
/// and verified, so it is never re-serialized after signing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedCredential(String);

impl SignedCredential {
    pub fn new(compact: impl Into<String>) -> Self {
        Self(compact.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Interprets stored bytes as a compact credential.
    ///
    /// # Errors
    /// `MalformedCredential` if the bytes are not UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|_| Error::MalformedCredential("artifact is not UTF-8".into()))
    }
}

impl fmt::Display for SignedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a signature check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub payload: CredentialPayload,
}
