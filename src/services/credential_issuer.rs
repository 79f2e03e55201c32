// src/services/credential_issuer.rs
//! Credential builder.
//!
//! Assembles a JWT-VC payload and signs it as a compact JWS:
//! `b64url(header).b64url(payload).b64url(signature)`. The signature covers
//! the first two segments joined by `.`, exactly as they appear in the
//! result.

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::credential::{Claims, CredentialPayload, SignedCredential};
use crate::utils::serialization::{base64url_encode, serialize};
use crate::wallet::signature_adapter;
use crate::wallet::signer::WalletSigner;

/// JWS algorithm of wallet-signed credentials (recoverable secp256k1).
pub const JWS_ALG: &str = "ES256K-R";

/// JOSE header of a signed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JwsHeader {
    fn default() -> Self {
        Self {
            alg: JWS_ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Builds and signs a credential issued now.
///
/// # Errors
/// - `InvalidPayload` if the subject is blank or the claims are empty or
///   malformed
/// - `SigningFailed` if the wallet cannot produce a usable signature
pub async fn build<W>(
    issuer_did: &str,
    subject_did: &str,
    claims: Claims,
    signer: &W,
) -> Result<SignedCredential, Error>
where
    W: WalletSigner + ?Sized,
{
    build_at(issuer_did, subject_did, None, claims, Utc::now().timestamp(), None, signer).await
}

/// Builds and signs a credential with explicit times and type.
pub async fn build_at<W>(
    issuer_did: &str,
    subject_did: &str,
    credential_type: Option<&str>,
    claims: Claims,
    issued_at: i64,
    expires_at: Option<i64>,
    signer: &W,
) -> Result<SignedCredential, Error>
where
    W: WalletSigner + ?Sized,
{
    let payload = CredentialPayload::new(
        issuer_did,
        subject_did,
        credential_type,
        claims,
        issued_at,
        expires_at,
    )?;
    sign_payload(&payload, signer).await
}

/// Signs a prepared payload.
pub async fn sign_payload<W>(payload: &CredentialPayload, signer: &W) -> Result<SignedCredential, Error>
where
    W: WalletSigner + ?Sized,
{
    let header = serialize(&JwsHeader::default())
        .map_err(|e| Error::InvalidPayload(format!("cannot encode header: {e}")))?;
    let body = serialize(payload)
        .map_err(|e| Error::InvalidPayload(format!("cannot encode payload: {e}")))?;
    let signing_input = format!("{}.{}", base64url_encode(header), base64url_encode(body));

    let signature = signature_adapter::sign(signing_input.as_bytes(), signer)
        .await
        .map_err(|e| match e {
            Error::SigningFailed(reason) => Error::SigningFailed(reason),
            other => Error::SigningFailed(other.to_string()),
        })?;
    debug!("Signed credential for {} issued by {}", payload.sub, payload.iss);

    Ok(SignedCredential::new(format!("{signing_input}.{signature}")))
}
