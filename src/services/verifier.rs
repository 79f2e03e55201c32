// src/services/verifier.rs
//! Credential verification.
//!
//! Parses a compact JWS, resolves its issuer DID and checks that the
//! signature was produced by one of the issuer's assertion keys. The signer
//! address is recovered from the signature over the EIP-191 message hash of
//! the signing input, which is what wallets sign.

use ethers_core::types::{Address, Signature, U256};
use log::debug;

use crate::error::Error;
use crate::identity::resolver::DidResolver;
use crate::models::credential::{CredentialPayload, SignedCredential, VerificationResult};
use crate::models::did::Did;
use crate::services::credential_issuer::{JwsHeader, JWS_ALG};
use crate::utils::serialization::{base64url_decode, deserialize};
use crate::wallet::signature_adapter::{
    decode_signature, COMPACT_SIGNATURE_LEN, RECOVERABLE_SIGNATURE_LEN,
};

/// A compact JWS split into its parts.
struct ParsedJws<'a> {
    signing_input: &'a str,
    payload: CredentialPayload,
    signature: Vec<u8>,
}

/// Verifies the signature of `signed` against its issuer's DID document.
///
/// Expiry and revocation are not checked here.
///
/// # Errors
/// - `MalformedCredential` if the JWS cannot be parsed or names an
///   unsupported algorithm
/// - `UnknownIssuer` if the issuer DID cannot be resolved
/// - `SignatureInvalid` if no assertion key of the issuer signed it
pub async fn verify<R>(signed: &SignedCredential, resolver: &R) -> Result<VerificationResult, Error>
where
    R: DidResolver + ?Sized,
{
    let parsed = parse(signed)?;
    let issuer: Did = parsed
        .payload
        .iss
        .parse()
        .map_err(|_| Error::MalformedCredential(format!("issuer is not a DID: {}", parsed.payload.iss)))?;

    let document = resolver.resolve(&issuer).await.map_err(|e| Error::UnknownIssuer {
        did: issuer.to_string(),
        reason: e.to_string(),
    })?;
    let allowed: Vec<Address> = document
        .assertion_methods()
        .into_iter()
        .filter_map(|method| method.address())
        .collect();
    if allowed.is_empty() {
        return Err(Error::SignatureInvalid(format!(
            "{issuer} has no usable assertion method"
        )));
    }

    let candidates = recover_signers(parsed.signing_input.as_bytes(), &parsed.signature)?;
    match candidates.iter().find(|address| allowed.contains(address)) {
        Some(signer) => {
            debug!("Credential signature by {signer:?} matches {issuer}");
            Ok(VerificationResult {
                valid: true,
                payload: parsed.payload,
            })
        }
        None => Err(Error::SignatureInvalid(format!(
            "signature was not produced by a key of {issuer}"
        ))),
    }
}

/// Decodes the payload without checking the signature.
pub fn decode_payload(signed: &SignedCredential) -> Result<CredentialPayload, Error> {
    parse(signed).map(|parsed| parsed.payload)
}

fn parse(signed: &SignedCredential) -> Result<ParsedJws<'_>, Error> {
    let malformed = || Error::MalformedCredential("expected three non-empty dot-separated segments".into());
    let (signing_input, signature) = signed.as_str().rsplit_once('.').ok_or_else(malformed)?;
    let (header, payload) = signing_input.split_once('.').ok_or_else(malformed)?;
    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        return Err(malformed());
    }

    let header: JwsHeader = decode_segment("header", header)?;
    if header.alg != JWS_ALG {
        return Err(Error::MalformedCredential(format!(
            "unsupported JWS algorithm {}",
            header.alg
        )));
    }
    Ok(ParsedJws {
        signing_input,
        payload: decode_segment("payload", payload)?,
        signature: decode_signature(signature)?,
    })
}

fn decode_segment<T: serde::de::DeserializeOwned>(name: &str, segment: &str) -> Result<T, Error> {
    let bytes = base64url_decode(segment)
        .map_err(|e| Error::MalformedCredential(format!("{name} is not base64url: {e}")))?;
    deserialize(&bytes).map_err(|e| Error::MalformedCredential(format!("{name} is not valid JSON: {e}")))
}

/// Addresses that may have produced `signature` over `message`.
///
/// A 65-byte signature names its recovery id; a 64-byte one is tried under
/// both.
fn recover_signers(message: &[u8], signature: &[u8]) -> Result<Vec<Address>, Error> {
    let (rs, recovery_ids): (&[u8], Vec<u64>) = match signature.len() {
        RECOVERABLE_SIGNATURE_LEN => {
            let v = u64::from(signature[64]);
            (&signature[..64], vec![if v < 27 { v + 27 } else { v }])
        }
        COMPACT_SIGNATURE_LEN => (signature, vec![27, 28]),
        other => {
            return Err(Error::SignatureInvalid(format!(
                "unexpected signature length {other}"
            )))
        }
    };

    let r = U256::from_big_endian(&rs[..32]);
    let s = U256::from_big_endian(&rs[32..]);
    Ok(recovery_ids
        .into_iter()
        .filter_map(|v| Signature { r, s, v }.recover(message).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolver::MemoryResolver;
    use crate::identity::derive_did;
    use crate::models::credential::Claims;
    use crate::services::credential_issuer::build;
    use crate::utils::serialization::base64url_encode;
    use crate::wallet::key_management::KeyManager;
    use crate::wallet::signer::WalletSigner;
    use ethers_core::utils::to_checksum;

    const CHAIN_ID: u64 = 11155111;

    fn claims() -> Claims {
        [("institution", "X University"), ("degree", "BSc")].into_iter().collect()
    }

    async fn issued_by(keys: &KeyManager) -> (SignedCredential, MemoryResolver) {
        let issuer = derive_did(&to_checksum(&keys.address(), None), "sepolia").unwrap();
        let signed = build(&issuer.to_string(), "did:ethr:sepolia:0xABCD", claims(), keys)
            .await
            .unwrap();
        let resolver = MemoryResolver::new();
        resolver.insert(keys.did_document("sepolia", CHAIN_ID));
        (signed, resolver)
    }

    #[tokio::test]
    async fn accepts_credentials_signed_by_the_issuer() {
        let keys = KeyManager::new();
        let (signed, resolver) = issued_by(&keys).await;

        let result = verify(&signed, &resolver).await.unwrap();
        assert!(result.valid);
        assert_eq!(result.payload.sub, "did:ethr:sepolia:0xABCD");
        assert_eq!(result.payload.claims(), &claims());
    }

    #[tokio::test]
    async fn accepts_compact_signatures() {
        let keys = KeyManager::new();
        let (signed, resolver) = issued_by(&keys).await;

        let (input, signature) = signed.as_str().rsplit_once('.').unwrap();
        let mut bytes = base64url_decode(signature).unwrap();
        bytes.truncate(64);
        let compact = SignedCredential::new(format!("{input}.{}", base64url_encode(bytes)));

        assert!(verify(&compact, &resolver).await.unwrap().valid);
    }

    #[tokio::test]
    async fn rejects_signatures_of_other_keys() {
        let keys = KeyManager::new();
        let (signed, _) = issued_by(&keys).await;

        // Same DID, but the resolver reports another controller.
        let resolver = MemoryResolver::new();
        let mut document = KeyManager::new().did_document("sepolia", CHAIN_ID);
        document.id = decode_payload(&signed).unwrap().iss;
        resolver.insert(document);

        assert!(matches!(
            verify(&signed, &resolver).await,
            Err(Error::SignatureInvalid(_))
        ));
    }

    #[tokio::test]
    async fn rejects_tampered_payloads() {
        let keys = KeyManager::new();
        let (signed, resolver) = issued_by(&keys).await;

        let mut payload = decode_payload(&signed).unwrap();
        payload.sub = "did:ethr:sepolia:0xEVIL".into();
        let segments: Vec<&str> = signed.as_str().split('.').collect();
        let forged = SignedCredential::new(format!(
            "{}.{}.{}",
            segments[0],
            base64url_encode(serde_json::to_vec(&payload).unwrap()),
            segments[2]
        ));

        assert!(matches!(
            verify(&forged, &resolver).await,
            Err(Error::SignatureInvalid(_))
        ));
    }

    #[tokio::test]
    async fn unresolvable_issuers_are_unknown() {
        let keys = KeyManager::new();
        let (signed, _) = issued_by(&keys).await;

        assert!(matches!(
            verify(&signed, &MemoryResolver::new()).await,
            Err(Error::UnknownIssuer { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_input_is_reported() {
        let resolver = MemoryResolver::new();
        for compact in ["", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(matches!(
                verify(&SignedCredential::new(compact), &resolver).await,
                Err(Error::MalformedCredential(_))
            ));
        }
    }

    #[tokio::test]
    async fn unsupported_algorithms_are_malformed() {
        let keys = KeyManager::new();
        let (signed, resolver) = issued_by(&keys).await;
        let rest = signed.as_str().split_once('.').unwrap().1;

        // ES256K signs SHA-256 without a recovery id; only ES256K-R is recoverable.
        for alg in ["HS256", "ES256K"] {
            let header = base64url_encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            let forged = SignedCredential::new(format!("{header}.{rest}"));
            assert!(
                matches!(verify(&forged, &resolver).await, Err(Error::MalformedCredential(_))),
                "{alg}"
            );
        }
    }
}
