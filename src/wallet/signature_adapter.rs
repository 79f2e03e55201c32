// src/wallet/signature_adapter.rs
//! Bridges wallet signatures to JWS signature encoding.
//!
//! Wallets hand back `0x`-prefixed hex; a JWS carries the raw signature bytes
//! as unpadded base64url. The conversion is byte-exact: a given hex string
//! always produces the same base64url string.

use ethers_core::utils::hex;
use log::warn;

use crate::error::Error;
use crate::utils::serialization::{base64url_decode, base64url_encode};
use crate::wallet::signer::WalletSigner;

/// Compact `r || s` signature length.
pub const COMPACT_SIGNATURE_LEN: usize = 64;
/// Recoverable `r || s || v` signature length.
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Signs `message` with the wallet and returns the JWS signature segment.
///
/// The wallet receives exactly `message`; any hashing is the wallet's own.
///
/// # Errors
/// - `SigningFailed` if the wallet fails
/// - `InvalidHexSignature` if the wallet's answer is not hex
pub async fn sign<W>(message: &[u8], wallet: &W) -> Result<String, Error>
where
    W: WalletSigner + ?Sized,
{
    let hex_signature = wallet.sign_message(message).await?;
    encode_signature(&hex_signature)
}

/// Converts a hex signature into unpadded base64url.
///
/// Accepts an optional `0x` prefix and left-pads odd-length input with a
/// `0`. Lengths other than 64 or 65 bytes are logged and still encoded.
pub fn encode_signature(hex_signature: &str) -> Result<String, Error> {
    let bytes = hex_to_bytes(hex_signature)?;
    if bytes.len() != COMPACT_SIGNATURE_LEN && bytes.len() != RECOVERABLE_SIGNATURE_LEN {
        warn!("Unexpected signature byte length: {}", bytes.len());
    }
    Ok(base64url_encode(bytes))
}

/// Decodes a JWS signature segment back to raw bytes.
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>, Error> {
    base64url_decode(encoded)
        .map_err(|e| Error::MalformedCredential(format!("signature is not base64url: {e}")))
}

fn hex_to_bytes(hex_signature: &str) -> Result<Vec<u8>, Error> {
    let digits = hex_signature
        .strip_prefix("0x")
        .or_else(|| hex_signature.strip_prefix("0X"))
        .unwrap_or(hex_signature);
    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };
    hex::decode(digits).map_err(|_| Error::InvalidHexSignature(hex_signature.to_string()))
}
