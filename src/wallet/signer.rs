// src/wallet/signer.rs
//! The wallet capability consumed by the pipeline.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::Address;
use ethers_core::utils::hex;

use crate::error::Error;

/// Anything that owns an address and can sign messages for it.
///
/// `sign_message` follows the wallet convention (`personal_sign`): the wallet
/// applies the EIP-191 message prefix and hashes internally, and returns the
/// 65-byte `r || s || v` signature as `0x`-prefixed hex.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_message(&self, message: &[u8]) -> Result<String, Error>;
}

/// Signs with an in-process `ethers` wallet.
pub(crate) async fn sign_with_local_wallet(
    wallet: &LocalWallet,
    message: &[u8],
) -> Result<String, Error> {
    let signature = wallet
        .sign_message(message)
        .await
        .map_err(|e| Error::SigningFailed(e.to_string()))?;
    Ok(format!("0x{}", hex::encode(signature.to_vec())))
}
