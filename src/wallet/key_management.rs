// src/wallet/key_management.rs
//! Cryptographic key management for issuer wallets.
//!
//! Provides generation and loading of secp256k1 keys and message signing the
//! way browser wallets do it:
//! - secp256k1 curve (via `k256`)
//! - EIP-191 personal message hashing (via `ethers`)
//! - Deterministic ECDSA (RFC 6979)

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::Address;
use ethers_core::utils::{hex, to_checksum};
use k256::ecdsa::SigningKey;

use crate::error::Error;
use crate::models::did::{Did, DidDocument};
use crate::wallet::signer::{sign_with_local_wallet, WalletSigner};

/// A locally held issuer key.
///
/// # Security Notes
/// - The secret key is never exposed
/// - Signatures are deterministic, so signing the same bytes twice yields
///   the same signature
#[derive(Clone, Debug)]
pub struct KeyManager {
    wallet: LocalWallet,
}

impl KeyManager {
    /// Generates a KeyManager with a fresh random key.
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self {
            wallet: LocalWallet::from(signing_key),
        }
    }

    /// Loads a key from hex (with or without `0x` prefix).
    ///
    /// # Errors
    /// `Config` if the string is not a 32-byte hex secret or not a valid
    /// secp256k1 scalar.
    pub fn from_private_key(private_key: &str) -> Result<Self, Error> {
        let bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
            .map_err(|e| Error::Config(format!("private key is not hex: {e}")))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("invalid private key: {e}")))?;
        Ok(Self {
            wallet: LocalWallet::from(signing_key),
        })
    }

    /// Binds the wallet to a chain id, used when the key also signs
    /// transactions.
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        Self {
            wallet: self.wallet.with_chain_id(chain_id),
        }
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    /// The wallet DID on `network` with its default `did:ethr` document, as
    /// the resolution network would report it for an unmodified identity.
    pub fn did_document(&self, network: &str, chain_id: u64) -> DidDocument {
        let did = Did::new("ethr", network, to_checksum(&self.address(), None));
        DidDocument::ethr_default(&did, self.address(), chain_id)
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletSigner for KeyManager {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, Error> {
        sign_with_local_wallet(&self.wallet, message).await
    }
}
