// src/wallet/mod.rs
//! Wallet capability, local keys, and signature encoding.

pub mod key_management;
pub mod signature_adapter;
pub mod signer;

pub use key_management::KeyManager;
pub use signer::WalletSigner;
