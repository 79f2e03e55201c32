// src/lib.rs
//! # Verifiable Credential Registry
//!
//! Issues W3C Verifiable Credentials signed by an Ethereum wallet, stores the
//! signed JWT in content-addressed storage and anchors its fingerprint in an
//! on-chain credential registry, so verifiers can look it up, re-fetch it
//! and re-check it without trusting the issuer.
//!
//! ## Architecture Overview
//! 1. **Identity**: `did:ethr` derivation and DID resolution
//! 2. **Wallet**: issuer keys and the wallet-to-JWS signature adapter
//! 3. **Services**: credential builder/verifier, registry client, lifecycle
//!    orchestrator and HTTP API
//! 4. **Storage**: content addressing over IPFS
//! 5. **Contracts / Blockchain**: registry bindings and the chain client

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use error::{Error, ErrorKind, Result, WorkflowError};
