// src/blockchain/mod.rs
//! Chain connectivity.

pub mod chain_client;

pub use chain_client::{ChainClient, SigningClient};
