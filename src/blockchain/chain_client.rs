// src/blockchain/chain_client.rs
//! EVM chain client.
//!
//! Connects the issuer wallet to an RPC endpoint so that registry
//! transactions are signed by the same key that signs credentials.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::Address;
use log::info;
use std::sync::Arc;

use crate::error::Error;
use crate::wallet::key_management::KeyManager;

/// Signing client type used for contract bindings.
pub type SigningClient = SignerMiddleware<Arc<Provider<Http>>, LocalWallet>;

/// RPC provider plus signing middleware for one network.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<Provider<Http>>,
    client: Arc<SigningClient>,
    chain_id: u64,
}

impl ChainClient {
    /// Connects to `rpc_url` and binds `keys` to the node's chain id.
    ///
    /// # Errors
    /// - `Config` if the URL is invalid, or the node reports a chain id other
    ///   than `expected_chain_id`
    /// - `RegistryUnreachable` if the chain id cannot be fetched
    pub async fn connect(
        rpc_url: &str,
        keys: &KeyManager,
        expected_chain_id: u64,
    ) -> Result<Self, Error> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Config(format!("invalid RPC url {rpc_url}: {e}")))?;
        let provider = Arc::new(provider);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| Error::RegistryUnreachable(format!("cannot read chain id: {e}")))?
            .as_u64();
        if chain_id != expected_chain_id {
            return Err(Error::Config(format!(
                "RPC endpoint is on chain {chain_id}, expected {expected_chain_id}"
            )));
        }

        let wallet = keys.wallet().clone().with_chain_id(chain_id);
        let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));
        info!("Connected to chain {chain_id} as {:?}", client.address());

        Ok(Self {
            provider,
            client,
            chain_id,
        })
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    /// Middleware that signs transactions with the issuer wallet.
    pub fn client(&self) -> Arc<SigningClient> {
        self.client.clone()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Account that submits transactions.
    pub fn address(&self) -> Address {
        self.client.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_rpc_urls() {
        let keys = KeyManager::new();
        let result = ChainClient::connect("not a url", &keys, 1).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn reports_mismatched_networks() {
        let _m = mockito::mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#)
            .create();

        let keys = KeyManager::new();
        let result = ChainClient::connect(&mockito::server_url(), &keys, 11155111).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
