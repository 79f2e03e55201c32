// src/identity/ethr.rs
//! Native `did:ethr` resolution over the ERC-1056 registry.

use async_trait::async_trait;
use ethers::providers::Middleware;
use log::debug;

use crate::contracts::did_registry::EthrDidRegistry;
use crate::error::Error;
use crate::identity::resolver::DidResolver;
use crate::identity::ETHR_METHOD;
use crate::models::did::{Did, DidDocument};

/// Resolves `did:ethr:<network>:<address>` identities of one network.
///
/// The document names the identity's current registry owner as its
/// controller key. Delegate and attribute events are not replayed, so
/// credentials must be signed by the owner.
pub struct EthrResolver<M> {
    network: String,
    chain_id: u64,
    registry: EthrDidRegistry<M>,
}

impl<M: Middleware + 'static> EthrResolver<M> {
    pub fn new(network: impl Into<String>, chain_id: u64, registry: EthrDidRegistry<M>) -> Self {
        Self {
            network: network.into(),
            chain_id,
            registry,
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> DidResolver for EthrResolver<M> {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, Error> {
        if did.method() != ETHR_METHOD {
            return Err(Error::ResolutionError(format!("unsupported DID method: {}", did.method())));
        }
        if did.network() != self.network {
            return Err(Error::ResolutionError(format!(
                "unknown network {} (resolver serves {})",
                did.network(),
                self.network
            )));
        }
        let identity = did
            .address()
            .map_err(|_| Error::ResolutionError(format!("invalid did:ethr identifier: {}", did.id())))?;

        let owner = self.registry.identity_owner(identity).await?;
        if owner != identity {
            debug!("{did} is controlled by {owner:?}");
        }
        Ok(DidDocument::ethr_default(did, owner, self.chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{Http, Provider};
    use ethers_core::abi::{encode, Token};
    use ethers_core::types::Address;
    use ethers_core::utils::{hex, to_checksum};
    use mockito::{mock, Matcher};
    use serde_json::json;
    use std::sync::Arc;

    fn resolver() -> EthrResolver<Provider<Http>> {
        let provider = Provider::<Http>::try_from(mockito::server_url().as_str()).unwrap();
        let registry = EthrDidRegistry::new(Arc::new(provider), Address::repeat_byte(0x03)).unwrap();
        EthrResolver::new("sepolia", 11155111, registry)
    }

    fn did_of(identity: Address) -> Did {
        Did::new(ETHR_METHOD, "sepolia", to_checksum(&identity, None))
    }

    #[tokio::test]
    async fn documents_name_the_registry_owner() {
        let identity = Address::repeat_byte(0xaa);
        let owner = Address::repeat_byte(0xbb);
        let _call = mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "eth_call" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": format!("0x{}", hex::encode(encode(&[Token::Address(owner)])))
                })
                .to_string(),
            )
            .create();

        let did = did_of(identity);
        let document = resolver().resolve(&did).await.unwrap();
        assert_eq!(document.id, did.to_string());
        let signers: Vec<Address> = document
            .assertion_methods()
            .into_iter()
            .filter_map(|method| method.address())
            .collect();
        assert_eq!(signers, vec![owner]);
    }

    #[tokio::test]
    async fn failed_calls_are_resolution_errors() {
        let _call = mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "eth_call" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create();

        assert!(matches!(
            resolver().resolve(&did_of(Address::repeat_byte(0xaa))).await,
            Err(Error::ResolutionError(_))
        ));
    }

    #[tokio::test]
    async fn other_networks_and_methods_are_refused() {
        let resolver = resolver();
        let mainnet = Did::new(ETHR_METHOD, "mainnet", to_checksum(&Address::repeat_byte(0xaa), None));
        assert!(matches!(resolver.resolve(&mainnet).await, Err(Error::ResolutionError(_))));

        let web: Did = "did:web:example:com".parse().unwrap();
        assert!(matches!(resolver.resolve(&web).await, Err(Error::ResolutionError(_))));
    }
}
