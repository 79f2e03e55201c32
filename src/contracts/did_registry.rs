// src/contracts/did_registry.rs
//! ERC-1056 (`EthereumDIDRegistry`) contract interface.
//!
//! Read-only view of the registry that anchors `did:ethr` identities. Only
//! the call the resolver needs is exposed: the current owner of an identity.

use ethers::providers::Middleware;
use ethers_contract::Contract;
use ethers_core::abi::Abi;
use ethers_core::types::Address;
use std::sync::Arc;

use crate::error::Error;

/// ERC-1056 registry wrapper.
///
/// # Type Parameters
/// * `M` - middleware used for `eth_call` (a provider is enough)
pub struct EthrDidRegistry<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthrDidRegistry<M> {
    /// Creates a registry handle.
    ///
    /// # Errors
    /// `Config` if the bundled ABI cannot be loaded
    pub fn new(client: Arc<M>, address: Address) -> Result<Self, Error> {
        let abi = Abi::load(&include_bytes!("../abi/EthrDIDRegistry.json")[..])
            .map_err(|e| Error::Config(format!("invalid EthrDIDRegistry ABI: {e}")))?;
        Ok(Self {
            contract: Contract::new(address, abi, client),
        })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Current controller of `identity`; the identity itself unless
    /// ownership was transferred.
    pub async fn identity_owner(&self, identity: Address) -> Result<Address, Error> {
        self.contract
            .method::<_, Address>("identityOwner", identity)
            .map_err(|e| Error::ResolutionError(e.to_string()))?
            .call()
            .await
            .map_err(|e| Error::ResolutionError(format!("identityOwner({identity:?}) failed: {e}")))
    }
}
