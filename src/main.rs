// src/main.rs

//! # Verifiable Credential Registry - Main Entry Point
//!
//! Loads settings, wires the lifecycle components and starts the API server.
//!
//! ## Modes
//! - **Chain**: `VC__NETWORK__RPC_URL` and `VC__REGISTRY__ADDRESS` set. The
//!   registry contract is used through the RPC node, artifacts go to IPFS
//!   and issuer DIDs are resolved on-chain or through a Universal Resolver.
//! - **Local**: either is missing. Registry, content store and resolver are
//!   in-process tables; state is lost on exit.
//!
//! ## Environment Variables
//! - `VC__WALLET__PRIVATE_KEY`: issuer key (a throwaway key otherwise)
//! - `VC__NETWORK__RPC_URL`: JSON-RPC endpoint
//! - `VC__REGISTRY__ADDRESS`: deployed CredentialRegistry contract address
//! - `VC__IPFS__API_URL`: (Optional) IPFS node URL (default: http://localhost:5001)
//! - `VC__RESOLVER__KIND`: `ethr` (default) or `http` with `VC__RESOLVER__URL`
//! - `RUST_LOG`: log filter (default: `info`)

use anyhow::Context;
use ethers_core::types::Address;
use log::{info, warn};
use std::sync::Arc;

use vc_registry::blockchain::ChainClient;
use vc_registry::config::{ResolverKind, Settings};
use vc_registry::contracts::{CredentialRegistry, EthrDidRegistry, MemoryRegistry, RegistryContract};
use vc_registry::identity::{DidResolver, EthrResolver, HttpResolver, MemoryResolver};
use vc_registry::services::{ApiServer, Orchestrator, RegistryClient};
use vc_registry::storage::{ContentAddressing, ContentStore, IpfsContentStore, MemoryContentStore};
use vc_registry::wallet::KeyManager;
use vc_registry::wallet::WalletSigner;

/// Components a mode provides.
struct Backends {
    registry: Arc<dyn RegistryContract>,
    store: Arc<dyn ContentStore>,
    resolver: Arc<dyn DidResolver>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load settings")?;

    let keys = match &settings.wallet.private_key {
        Some(private_key) => KeyManager::from_private_key(private_key).context("invalid wallet key")?,
        None => {
            warn!("No wallet.private_key configured, issuing with a throwaway key");
            KeyManager::new()
        }
    };

    let backends = match (&settings.network.rpc_url, settings.registry_address()?) {
        (Some(rpc_url), Some(registry_address)) => {
            chain_backends(&settings, &keys, rpc_url, registry_address).await?
        }
        _ => {
            warn!("No RPC endpoint or registry address configured, running in local mode");
            local_backends(&settings, &keys)?
        }
    };

    let orchestrator = Orchestrator::new(
        settings.network.name.clone(),
        Arc::new(keys.clone()),
        backends.resolver,
        ContentAddressing::new(backends.store),
        RegistryClient::new(backends.registry),
    );
    info!("Issuer DID: {}", orchestrator.issuer_did()?);

    let addr = settings.bind_addr()?;
    info!("Available endpoints:");
    info!("- POST /issue-credential");
    info!("- POST /batch-issue-credentials");
    info!("- GET  /verify-credential/:credential_id");
    info!("- POST /revoke-credential");
    info!("- GET  /resolve-did/:did");

    ApiServer::new(orchestrator)
        .run(addr)
        .await
        .context("API server stopped")
}

async fn chain_backends(
    settings: &Settings,
    keys: &KeyManager,
    rpc_url: &str,
    registry_address: Address,
) -> anyhow::Result<Backends> {
    let chain = ChainClient::connect(rpc_url, keys, settings.network.chain_id)
        .await
        .context("failed to connect to the RPC endpoint")?;

    let registry = CredentialRegistry::new(chain.client(), registry_address)?;
    let store = IpfsContentStore::new(&settings.ipfs.api_url, settings.ipfs_timeout())?;
    let resolver: Arc<dyn DidResolver> = match (settings.resolver.kind, &settings.resolver.url) {
        (ResolverKind::Http, Some(url)) => Arc::new(HttpResolver::new(url, settings.resolver_timeout())?),
        _ => {
            let did_registry = EthrDidRegistry::new(chain.provider(), settings.did_registry_address()?)?;
            Arc::new(EthrResolver::new(
                settings.network.name.clone(),
                chain.chain_id(),
                did_registry,
            ))
        }
    };

    Ok(Backends {
        registry: Arc::new(registry),
        store: Arc::new(store),
        resolver,
    })
}

fn local_backends(settings: &Settings, keys: &KeyManager) -> anyhow::Result<Backends> {
    let registry = MemoryRegistry::new(
        settings.registry_address()?.unwrap_or_else(|| Address::repeat_byte(0x42)),
        keys.address(),
    );
    let resolver: Arc<dyn DidResolver> = match (settings.resolver.kind, &settings.resolver.url) {
        (ResolverKind::Http, Some(url)) => Arc::new(HttpResolver::new(url, settings.resolver_timeout())?),
        _ => {
            let resolver = MemoryResolver::new();
            resolver.insert(keys.did_document(&settings.network.name, settings.network.chain_id));
            Arc::new(resolver)
        }
    };

    Ok(Backends {
        registry: Arc::new(registry),
        store: Arc::new(MemoryContentStore::new()),
        resolver,
    })
}
