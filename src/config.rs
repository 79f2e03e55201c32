// src/config.rs
//! Application settings.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (Sepolia, local IPFS node)
//! 2. Optional `vc-registry.{toml,yaml,json}` in the working directory
//! 3. `VC__<SECTION>__<KEY>` environment variables, e.g.
//!    `VC__REGISTRY__ADDRESS` or `VC__WALLET__PRIVATE_KEY` (`.env` is loaded
//!    first)

use config::{Config, Environment, File};
use ethers_core::types::Address;
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Canonical ERC-1056 registry deployment.
pub const DEFAULT_DID_REGISTRY: &str = "0x03d5003bf0e79C5F5223588F347ebA39AfbC3818";
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: NetworkSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    pub did_registry: DidRegistrySettings,
    pub resolver: ResolverSettings,
    pub ipfs: IpfsSettings,
    pub server: ServerSettings,
    #[serde(default)]
    pub wallet: WalletSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// Network segment of derived DIDs
    pub name: String,
    pub chain_id: u64,
    /// JSON-RPC endpoint; without one the registry runs in memory
    #[serde(default)]
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySettings {
    /// Credential registry contract address
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DidRegistrySettings {
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Native resolution over the ERC-1056 registry
    Ethr,
    /// Universal Resolver HTTP endpoint
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettings {
    pub kind: ResolverKind,
    #[serde(default)]
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpfsSettings {
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletSettings {
    /// Issuer key, hex; a throwaway key is generated when absent
    #[serde(default)]
    pub private_key: Option<String>,
}

impl Settings {
    /// Loads settings from defaults, the optional config file and the
    /// environment.
    pub fn load() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        Self::from_config(
            Self::defaults()?
                .add_source(File::with_name("vc-registry").required(false))
                .add_source(Environment::with_prefix("VC").separator("__"))
                .build()?,
        )
    }

    fn defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, Error> {
        Ok(Config::builder()
            .set_default("network.name", "sepolia")?
            .set_default("network.chain_id", SEPOLIA_CHAIN_ID as i64)?
            .set_default("did_registry.address", DEFAULT_DID_REGISTRY)?
            .set_default("resolver.kind", "ethr")?
            .set_default("resolver.timeout_secs", 10_i64)?
            .set_default("ipfs.api_url", "http://localhost:5001")?
            .set_default("ipfs.timeout_secs", 30_i64)?
            .set_default("server.bind", "127.0.0.1:3000")?)
    }

    fn from_config(config: Config) -> Result<Self, Error> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.network.name.trim().is_empty() || self.network.name.contains(':') {
            return Err(Error::Config(format!("invalid network name {:?}", self.network.name)));
        }
        self.bind_addr()?;
        self.did_registry_address()?;
        self.registry_address()?;
        if self.resolver.kind == ResolverKind::Http && self.resolver.url.is_none() {
            return Err(Error::Config("resolver.url is required for the http resolver".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, Error> {
        SocketAddr::from_str(&self.server.bind)
            .map_err(|e| Error::Config(format!("invalid server.bind {}: {e}", self.server.bind)))
    }

    pub fn registry_address(&self) -> Result<Option<Address>, Error> {
        self.registry
            .address
            .as_deref()
            .map(|address| parse_address("registry.address", address))
            .transpose()
    }

    pub fn did_registry_address(&self) -> Result<Address, Error> {
        parse_address("did_registry.address", &self.did_registry.address)
    }

    pub fn ipfs_timeout(&self) -> Duration {
        Duration::from_secs(self.ipfs.timeout_secs)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.resolver.timeout_secs)
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, Error> {
    Address::from_str(value).map_err(|e| Error::Config(format!("invalid {key} {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load(toml: &str) -> Result<Settings, Error> {
        Settings::from_config(
            Settings::defaults()?
                .add_source(File::from_str(toml, FileFormat::Toml))
                .build()?,
        )
    }

    #[test]
    fn defaults_target_sepolia() {
        let settings = load("").unwrap();
        assert_eq!(settings.network.name, "sepolia");
        assert_eq!(settings.network.chain_id, SEPOLIA_CHAIN_ID);
        assert_eq!(settings.resolver.kind, ResolverKind::Ethr);
        assert_eq!(settings.bind_addr().unwrap().port(), 3000);
        assert_eq!(
            settings.did_registry_address().unwrap(),
            Address::from_str(DEFAULT_DID_REGISTRY).unwrap()
        );
        assert!(settings.registry_address().unwrap().is_none());
        assert!(settings.wallet.private_key.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = load(
            r#"
            [network]
            name = "mainnet"
            chain_id = 1
            rpc_url = "http://localhost:8545"

            [registry]
            address = "0x4242424242424242424242424242424242424242"

            [resolver]
            kind = "http"
            url = "https://dev.uniresolver.io"
            "#,
        )
        .unwrap();
        assert_eq!(settings.network.chain_id, 1);
        assert_eq!(settings.resolver.kind, ResolverKind::Http);
        assert_eq!(
            settings.registry_address().unwrap(),
            Some(Address::repeat_byte(0x42))
        );
    }

    #[test]
    fn rejects_inconsistent_settings() {
        assert!(matches!(load("[resolver]\nkind = \"http\""), Err(Error::Config(_))));
        assert!(matches!(load("[registry]\naddress = \"0x12\""), Err(Error::Config(_))));
        assert!(matches!(load("[server]\nbind = \"nowhere\""), Err(Error::Config(_))));
    }
}
