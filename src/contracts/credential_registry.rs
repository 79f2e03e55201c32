// src/contracts/credential_registry.rs
//! Credential Registry smart contract interface.
//!
//! The registry is a key-value store keyed by credential fingerprint with
//! three calls: `issueCredential`, `getCredential` and `revokeCredential`.
//! [`RegistryContract`] is the seam the registry client talks to;
//! [`CredentialRegistry`] implements it over an `ethers` contract binding.

use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers_contract::{Contract, ContractError};
use ethers_core::abi::Abi;
use ethers_core::types::{Address, U256, U64};
use log::debug;
use std::sync::Arc;

use crate::error::Error;
use crate::models::registry::{Fingerprint, RegistryRecord, TxRef};

/// Raw call surface of the registry contract.
///
/// Implementations report transport failures of `code` and
/// `get_credential` as `RegistryUnreachable` and failed writes as
/// `TransactionFailed`. They do not interpret business rules such as
/// duplicate registration; the registry client does that.
#[async_trait]
pub trait RegistryContract: Send + Sync {
    /// Configured contract address.
    fn address(&self) -> Address;

    /// Executable code stored at [`address`](Self::address) on the current
    /// network; empty when nothing is deployed there.
    async fn code(&self) -> Result<Vec<u8>, Error>;

    async fn issue_credential(
        &self,
        fingerprint: &Fingerprint,
        content_address: &str,
        subject_did: &str,
    ) -> Result<TxRef, Error>;

    /// The record for `fingerprint`, `None` if never registered.
    async fn get_credential(&self, fingerprint: &Fingerprint) -> Result<Option<RegistryRecord>, Error>;

    async fn revoke_credential(&self, fingerprint: &Fingerprint) -> Result<TxRef, Error>;
}

/// Tuple returned by `getCredential`:
/// `(ipfsCid, issuer, subjectDid, timestamp, revoked)`.
type CredentialTuple = (String, Address, String, U256, bool);

/// Credential Registry smart contract wrapper.
///
/// # Type Parameters
/// * `M` - middleware; writes need one that signs (e.g. `SignerMiddleware`)
pub struct CredentialRegistry<M> {
    client: Arc<M>,
    contract: Contract<M>,
}

impl<M: Middleware + 'static> CredentialRegistry<M> {
    /// Creates a new CredentialRegistry instance.
    ///
    /// # Errors
    /// `Config` if the bundled ABI cannot be loaded
    pub fn new(client: Arc<M>, contract_address: Address) -> Result<Self, Error> {
        let abi = Abi::load(&include_bytes!("../abi/CredentialRegistry.json")[..])
            .map_err(|e| Error::Config(format!("invalid CredentialRegistry ABI: {e}")))?;
        Ok(Self {
            contract: Contract::new(contract_address, abi, client.clone()),
            client,
        })
    }

    /// Sends a state-changing call and waits for its receipt.
    async fn submit<T>(&self, method: &str, args: T) -> Result<TxRef, Error>
    where
        T: ethers_core::abi::Tokenize + Send,
    {
        let call = self
            .contract
            .method::<_, ()>(method, args)
            .map_err(|e| Error::TransactionFailed(format!("{method}: {e}")))?;
        let pending = call
            .send()
            .await
            .map_err(|e| Error::TransactionFailed(format!("{method}: {e}")))?;
        let tx_hash = pending.tx_hash();
        debug!("{method} submitted as {tx_hash:?}");

        let receipt = pending
            .await
            .map_err(|e| Error::TransactionFailed(format!("{method} {tx_hash:?}: {e}")))?
            .ok_or_else(|| Error::TransactionFailed(format!("{method} {tx_hash:?} was dropped")))?;
        if receipt.status != Some(U64::from(1)) {
            return Err(Error::TransactionFailed(format!("{method} {tx_hash:?} reverted")));
        }
        Ok(TxRef(tx_hash))
    }
}

#[async_trait]
impl<M: Middleware + 'static> RegistryContract for CredentialRegistry<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn code(&self) -> Result<Vec<u8>, Error> {
        self.client
            .get_code(self.contract.address(), None)
            .await
            .map(|code| code.to_vec())
            .map_err(|e| Error::RegistryUnreachable(e.to_string()))
    }

    async fn issue_credential(
        &self,
        fingerprint: &Fingerprint,
        content_address: &str,
        subject_did: &str,
    ) -> Result<TxRef, Error> {
        self.submit(
            "issueCredential",
            (
                fingerprint.to_h256(),
                content_address.to_string(),
                subject_did.to_string(),
            ),
        )
        .await
    }

    async fn get_credential(&self, fingerprint: &Fingerprint) -> Result<Option<RegistryRecord>, Error> {
        let call = self
            .contract
            .method::<_, CredentialTuple>("getCredential", fingerprint.to_h256())
            .map_err(|e| Error::RegistryUnreachable(e.to_string()))?;

        match call.call().await {
            // Unknown ids come back zeroed; the issuer is never the zero address.
            Ok((_, issuer, _, _, _)) if issuer.is_zero() => Ok(None),
            Ok((content_address, issuer, subject_did, timestamp, revoked)) => Ok(Some(RegistryRecord {
                fingerprint: *fingerprint,
                content_address,
                issuer,
                subject_did,
                timestamp: timestamp.low_u64(),
                revoked,
            })),
            Err(ContractError::Revert(_)) => Ok(None),
            Err(e) => Err(Error::RegistryUnreachable(e.to_string())),
        }
    }

    async fn revoke_credential(&self, fingerprint: &Fingerprint) -> Result<TxRef, Error> {
        self.submit("revokeCredential", fingerprint.to_h256()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry_client::RegistryClient;
    use ethers::providers::{Http, Provider};
    use ethers_core::abi::{encode, Token};
    use ethers_core::utils::{hex, to_checksum};
    use mockito::{mock, Matcher, Mock};
    use serde_json::{json, Value};
    use std::time::Duration;

    const TX_HASH: &str = "0xabababababababababababababababababababababababababababababababab";
    const BLOCK_HASH: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";
    const SENDER: &str = "0x1111111111111111111111111111111111111111";
    const CONTRACT: &str = "0x4242424242424242424242424242424242424242";

    /// Answers every JSON-RPC call of `method` with `result`.
    fn rpc(method: &str, result: Value) -> Mock {
        mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
            .create()
    }

    fn registry() -> Arc<CredentialRegistry<Provider<Http>>> {
        let provider = Provider::<Http>::try_from(mockito::server_url().as_str())
            .unwrap()
            .interval(Duration::from_millis(10));
        Arc::new(CredentialRegistry::new(Arc::new(provider), Address::repeat_byte(0x42)).unwrap())
    }

    /// ABI encoding of a `getCredential` result.
    fn encoded_record(content_address: &str, issuer: Address, subject: &str, revoked: bool) -> Value {
        let record = Token::Tuple(vec![
            Token::String(content_address.into()),
            Token::Address(issuer),
            Token::String(subject.into()),
            Token::Uint(U256::from(1_700_000_000u64)),
            Token::Bool(revoked),
        ]);
        json!(format!("0x{}", hex::encode(encode(&[record]))))
    }

    fn deployed() -> Mock {
        rpc("eth_getCode", json!("0x6080604052"))
    }

    #[tokio::test]
    async fn empty_code_means_not_deployed() {
        let _code = rpc("eth_getCode", json!("0x"));
        let client = RegistryClient::new(registry());

        match client.preflight().await {
            Err(Error::RegistryNotDeployed { address }) => {
                assert_eq!(address, to_checksum(&Address::repeat_byte(0x42), None));
            }
            other => panic!("expected RegistryNotDeployed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn node_errors_mean_unreachable() {
        let _code = mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "eth_getCode" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#)
            .create();
        let client = RegistryClient::new(registry());

        assert!(matches!(
            client.preflight().await,
            Err(Error::RegistryUnreachable(_))
        ));
    }

    #[tokio::test]
    async fn zeroed_records_are_not_found() {
        let _code = deployed();
        let _call = rpc("eth_call", encoded_record("", Address::zero(), "", false));
        let fingerprint = Fingerprint::from_bytes([7; 32]);

        assert_eq!(registry().get_credential(&fingerprint).await.unwrap(), None);
        assert!(matches!(
            RegistryClient::new(registry()).lookup(&fingerprint).await,
            Err(Error::NotFound { what: "credential", .. })
        ));
    }

    #[tokio::test]
    async fn decodes_registered_records() {
        let _code = deployed();
        let issuer = Address::repeat_byte(0x11);
        let _call = rpc(
            "eth_call",
            encoded_record("bafkreiexample", issuer, "did:ethr:sepolia:0xABCD", true),
        );
        let fingerprint = Fingerprint::from_bytes([7; 32]);

        let record = registry().get_credential(&fingerprint).await.unwrap().unwrap();
        assert_eq!(record.fingerprint, fingerprint);
        assert_eq!(record.content_address, "bafkreiexample");
        assert_eq!(record.issuer, issuer);
        assert_eq!(record.subject_did, "did:ethr:sepolia:0xABCD");
        assert_eq!(record.timestamp, 1_700_000_000);
        assert!(record.revoked);
    }

    #[tokio::test]
    async fn reverted_revocations_fail() {
        let _code = deployed();
        let _call = rpc(
            "eth_call",
            encoded_record("bafkreiexample", Address::repeat_byte(0x11), "did:ethr:sepolia:0xABCD", false),
        );
        let _block = rpc(
            "eth_getBlockByNumber",
            json!({
                "number": "0x10",
                "hash": BLOCK_HASH,
                "timestamp": "0x6553f100",
                "gasLimit": "0x1c9c380",
                "gasUsed": "0x0",
                "baseFeePerGas": "0x7",
                "transactions": [],
                "uncles": []
            }),
        );
        let _fees = rpc(
            "eth_feeHistory",
            json!({
                "oldestBlock": "0x10",
                "baseFeePerGas": ["0x7", "0x7"],
                "gasUsedRatio": [0.5],
                "reward": [["0x1"]]
            }),
        );
        let _gas = rpc("eth_estimateGas", json!("0x5208"));
        let _send = rpc("eth_sendTransaction", json!(TX_HASH));
        let _tx = rpc(
            "eth_getTransactionByHash",
            json!({
                "hash": TX_HASH,
                "nonce": "0x0",
                "blockHash": BLOCK_HASH,
                "blockNumber": "0x10",
                "transactionIndex": "0x0",
                "from": SENDER,
                "to": CONTRACT,
                "value": "0x0",
                "gasPrice": "0x7",
                "gas": "0x5208",
                "input": "0x",
                "v": "0x1",
                "r": "0x1",
                "s": "0x1"
            }),
        );
        let _receipt = rpc(
            "eth_getTransactionReceipt",
            json!({
                "transactionHash": TX_HASH,
                "transactionIndex": "0x0",
                "blockHash": BLOCK_HASH,
                "blockNumber": "0x10",
                "from": SENDER,
                "to": CONTRACT,
                "cumulativeGasUsed": "0x5208",
                "gasUsed": "0x5208",
                "contractAddress": null,
                "logs": [],
                "status": "0x0",
                "logsBloom": format!("0x{}", "00".repeat(256)),
                "type": "0x2",
                "effectiveGasPrice": "0x7"
            }),
        );

        let client = RegistryClient::new(registry());
        match client.revoke(&Fingerprint::from_bytes([7; 32])).await {
            Err(Error::TransactionFailed(reason)) => assert!(reason.contains("reverted"), "{reason}"),
            other => panic!("expected TransactionFailed, got {other:?}"),
        }
    }
}
