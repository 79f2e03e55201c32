// src/services/lifecycle.rs
//! Credential lifecycle orchestration.
//!
//! Sequences the components into the issuance, verification and revocation
//! workflows. Each workflow walks a fixed list of steps; the first failing
//! step ends it, and the result is returned as an [`Outcome`] envelope
//! naming that step. Nothing is rolled back: an artifact stored before a
//! failed registration stays in the content store and is simply stored
//! again when the request is re-issued.

use chrono::Utc;
use ethers_core::utils::to_checksum;
use log::{debug, error, info};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, ErrorKind, WorkflowError};
use crate::identity::derive_did;
use crate::identity::resolver::DidResolver;
use crate::models::credential::{Claims, SignedCredential};
use crate::models::did::{Did, DidDocument};
use crate::models::registry::{Fingerprint, TxRef};
use crate::services::credential_issuer::build_at;
use crate::services::registry_client::{fingerprint, RegistryClient};
use crate::services::verifier::verify;
use crate::storage::{ContentAddress, ContentAddressing};
use crate::wallet::signer::WalletSigner;

/// Steps of the issuance workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStep {
    Idle,
    DerivingIdentity,
    Building,
    Storing,
    Fingerprinting,
    Registering,
    Done,
}

/// Steps of the verification workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStep {
    Idle,
    LookingUp,
    CheckingRevocation,
    Fetching,
    Verifying,
    Done,
}

/// Steps of the revocation workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStep {
    Idle,
    Revoking,
    Done,
}

/// Step of standalone DID resolution.
pub const RESOLVING: &str = "Resolving";
/// Step of request validation, before any workflow starts.
pub const VALIDATING: &str = "Validating";

/// A workflow step with a stable name.
trait Step: Copy + fmt::Display {
    fn name(self) -> &'static str;
}

macro_rules! steps {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl Step for $ty {
            fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant),)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

steps!(IssuanceStep { Idle, DerivingIdentity, Building, Storing, Fingerprinting, Registering, Done });
steps!(VerificationStep { Idle, LookingUp, CheckingRevocation, Fetching, Verifying, Done });
steps!(RevocationStep { Idle, Revoking, Done });

/// Tracks the current step of one workflow run and logs every transition.
struct Progress<S: Step> {
    workflow: &'static str,
    step: S,
}

impl<S: Step> Progress<S> {
    fn start(workflow: &'static str, idle: S) -> Self {
        debug!("{workflow}: start at {idle}");
        Self { workflow, step: idle }
    }

    fn enter(&mut self, next: S) {
        debug!("{}: {} -> {}", self.workflow, self.step, next);
        self.step = next;
    }

    /// Annotates a component error with the current step.
    fn fail(&self, error: Error) -> WorkflowError {
        error!("{}: failed at {}: {error}", self.workflow, self.step);
        WorkflowError::new(self.step.name(), error)
    }
}

/// Result envelope of a public workflow call.
///
/// Serializes as `{"success": true, ...value}` or
/// `{"success": false, "error": {"kind", "step", "message"}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(WorkflowError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&WorkflowError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T, WorkflowError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, WorkflowError>> for Outcome<T> {
    fn from(result: Result<T, WorkflowError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}

/// Serialized form of a failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureBody {
    pub kind: ErrorKind,
    pub step: String,
    pub message: String,
}

impl From<&WorkflowError> for FailureBody {
    fn from(err: &WorkflowError) -> Self {
        Self {
            kind: err.kind(),
            step: err.step.to_string(),
            message: err.error.to_string(),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Success<'a, T> {
            success: bool,
            #[serde(flatten)]
            value: &'a T,
        }

        #[derive(Serialize)]
        struct Failure {
            success: bool,
            error: FailureBody,
        }

        match self {
            Outcome::Success(value) => Success {
                success: true,
                value,
            }
            .serialize(serializer),
            Outcome::Failure(err) => Failure {
                success: false,
                error: err.into(),
            }
            .serialize(serializer),
        }
    }
}

/// A request to issue one credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Subject DID
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub claims: Claims,
    /// Expiry, epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl IssueRequest {
    pub fn new(subject: impl Into<String>, claims: Claims) -> Self {
        Self {
            subject: subject.into(),
            credential_type: None,
            claims,
            expires_at: None,
        }
    }

    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.credential_type = Some(credential_type.into());
        self
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Reads a request from untyped JSON.
    ///
    /// # Errors
    /// `InvalidPayload` naming the first field that does not fit.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        serde_json::from_value(value.clone()).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Lists every problem with the request; empty when it is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.subject.trim().is_empty() {
            problems.push("subject is required".to_string());
        }
        if self.claims.is_empty() {
            problems.push("at least one claim is required".to_string());
        } else if let Err(err) = self.claims.validate() {
            problems.push(err.to_string());
        }
        if matches!(&self.credential_type, Some(t) if t.trim().is_empty()) {
            problems.push("credential type must not be blank".to_string());
        }
        problems
    }
}

/// A credential that was issued and registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issued {
    /// Fingerprint under which the credential is registered
    pub credential_id: Fingerprint,
    pub vc_jwt: SignedCredential,
    pub content_address: ContentAddress,
    pub tx_ref: TxRef,
    pub issuer_did: String,
    pub subject_did: String,
}

/// A credential that passed verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCredential {
    pub credential_id: Fingerprint,
    pub valid: bool,
    pub issuer_did: String,
    pub subject_did: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    pub claims: Claims,
    pub issued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub content_address: String,
    /// Registration time, epoch seconds
    pub registered_at: u64,
}

/// A completed revocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    pub credential_id: Fingerprint,
    pub tx_ref: TxRef,
}

/// Counts of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// One entry of a batch, echoing its input as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    pub input: Value,
    pub result: Outcome<Issued>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchIssuance {
    pub summary: BatchSummary,
    pub results: Vec<BatchEntry>,
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Runs credential workflows against injected components.
#[derive(Clone)]
pub struct Orchestrator {
    network: String,
    signer: Arc<dyn WalletSigner>,
    resolver: Arc<dyn DidResolver>,
    content: ContentAddressing,
    registry: RegistryClient,
    clock: Clock,
}

impl Orchestrator {
    /// # Arguments
    /// * `network` - network name used in derived DIDs, e.g. `sepolia`
    /// * `signer` - issuer wallet
    /// * `resolver` - resolves issuer DIDs during verification
    /// * `content` - content addressing over the artifact store
    /// * `registry` - on-chain registry client
    pub fn new(
        network: impl Into<String>,
        signer: Arc<dyn WalletSigner>,
        resolver: Arc<dyn DidResolver>,
        content: ContentAddressing,
        registry: RegistryClient,
    ) -> Self {
        Self {
            network: network.into(),
            signer,
            resolver,
            content,
            registry,
            clock: Arc::new(|| Utc::now().timestamp()),
        }
    }

    /// Replaces the wall clock used for issuance times and expiry checks.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// DID of the issuer wallet.
    pub fn issuer_did(&self) -> Result<Did, Error> {
        derive_did(&to_checksum(&self.signer.address(), None), &self.network)
    }

    /// Issues one credential and registers its fingerprint.
    pub async fn issue_credential(&self, request: &IssueRequest) -> Outcome<Issued> {
        let outcome: Outcome<Issued> = self.run_issuance(request).await.into();
        if let Outcome::Success(issued) = &outcome {
            info!(
                "Issued credential {} to {} ({})",
                issued.credential_id, issued.subject_did, issued.content_address
            );
        }
        outcome
    }

    async fn run_issuance(&self, request: &IssueRequest) -> Result<Issued, WorkflowError> {
        let mut progress = Progress::start("issuance", IssuanceStep::Idle);

        progress.enter(IssuanceStep::DerivingIdentity);
        let issuer_did = self.issuer_did().map_err(|e| progress.fail(e))?.to_string();

        progress.enter(IssuanceStep::Building);
        let problems = request.validate();
        if !problems.is_empty() {
            return Err(progress.fail(Error::InvalidPayload(problems.join("; "))));
        }
        let signed = build_at(
            &issuer_did,
            &request.subject,
            request.credential_type.as_deref(),
            request.claims.clone(),
            (self.clock)(),
            request.expires_at,
            self.signer.as_ref(),
        )
        .await
        .map_err(|e| progress.fail(e))?;

        progress.enter(IssuanceStep::Storing);
        let content_address = self
            .content
            .put(signed.as_bytes())
            .await
            .map_err(|e| progress.fail(e))?;

        progress.enter(IssuanceStep::Fingerprinting);
        let credential_id = fingerprint(&signed);

        progress.enter(IssuanceStep::Registering);
        let tx_ref = self
            .registry
            .register(&credential_id, &content_address, &request.subject)
            .await
            .map_err(|e| progress.fail(e))?;

        progress.enter(IssuanceStep::Done);
        Ok(Issued {
            credential_id,
            vc_jwt: signed,
            content_address,
            tx_ref,
            issuer_did,
            subject_did: request.subject.clone(),
        })
    }

    /// Issues each request in order. A failing entry does not stop the
    /// batch.
    pub async fn issue_multiple_credentials(&self, requests: &[IssueRequest]) -> Outcome<BatchIssuance> {
        let entries = requests
            .iter()
            .map(|request| (serde_json::to_value(request).unwrap_or_default(), Ok(request.clone())))
            .collect();
        self.run_batch(entries).await
    }

    /// Issues a batch of untyped requests. An entry that is not a valid
    /// request fails on its own at step `Validating`.
    pub async fn issue_batch_entries(&self, entries: &[Value]) -> Outcome<BatchIssuance> {
        let entries = entries
            .iter()
            .map(|value| (value.clone(), IssueRequest::from_value(value)))
            .collect();
        self.run_batch(entries).await
    }

    async fn run_batch(&self, entries: Vec<(Value, Result<IssueRequest, Error>)>) -> Outcome<BatchIssuance> {
        if entries.is_empty() {
            return Outcome::Failure(WorkflowError::new(
                VALIDATING,
                Error::InvalidPayload("batch contains no requests".into()),
            ));
        }

        let mut results = Vec::with_capacity(entries.len());
        for (index, (input, request)) in entries.into_iter().enumerate() {
            let result = match request {
                Ok(request) => self.issue_credential(&request).await,
                Err(e) => {
                    error!("batch entry {index} rejected: {e}");
                    Outcome::Failure(WorkflowError::new(VALIDATING, e))
                }
            };
            results.push(BatchEntry { index, input, result });
        }

        let successful = results.iter().filter(|entry| entry.result.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        };
        info!(
            "Batch issuance finished: {} of {} succeeded",
            summary.successful, summary.total
        );
        Outcome::Success(BatchIssuance { summary, results })
    }

    /// Looks up, re-fetches and re-validates a registered credential.
    pub async fn verify_credential(&self, credential_id: &Fingerprint) -> Outcome<VerifiedCredential> {
        let outcome: Outcome<VerifiedCredential> = self.run_verification(credential_id).await.into();
        if outcome.is_success() {
            info!("Credential {credential_id} verified");
        }
        outcome
    }

    async fn run_verification(&self, credential_id: &Fingerprint) -> Result<VerifiedCredential, WorkflowError> {
        let mut progress = Progress::start("verification", VerificationStep::Idle);

        progress.enter(VerificationStep::LookingUp);
        let record = self
            .registry
            .lookup(credential_id)
            .await
            .map_err(|e| progress.fail(e))?;

        progress.enter(VerificationStep::CheckingRevocation);
        if record.revoked {
            return Err(progress.fail(Error::Revoked(credential_id.to_string())));
        }

        progress.enter(VerificationStep::Fetching);
        let address: ContentAddress = record
            .content_address
            .parse()
            .map_err(|e| progress.fail(e))?;
        let bytes = self.content.get(&address).await.map_err(|e| progress.fail(e))?;

        progress.enter(VerificationStep::Verifying);
        let signed = SignedCredential::from_bytes(bytes).map_err(|e| progress.fail(e))?;
        let actual = fingerprint(&signed);
        if actual != *credential_id {
            return Err(progress.fail(Error::ContentMismatch {
                expected: credential_id.to_string(),
                actual: actual.to_string(),
            }));
        }
        let verified = verify(&signed, self.resolver.as_ref())
            .await
            .map_err(|e| progress.fail(e))?;
        let payload = verified.payload;
        if let Some(exp) = payload.exp {
            if exp <= (self.clock)() {
                return Err(progress.fail(Error::Expired(exp)));
            }
        }

        progress.enter(VerificationStep::Done);
        Ok(VerifiedCredential {
            credential_id: *credential_id,
            valid: verified.valid,
            credential_type: payload.credential_type().map(str::to_string),
            claims: payload.claims().clone(),
            issuer_did: payload.iss,
            subject_did: payload.sub,
            issued_at: payload.nbf,
            expires_at: payload.exp,
            content_address: record.content_address,
            registered_at: record.timestamp,
        })
    }

    /// Revokes a registered credential.
    pub async fn revoke_credential(&self, credential_id: &Fingerprint) -> Outcome<Revocation> {
        let mut progress = Progress::start("revocation", RevocationStep::Idle);

        progress.enter(RevocationStep::Revoking);
        let result = match self.registry.revoke(credential_id).await {
            Ok(tx_ref) => {
                progress.enter(RevocationStep::Done);
                info!("Credential {credential_id} revoked");
                Ok(Revocation {
                    credential_id: *credential_id,
                    tx_ref,
                })
            }
            Err(e) => Err(progress.fail(e)),
        };
        result.into()
    }

    /// Resolves any DID through the configured resolver.
    pub async fn resolve_did(&self, did: &str) -> Outcome<DidDocument> {
        let result = match did.parse::<Did>() {
            Ok(did) => self.resolver.resolve(&did).await,
            Err(e) => Err(e),
        };
        result
            .map_err(|e| {
                error!("resolution of {did} failed: {e}");
                WorkflowError::new(RESOLVING, e)
            })
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::memory::MemoryRegistry;
    use crate::identity::resolver::MemoryResolver;
    use crate::storage::memory::MemoryContentStore;
    use crate::wallet::key_management::KeyManager;
    use ethers_core::types::Address;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        orchestrator: Orchestrator,
        store: Arc<MemoryContentStore>,
        registry: Arc<MemoryRegistry>,
    }

    fn fixture() -> Fixture {
        let keys = KeyManager::new();
        let resolver = MemoryResolver::new();
        resolver.insert(keys.did_document("sepolia", 11155111));
        let store = Arc::new(MemoryContentStore::new());
        let registry = Arc::new(MemoryRegistry::new(Address::repeat_byte(0x42), keys.address()));
        let orchestrator = Orchestrator::new(
            "sepolia",
            Arc::new(keys),
            Arc::new(resolver),
            ContentAddressing::new(store.clone()),
            RegistryClient::new(registry.clone()),
        )
        .with_clock(|| NOW);
        Fixture {
            orchestrator,
            store,
            registry,
        }
    }

    fn degree() -> IssueRequest {
        IssueRequest::new(
            "did:ethr:sepolia:0xABCD",
            [("institution", "X University"), ("degree", "BSc")].into_iter().collect(),
        )
        .with_type("UniversityDegreeCredential")
    }

    #[test]
    fn validate_lists_every_problem() {
        let mut request = IssueRequest::new(" ", Claims::new());
        request.credential_type = Some(String::new());
        assert_eq!(request.validate().len(), 3);
        assert!(degree().validate().is_empty());
    }

    #[tokio::test]
    async fn issued_credentials_verify() {
        let f = fixture();
        let issued = f.orchestrator.issue_credential(&degree()).await.into_result().unwrap();
        assert_eq!(issued.credential_id, fingerprint(&issued.vc_jwt));

        let verified = f
            .orchestrator
            .verify_credential(&issued.credential_id)
            .await
            .into_result()
            .unwrap();
        assert!(verified.valid);
        assert_eq!(verified.subject_did, "did:ethr:sepolia:0xABCD");
        assert_eq!(verified.issuer_did, issued.issuer_did);
        assert_eq!(verified.credential_type.as_deref(), Some("UniversityDegreeCredential"));
        assert_eq!(verified.issued_at, NOW);
    }

    #[tokio::test]
    async fn invalid_requests_fail_while_building() {
        let f = fixture();
        let outcome = f
            .orchestrator
            .issue_credential(&IssueRequest::new("did:ethr:sepolia:0xABCD", Claims::new()))
            .await;
        let err = outcome.failure().unwrap();
        assert_eq!(err.step, "Building");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn blank_credential_types_fail_while_building() {
        let f = fixture();
        let err = f
            .orchestrator
            .issue_credential(&degree().with_type(""))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.step, "Building");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(f.store.is_empty());
        assert_eq!(f.registry.len(), 0);
    }

    #[tokio::test]
    async fn unreadable_batch_entries_fail_alone() {
        let f = fixture();
        let entries = vec![
            serde_json::to_value(degree()).unwrap(),
            serde_json::json!({
                "subject": "did:ethr:sepolia:0xBEEF",
                "claims": { "degree": { "name": "BSc" } }
            }),
            serde_json::to_value(IssueRequest::new(
                "did:ethr:sepolia:0xCAFE",
                [("degree", "MSc")].into_iter().collect(),
            ))
            .unwrap(),
        ];

        let batch = f
            .orchestrator
            .issue_batch_entries(&entries)
            .await
            .into_result()
            .unwrap();
        assert_eq!(
            batch.summary,
            BatchSummary {
                total: 3,
                successful: 2,
                failed: 1
            }
        );
        let err = batch.results[1].result.failure().unwrap();
        assert_eq!(err.step, VALIDATING);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(batch.results[1].input, entries[1]);
        assert_eq!(f.registry.len(), 2);
    }

    #[tokio::test]
    async fn reissuing_the_same_artifact_is_rejected() {
        let f = fixture();
        assert!(f.orchestrator.issue_credential(&degree()).await.is_success());

        // Same request, same clock, deterministic signature: same bytes.
        let err = f.orchestrator.issue_credential(&degree()).await.into_result().unwrap_err();
        assert_eq!(err.step, "Registering");
        assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
        assert_eq!(f.registry.len(), 1);
    }

    #[tokio::test]
    async fn revoked_credentials_are_not_fetched() {
        let f = fixture();
        let issued = f.orchestrator.issue_credential(&degree()).await.into_result().unwrap();
        assert!(f.orchestrator.revoke_credential(&issued.credential_id).await.is_success());

        let reads_before = f.store.reads();
        let err = f
            .orchestrator
            .verify_credential(&issued.credential_id)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.step, "CheckingRevocation");
        assert_eq!(err.kind(), ErrorKind::Revoked);
        assert_eq!(f.store.reads(), reads_before);
    }

    #[tokio::test]
    async fn expired_credentials_fail_verification() {
        let f = fixture();
        let issued = f
            .orchestrator
            .issue_credential(&degree().expiring_at(NOW + 60))
            .await
            .into_result()
            .unwrap();

        let later = f.orchestrator.clone().with_clock(|| NOW + 3600);
        let err = later
            .verify_credential(&issued.credential_id)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.step, "Verifying");
        assert_eq!(err.error, Error::Expired(NOW + 60));
    }

    #[tokio::test]
    async fn tampered_content_is_detected() {
        let f = fixture();
        let issued = f.orchestrator.issue_credential(&degree()).await.into_result().unwrap();
        f.store.tamper(&issued.content_address, b"x.y.z".to_vec());

        let err = f
            .orchestrator
            .verify_credential(&issued.credential_id)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.step, "Fetching");
        assert_eq!(err.kind(), ErrorKind::ContentMismatch);
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        let f = fixture();
        let err = f.orchestrator.issue_multiple_credentials(&[]).await.into_result().unwrap_err();
        assert_eq!(err.step, VALIDATING);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = f.orchestrator.issue_batch_entries(&[]).await.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn failure_envelopes_name_kind_and_step() {
        let f = fixture();
        let unknown = Fingerprint::from_bytes([7; 32]);
        let outcome = f.orchestrator.verify_credential(&unknown).await;

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "NotFound");
        assert_eq!(json["error"]["step"], "LookingUp");
    }

    #[tokio::test]
    async fn success_envelopes_flatten_the_value() {
        let f = fixture();
        let outcome = f.orchestrator.issue_credential(&degree()).await;

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["vcJwt"].as_str().unwrap().split('.').count() == 3);
        assert!(json["contentAddress"].as_str().unwrap().starts_with("bafkrei"));
    }

    #[tokio::test]
    async fn resolves_the_issuer_did() {
        let f = fixture();
        let did = f.orchestrator.issuer_did().unwrap().to_string();
        let document = f.orchestrator.resolve_did(&did).await.into_result().unwrap();
        assert_eq!(document.id, did);

        let err = f.orchestrator.resolve_did("not-a-did").await.into_result().unwrap_err();
        assert_eq!(err.step, RESOLVING);
    }
}
