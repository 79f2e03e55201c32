// src/services/api_server.rs
//! HTTP API for the credential lifecycle.
//!
//! A thin JSON surface over the [`Orchestrator`]. Every response body is an
//! [`Outcome`] envelope; the status code follows the error kind of a
//! failure.
//!
//! Endpoints:
//! - `POST /issue-credential`
//! - `POST /batch-issue-credentials`
//! - `GET  /verify-credential/:credential_id`
//! - `POST /revoke-credential`
//! - `GET  /resolve-did/:did`

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Json, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::{Error, ErrorKind, WorkflowError};
use crate::models::registry::Fingerprint;
use crate::services::lifecycle::{IssueRequest, Orchestrator, Outcome, VALIDATING};

/// Request payload for batch credential issuance
///
/// Entries stay untyped so that one unreadable entry fails on its own.
#[derive(Serialize, Deserialize)]
pub struct BatchIssueCredentialsRequest {
    pub credentials: Vec<Value>,
}

/// Request payload for revoking a credential
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCredentialRequest {
    #[serde(alias = "credential_id")]
    pub credential_id: String,
}

/// JSON body extractor that rejects with a failure envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(
                VALIDATING,
                Error::InvalidPayload(rejection.body_text()),
            )),
        }
    }
}

/// API server state
#[derive(Clone)]
pub struct ApiServer {
    orchestrator: Arc<Orchestrator>,
}

impl ApiServer {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Configures all API routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/issue-credential", post(Self::issue_credential_handler))
            .route("/batch-issue-credentials", post(Self::batch_issue_credentials_handler))
            .route("/verify-credential/:credential_id", get(Self::verify_credential_handler))
            .route("/revoke-credential", post(Self::revoke_credential_handler))
            .route("/resolve-did/:did", get(Self::resolve_did_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves requests until the task ends.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{addr}");
        axum::serve(listener, self.router()).await
    }

    /// Issues a new verifiable credential
    ///
    /// # Endpoint
    /// POST /issue-credential
    ///
    /// # Responses
    /// - 200 OK: credential id, JWT, content address and transaction
    /// - 400 Bad Request: unreadable body, invalid subject or claims
    /// - 409 Conflict: identical credential already registered
    /// - 502 Bad Gateway: registry or content store failure
    async fn issue_credential_handler(
        State(state): State<Arc<ApiServer>>,
        JsonBody(payload): JsonBody<IssueRequest>,
    ) -> Response {
        respond(state.orchestrator.issue_credential(&payload).await)
    }

    /// Issues several credentials, one after another
    ///
    /// # Endpoint
    /// POST /batch-issue-credentials
    ///
    /// # Responses
    /// - 200 OK: summary plus one result per input, even when some failed
    /// - 400 Bad Request: empty batch or unreadable body
    async fn batch_issue_credentials_handler(
        State(state): State<Arc<ApiServer>>,
        JsonBody(payload): JsonBody<BatchIssueCredentialsRequest>,
    ) -> Response {
        respond(
            state
                .orchestrator
                .issue_batch_entries(&payload.credentials)
                .await,
        )
    }

    /// Verifies a registered credential
    ///
    /// # Endpoint
    /// GET /verify-credential/:credential_id
    ///
    /// # Responses
    /// - 200 OK: decoded, signature-checked credential
    /// - 404 Not Found: unknown credential id
    /// - 410 Gone: revoked or expired
    async fn verify_credential_handler(
        Path(credential_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> Response {
        match credential_id.parse::<Fingerprint>() {
            Ok(fingerprint) => respond(state.orchestrator.verify_credential(&fingerprint).await),
            Err(e) => rejected("LookingUp", e),
        }
    }

    /// Revokes an existing credential
    ///
    /// # Endpoint
    /// POST /revoke-credential
    ///
    /// # Responses
    /// - 200 OK: revocation transaction
    /// - 404 Not Found: unknown credential id
    /// - 409 Conflict: already revoked
    async fn revoke_credential_handler(
        State(state): State<Arc<ApiServer>>,
        JsonBody(payload): JsonBody<RevokeCredentialRequest>,
    ) -> Response {
        match payload.credential_id.parse::<Fingerprint>() {
            Ok(fingerprint) => respond(state.orchestrator.revoke_credential(&fingerprint).await),
            Err(e) => rejected("Revoking", e),
        }
    }

    /// Resolves a DID to its document
    ///
    /// # Endpoint
    /// GET /resolve-did/:did
    async fn resolve_did_handler(
        Path(did): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> Response {
        respond(state.orchestrator.resolve_did(&did).await)
    }
}

fn rejected(step: &'static str, error: Error) -> Response {
    respond::<()>(Outcome::Failure(WorkflowError::new(step, error)))
}

fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = outcome
        .failure()
        .map(|err| status_for(err.kind()))
        .unwrap_or(StatusCode::OK);
    (status, Json(outcome)).into_response()
}

/// HTTP status of a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::MalformedCredential => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyRegistered | ErrorKind::AlreadyRevoked => StatusCode::CONFLICT,
        ErrorKind::Revoked | ErrorKind::Expired => StatusCode::GONE,
        ErrorKind::SignatureInvalid | ErrorKind::UnknownIssuer | ErrorKind::ContentMismatch => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::ResolutionError
        | ErrorKind::RegistryNotDeployed
        | ErrorKind::RegistryUnreachable
        | ErrorKind::TransactionFailed
        | ErrorKind::Storage => StatusCode::BAD_GATEWAY,
        ErrorKind::InvalidHexSignature | ErrorKind::SigningFailed | ErrorKind::Config => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
