// src/identity/resolver.rs
//! DID resolution.
//!
//! The resolution network is a black box behind [`DidResolver`]. Two
//! implementations live here:
//! - [`HttpResolver`]: a DIF Universal Resolver compatible HTTP endpoint
//! - [`MemoryResolver`]: a fixed table of documents, for tests and demos

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::error::Error;
use crate::models::did::{Did, DidDocument};

/// Resolves a DID to its document.
///
/// # Errors
/// Implementations return `NotFound` when the DID has no document and
/// `ResolutionError` for everything else (transport failures, unsupported
/// method or network).
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, Error>;
}

/// Body of a Universal Resolver response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionResponse {
    #[serde(default)]
    did_document: Option<DidDocument>,
    #[serde(default)]
    did_resolution_metadata: ResolutionMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ResolutionMetadata {
    #[serde(default)]
    error: Option<String>,
}

/// Resolver backed by `GET {base_url}/1.0/identifiers/{did}`.
#[derive(Clone, Debug)]
pub struct HttpResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResolver {
    /// Creates a resolver for the given base URL, e.g.
    /// `https://dev.uniresolver.io`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DidResolver for HttpResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, Error> {
        let url = format!("{}/1.0/identifiers/{}", self.base_url, did);
        debug!("Resolving {did} via {url}");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/did+ld+json, application/json")
            .send()
            .await
            .map_err(|e| Error::ResolutionError(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::ResolutionError(e.to_string()))?;

        // Resolvers answer either with a resolution result or with the bare
        // document, depending on the Accept header they honour.
        let parsed = serde_json::from_slice::<ResolutionResponse>(&body).ok();
        if let Some(error) = parsed
            .as_ref()
            .and_then(|r| r.did_resolution_metadata.error.as_deref())
        {
            return Err(match error {
                "notFound" | "deactivated" => Error::not_found("DID document", did.to_string()),
                other => Error::ResolutionError(format!("{did}: {other}")),
            });
        }
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(Error::not_found("DID document", did.to_string()));
        }
        if !status.is_success() {
            return Err(Error::ResolutionError(format!("{did}: resolver answered {status}")));
        }

        match parsed.and_then(|r| r.did_document) {
            Some(document) => Ok(document),
            None => serde_json::from_slice::<DidDocument>(&body)
                .map_err(|e| Error::ResolutionError(format!("{did}: unreadable document: {e}"))),
        }
    }
}

/// In-memory DID table.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    documents: RwLock<HashMap<String, DidDocument>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the document registered for `document.id`.
    pub fn insert(&self, document: DidDocument) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.insert(document.id.clone(), document);
    }
}

#[async_trait]
impl DidResolver for MemoryResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, Error> {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        documents
            .get(&did.to_string())
            .cloned()
            .ok_or_else(|| Error::not_found("DID document", did.to_string()))
    }
}
