//! REST transport to the document store.
//!
//! Speaks the store's HTTP API directly: signed `x-ms-*` headers, GET for
//! point reads, POST with `application/query+json` for queries, and the
//! `x-ms-continuation` header for paging. Transient failures (429, 5xx,
//! request errors) are retried here with a bounded linear backoff; the
//! client layer above never retries.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use super::auth::{self, KeyMac};
use super::{Connector, DocumentBackend, PageRequest, RawPage, TypedPage};
use crate::client::{Query, QueryEnvelope, StoreConfig};
use crate::{Error, REST_TARGET, Result};

/// Wire API version sent with every request.
const API_VERSION: &str = "2018-12-31";

/// Base delay between transport retries, multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Builds [`RestStore`] backends. The default connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestConnector;

#[async_trait]
impl Connector for RestConnector {
    async fn connect(&self, config: &StoreConfig) -> Result<Box<dyn DocumentBackend>> {
        Ok(Box::new(RestStore::new(config)?))
    }
}

/// REST backend bound to one database container.
pub struct RestStore {
    http: reqwest::Client,
    endpoint: Url,
    /// Resource link of the bound container, e.g. `dbs/catalog/colls/titles`.
    container_link: String,
    mac: KeyMac,
    max_retries: u32,
}

impl RestStore {
    /// Creates a new REST backend from a validated configuration.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mac = auth::master_key_mac(config.key())?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("filmdex-dal/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::connection_with("failed to build HTTP client", e))?;

        let container_link = format!("dbs/{}/colls/{}", config.database(), config.container());

        debug!(
            target: REST_TARGET,
            endpoint = %config.endpoint(),
            container = %container_link,
            timeout = ?config.timeout(),
            "REST store initialized"
        );

        Ok(Self {
            http,
            endpoint: config.endpoint().clone(),
            container_link,
            mac,
            max_retries: config.max_retries(),
        })
    }

    fn resource_url(&self, link: &str) -> Result<Url> {
        self.endpoint
            .join(link)
            .map_err(|e| Error::connection_with(format!("invalid resource link '{link}'"), e))
    }

    /// Sends a signed request, retrying transient failures.
    ///
    /// The date and signature are recomputed per attempt. Non-success
    /// statuses that are not transient are returned to the caller for
    /// kind-specific mapping.
    async fn send_with_retry<F>(
        &self,
        verb: &str,
        resource_link: &str,
        mut build: F,
    ) -> std::result::Result<reqwest::Response, reqwest::Error>
    where
        F: FnMut(&str, &str) -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            let date = auth::http_date();
            let token = auth::sign(&self.mac, verb, "docs", resource_link, &date);

            let result = build(&date, &token).send().await;

            let retryable = match &result {
                Ok(response) => is_transient_status(response.status()),
                Err(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            };

            if retryable && attempt < self.max_retries {
                attempt += 1;
                let backoff = RETRY_BACKOFF * attempt;

                warn!(
                    target: REST_TARGET,
                    attempt = attempt,
                    max_retries = self.max_retries,
                    backoff_ms = backoff.as_millis(),
                    resource = resource_link,
                    "transient failure, retrying"
                );

                tokio::time::sleep(backoff).await;
                continue;
            }

            return result;
        }
    }

    /// Issues one query page fetch and returns the response plus the
    /// continuation token for the following page.
    async fn query_request(
        &self,
        body: Vec<u8>,
        page: &PageRequest,
    ) -> Result<(Bytes, Option<String>)> {
        let url = self.resource_url(&format!("{}/docs", self.container_link))?;

        let response = self
            .send_with_retry("post", &self.container_link, |date, token| {
                let mut request = self
                    .http
                    .post(url.clone())
                    .header("authorization", token)
                    .header("x-ms-date", date)
                    .header("x-ms-version", API_VERSION)
                    .header("x-ms-documentdb-isquery", "true")
                    .header("x-ms-documentdb-query-enablecrosspartition", "true")
                    .header("x-ms-max-item-count", page.max_items.to_string())
                    .header("content-type", "application/query+json")
                    .body(body.clone());

                if let Some(ref continuation) = page.continuation {
                    request = request.header("x-ms-continuation", continuation.as_str());
                }

                request
            })
            .await
            .map_err(|e| Error::query_with("query page fetch failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::query(format!(
                "query against '{}' failed with status {status}",
                self.container_link,
            )));
        }

        let continuation = response
            .headers()
            .get("x-ms-continuation")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let frame = response
            .bytes()
            .await
            .map_err(|e| Error::query_with("failed to read query response body", e))?;

        debug!(
            target: REST_TARGET,
            bytes = frame.len(),
            has_continuation = continuation.is_some(),
            "query page received"
        );

        Ok((frame, continuation))
    }
}

#[async_trait]
impl DocumentBackend for RestStore {
    async fn read_document(&self, id: &str, partition_key: &str) -> Result<Bytes> {
        let doc_link = format!("{}/docs/{id}", self.container_link);
        let url = self.resource_url(&doc_link)?;
        let pk_header = format!("[\"{partition_key}\"]");

        let response = self
            .send_with_retry("get", &doc_link, |date, token| {
                self.http
                    .get(url.clone())
                    .header("authorization", token)
                    .header("x-ms-date", date)
                    .header("x-ms-version", API_VERSION)
                    .header("x-ms-documentdb-partitionkey", pk_header.as_str())
            })
            .await
            .map_err(|e| Error::connection_with(format!("point read of '{id}' failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::connection(format!(
                "point read of '{id}' failed with status {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::connection_with("failed to read document body", e))
    }

    async fn query_page(&self, query: &Query, page: &PageRequest) -> Result<TypedPage> {
        let body = serde_json::to_vec(query)
            .map_err(|e| Error::query_with("failed to encode query", e))?;

        let (frame, continuation) = self.query_request(body, page).await?;
        let envelope: QueryEnvelope<serde_json::Value> = QueryEnvelope::decode(&frame)?;

        Ok(TypedPage {
            items: envelope.documents,
            continuation,
        })
    }

    async fn query_raw_page(&self, query: &str, page: &PageRequest) -> Result<RawPage> {
        let body = serde_json::to_vec(&Query::new(query))
            .map_err(|e| Error::query_with("failed to encode query", e))?;

        let (frame, continuation) = self.query_request(body, page).await?;

        Ok(RawPage {
            frame,
            continuation,
        })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("container", &self.container_link)
            .finish_non_exhaustive()
    }
}
