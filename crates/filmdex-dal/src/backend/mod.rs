//! Backend trait seam to the document store.
//!
//! The client never talks to the wire directly; it goes through
//! [`DocumentBackend`], and builds backends through [`Connector`]. The
//! default implementation is the REST transport; tests use the in-memory
//! store in the `memory` module.

mod auth;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
mod rest;

pub use rest::{RestConnector, RestStore};

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::{Query, StoreConfig};
use crate::Result;

/// One page's worth of fetch parameters.
///
/// The continuation token is opaque to this layer; the store mints it and
/// the next fetch hands it back unchanged.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Maximum items the store may return in this page.
    pub max_items: usize,
    /// Continuation token from the previous page, if any.
    pub continuation: Option<String>,
}

impl PageRequest {
    /// Creates a request for the first page.
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            continuation: None,
        }
    }

    /// Creates the request for the page after this one.
    pub fn next(&self, continuation: String) -> Self {
        Self {
            max_items: self.max_items,
            continuation: Some(continuation),
        }
    }
}

/// A decoded page from the typed query path.
///
/// Items arrive already decoded to JSON values by the driver; the client
/// maps them into the caller's element type.
#[derive(Debug, Default)]
pub struct TypedPage {
    /// Items in store order.
    pub items: Vec<serde_json::Value>,
    /// Token for the next page; `None` when the cursor is exhausted.
    pub continuation: Option<String>,
}

/// An undecoded page from the raw query path.
///
/// The frame is the store's JSON envelope (results array plus count); the
/// client decodes it structurally.
#[derive(Debug, Default)]
pub struct RawPage {
    /// Raw envelope bytes for this page.
    pub frame: Bytes,
    /// Token for the next page; `None` when the cursor is exhausted.
    pub continuation: Option<String>,
}

/// Handle to an open document-store container.
///
/// One backend is authoritative at a time; the client swaps in a new one on
/// reconnect and abandons the old.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Point-reads a document by id and partition key.
    ///
    /// Returns the raw document body. Used by the client's smoke test; any
    /// failure, including not-found, propagates.
    async fn read_document(&self, id: &str, partition_key: &str) -> Result<Bytes>;

    /// Fetches one page of a structured query via the typed path.
    async fn query_page(&self, query: &Query, page: &PageRequest) -> Result<TypedPage>;

    /// Fetches one page of a raw-text query as an undecoded envelope frame.
    async fn query_raw_page(&self, query: &str, page: &PageRequest) -> Result<RawPage>;
}

/// Factory for backends bound to a validated configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Builds a backend from the given configuration.
    ///
    /// Constructs the transport only; liveness is the client's smoke test.
    async fn connect(&self, config: &StoreConfig) -> Result<Box<dyn DocumentBackend>>;
}
