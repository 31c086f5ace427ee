//! In-memory backend for testing.
//!
//! Serves documents from process memory with the same paging contract as
//! the REST transport, plus call counters and failure injection so tests
//! can assert on network behavior (e.g. that a no-op reconnect touches
//! nothing).
//!
//! Only available in tests or with the `test-utils` feature enabled.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use super::{Connector, DocumentBackend, PageRequest, RawPage, TypedPage};
use crate::client::{Query, StoreConfig};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    documents: Mutex<Vec<StoredDocument>>,
    reads: AtomicUsize,
    queries: AtomicUsize,
    raw_queries: AtomicUsize,
    /// Server-side cap on items per page; 0 means uncapped.
    page_cap: AtomicUsize,
    fail_reads: AtomicBool,
    fail_queries: AtomicBool,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    partition_key: String,
    body: serde_json::Value,
}

/// In-memory document store.
///
/// Queries ignore the query text and return every stored document in
/// insertion order, chunked by the requested page size; the continuation
/// token is the next offset.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document.
    pub fn insert(
        &self,
        id: impl Into<String>,
        partition_key: impl Into<String>,
        body: serde_json::Value,
    ) {
        self.inner
            .documents
            .lock()
            .expect("document lock poisoned")
            .push(StoredDocument {
                id: id.into(),
                partition_key: partition_key.into(),
                body,
            });
    }

    /// Removes every stored document.
    pub fn clear(&self) {
        self.inner
            .documents
            .lock()
            .expect("document lock poisoned")
            .clear();
    }

    /// Caps items per page regardless of what the request asks for, the
    /// way a real store may return short pages. Zero removes the cap.
    pub fn cap_page(&self, cap: usize) {
        self.inner.page_cap.store(cap, Ordering::SeqCst);
    }

    /// Makes subsequent point reads fail.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent query page fetches fail.
    pub fn fail_queries(&self, fail: bool) {
        self.inner.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of point reads served (or failed).
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of typed query pages served (or failed).
    pub fn query_count(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    /// Number of raw query pages served (or failed).
    pub fn raw_query_count(&self) -> usize {
        self.inner.raw_queries.load(Ordering::SeqCst)
    }

    fn page(&self, page: &PageRequest) -> Result<(Vec<serde_json::Value>, Option<String>)> {
        let documents = self
            .inner
            .documents
            .lock()
            .expect("document lock poisoned");

        let offset: usize = match page.continuation {
            Some(ref token) => token
                .parse()
                .map_err(|_| Error::query(format!("unknown continuation token '{token}'")))?,
            None => 0,
        };

        let mut max_items = page.max_items.max(1);
        let cap = self.inner.page_cap.load(Ordering::SeqCst);
        if cap > 0 {
            max_items = max_items.min(cap);
        }

        let end = (offset + max_items).min(documents.len());
        let items = documents[offset.min(end)..end]
            .iter()
            .map(|doc| doc.body.clone())
            .collect();

        let continuation = (end < documents.len()).then(|| end.to_string());
        Ok((items, continuation))
    }
}

#[async_trait]
impl DocumentBackend for MemoryStore {
    async fn read_document(&self, id: &str, partition_key: &str) -> Result<Bytes> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::connection("injected point read failure"));
        }

        let documents = self
            .inner
            .documents
            .lock()
            .expect("document lock poisoned");

        let found = documents
            .iter()
            .find(|doc| doc.id == id && doc.partition_key == partition_key)
            .ok_or_else(|| Error::connection(format!("document '{id}' not found")))?;

        let body = serde_json::to_vec(&found.body)
            .map_err(|e| Error::connection_with("failed to encode document", e))?;
        Ok(Bytes::from(body))
    }

    async fn query_page(&self, _query: &Query, page: &PageRequest) -> Result<TypedPage> {
        self.inner.queries.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::query("injected query failure"));
        }

        let (items, continuation) = self.page(page)?;
        Ok(TypedPage {
            items,
            continuation,
        })
    }

    async fn query_raw_page(&self, _query: &str, page: &PageRequest) -> Result<RawPage> {
        self.inner.raw_queries.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::query("injected query failure"));
        }

        let (items, continuation) = self.page(page)?;
        let count = items.len();
        let envelope = serde_json::json!({
            "_rid": "mem==",
            "Documents": items,
            "_count": count,
        });

        let frame = serde_json::to_vec(&envelope)
            .map_err(|e| Error::query_with("failed to encode envelope", e))?;

        Ok(RawPage {
            frame: Bytes::from(frame),
            continuation,
        })
    }
}

/// Connector handing out handles to one shared [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    connects: Arc<AtomicUsize>,
    fail_connect: Arc<AtomicBool>,
}

impl MemoryConnector {
    /// Creates a connector over the given store.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            connects: Arc::default(),
            fail_connect: Arc::default(),
        }
    }

    /// Returns the shared store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Number of connect calls made through this connector.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Makes subsequent connect calls fail.
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _config: &StoreConfig) -> Result<Box<dyn DocumentBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::connection("injected connect failure"));
        }

        Ok(Box::new(self.store.clone()))
    }
}
