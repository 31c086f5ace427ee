//! Document-store client: connection lifecycle and query execution.

mod config;
mod partition;
mod query;

pub use config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, StoreConfig, StoreConfigBuilder};
pub use partition::derive_partition_key;
pub use query::{Query, QueryEnvelope, QueryParameter};

use std::sync::Arc;

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::backend::{Connector, DocumentBackend, PageRequest, RestConnector};
use crate::{CLIENT_TARGET, Error, Result};

/// Well-known document point-read after every open to confirm the
/// connection is live and authorized.
const SENTINEL_ID: &str = "tt0000001";

/// Lazy stream of decoded documents, yielded page by page.
pub type DocumentStream<'a, T> = BoxStream<'a, Result<T>>;

/// An installed connection: the validated configuration and the backend
/// handle it produced. Immutable once built; reconnect swaps in a whole
/// new one.
struct Connection {
    config: StoreConfig,
    store: Box<dyn DocumentBackend>,
}

/// Client over one document-store container.
///
/// Opens a validated connection on construction and exposes partition-key
/// derivation plus paginated typed query execution. Exactly one connection
/// is authoritative at a time; [`reconnect`](Self::reconnect) swaps in a
/// replacement atomically, and callers already mid-query keep the handle
/// they started with.
///
/// # Examples
///
/// ```ignore
/// use filmdex_dal::{DocumentStoreClient, Query, StoreConfig};
/// use filmdex_dal::datatype::Title;
///
/// let config = StoreConfig::new(endpoint, key, "catalog", "titles")?;
/// let client = DocumentStoreClient::connect(config).await?;
///
/// let titles: Vec<Title> = client
///     .query(Query::new("SELECT * FROM c WHERE c.startYear = @y ORDER BY c.id")
///         .param("@y", 1999))
///     .await?;
/// ```
pub struct DocumentStoreClient {
    connector: Arc<dyn Connector>,
    current: RwLock<Arc<Connection>>,
    /// Serializes reconnect attempts so two concurrent swaps cannot
    /// interleave their validation and installation.
    reconnect_lock: Mutex<()>,
}

impl DocumentStoreClient {
    /// Opens a validated connection over the REST transport.
    ///
    /// Validates the configuration, builds the backend, and point-reads the
    /// sentinel document to prove the connection is live and authorized.
    /// Any smoke-test failure, including not-found, aborts with a
    /// connection error.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        Self::connect_with(Arc::new(RestConnector), config).await
    }

    /// Opens a validated connection through a custom connector.
    pub async fn connect_with(connector: Arc<dyn Connector>, config: StoreConfig) -> Result<Self> {
        let connection = Self::open(connector.as_ref(), config).await?;

        Ok(Self {
            connector,
            current: RwLock::new(connection),
            reconnect_lock: Mutex::new(()),
        })
    }

    /// Validates a configuration and opens a connection against it.
    ///
    /// Pure factory: no shared state is touched, so a failed open leaves
    /// any previously installed connection fully usable.
    async fn open(connector: &dyn Connector, config: StoreConfig) -> Result<Arc<Connection>> {
        config.validate()?;

        let store = connector.connect(&config).await?;

        let partition_key = derive_partition_key(SENTINEL_ID)?;
        store
            .read_document(SENTINEL_ID, &partition_key)
            .await
            .map_err(|e| match e {
                e @ Error::Connection { .. } => e,
                other => Error::connection_with("smoke test read failed", other),
            })?;

        info!(
            target: CLIENT_TARGET,
            endpoint = %config.endpoint(),
            database = config.database(),
            container = config.container(),
            "connection opened and validated"
        );

        Ok(Arc::new(Connection { config, store }))
    }

    /// Replaces the installed connection.
    ///
    /// With `force` false and all four coordinates identical to the
    /// installed configuration this is a no-op with zero network calls.
    /// Otherwise a new connection is validated first and swapped in only on
    /// success; on failure the previous connection stays authoritative and
    /// the error propagates. Concurrent reconnects serialize on an internal
    /// lock.
    pub async fn reconnect(&self, config: StoreConfig, force: bool) -> Result<()> {
        let _guard = self.reconnect_lock.lock().await;

        if !force {
            let current = self.current.read().await;
            if current.config.same_coordinates(&config) {
                debug!(
                    target: CLIENT_TARGET,
                    endpoint = %config.endpoint(),
                    "reconnect skipped, coordinates unchanged"
                );
                return Ok(());
            }
        }

        let connection = Self::open(self.connector.as_ref(), config).await?;
        *self.current.write().await = connection;

        info!(target: CLIENT_TARGET, "reconnected, new connection installed");
        Ok(())
    }

    /// Executes a structured query, materializing every page.
    ///
    /// Pages through the cursor until exhausted and appends each page's
    /// items in store order; callers control ordering through the query
    /// itself (e.g. `ORDER BY`). An empty result set is an empty vector,
    /// not an error. Either the complete sequence is returned or the call
    /// fails; no partial results.
    ///
    /// Since the full result set is materialized anyway, pages are
    /// requested at the per-page ceiling rather than the configured page
    /// size; the store is still free to return shorter pages.
    pub async fn query<T: DeserializeOwned>(&self, query: impl Into<Query>) -> Result<Vec<T>> {
        let query = query.into();
        let connection = self.connection().await;

        let mut page = PageRequest::new(connection.config.max_page_size());
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            let batch = connection.store.query_page(&query, &page).await?;
            pages += 1;

            items.reserve(batch.items.len());
            for value in batch.items {
                items.push(decode_item(value)?);
            }

            match batch.continuation {
                Some(token) => page = page.next(token),
                None => break,
            }
        }

        debug!(
            target: CLIENT_TARGET,
            pages,
            items = items.len(),
            "structured query complete"
        );

        Ok(items)
    }

    /// Executes a raw-text query, materializing every page.
    ///
    /// Each page arrives as an undecoded envelope frame and is decoded
    /// structurally into the caller's element type in a single parse. A
    /// frame missing the expected envelope fields fails with a query error.
    /// Like [`query`](Self::query), pages are requested at the per-page
    /// ceiling.
    pub async fn query_raw<T: DeserializeOwned>(&self, query: impl AsRef<str>) -> Result<Vec<T>> {
        let query = query.as_ref();
        let connection = self.connection().await;

        let mut page = PageRequest::new(connection.config.max_page_size());
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            let batch = connection.store.query_raw_page(query, &page).await?;
            pages += 1;

            let envelope: QueryEnvelope<T> = QueryEnvelope::decode(&batch.frame)?;
            items.extend(envelope.documents);

            match batch.continuation {
                Some(token) => page = page.next(token),
                None => break,
            }
        }

        debug!(
            target: CLIENT_TARGET,
            pages,
            items = items.len(),
            "raw query complete"
        );

        Ok(items)
    }

    /// Executes a structured query as a lazy per-item stream.
    ///
    /// Pages are fetched on demand as the stream is polled, so callers can
    /// bound memory instead of materializing the full result set; each page
    /// is requested at the configured page size. The stream queries the
    /// connection installed when it is first polled and never rebinds
    /// mid-flight.
    pub fn query_stream<'a, T>(&'a self, query: impl Into<Query>) -> DocumentStream<'a, T>
    where
        T: DeserializeOwned + Send + 'a,
    {
        let query = query.into();

        Box::pin(async_stream::try_stream! {
            let connection = self.connection().await;
            let mut page = PageRequest::new(connection.config.page_size());

            loop {
                let batch = connection.store.query_page(&query, &page).await?;

                for value in batch.items {
                    yield decode_item(value)?;
                }

                match batch.continuation {
                    Some(token) => page = page.next(token),
                    None => break,
                }
            }
        })
    }

    /// Derives the partition key for a document id.
    pub fn partition_key(&self, id: &str) -> Result<String> {
        derive_partition_key(id)
    }

    /// Returns a snapshot of the installed configuration.
    pub async fn config(&self) -> StoreConfig {
        self.current.read().await.config.clone()
    }

    /// Captures the connection installed right now. In-flight operations
    /// hold their own Arc and are unaffected by later swaps.
    async fn connection(&self) -> Arc<Connection> {
        self.current.read().await.clone()
    }
}

fn decode_item<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::query_with("failed to decode query item", e))
}

impl std::fmt::Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde::Deserialize;

    use super::*;
    use crate::backend::memory::{MemoryConnector, MemoryStore};
    use crate::backend::{RawPage, TypedPage};

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        id: String,
    }

    fn config() -> StoreConfig {
        StoreConfig::new("https://store.example.com", "key", "catalog", "titles").unwrap()
    }

    /// Store pre-seeded with `n` title documents, the sentinel included.
    fn seeded_store(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            let id = format!("tt{:07}", i + 1);
            let pk = derive_partition_key(&id).unwrap();
            store.insert(&id, pk, serde_json::json!({ "id": id }));
        }
        store
    }

    async fn client_over(store: MemoryStore) -> (DocumentStoreClient, MemoryConnector) {
        let connector = MemoryConnector::new(store);
        let client = DocumentStoreClient::connect_with(Arc::new(connector.clone()), config())
            .await
            .unwrap();
        (client, connector)
    }

    #[tokio::test]
    async fn test_connect_runs_smoke_test() {
        let (_client, connector) = client_over(seeded_store(1)).await;
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.store().read_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config_before_network() {
        let connector = MemoryConnector::new(seeded_store(1));
        let bad = StoreConfig::new("https://store.example.com", "", "catalog", "titles").unwrap();

        let err = DocumentStoreClient::connect_with(Arc::new(connector.clone()), bad)
            .await
            .unwrap_err();

        assert!(err.is_config());
        assert_eq!(connector.connect_count(), 0);
        assert_eq!(connector.store().read_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_fails_when_sentinel_missing() {
        let connector = MemoryConnector::new(MemoryStore::new());
        let err = DocumentStoreClient::connect_with(Arc::new(connector), config())
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_reconnect_same_coordinates_is_noop() {
        let (client, connector) = client_over(seeded_store(1)).await;

        client.reconnect(config(), false).await.unwrap();

        // No second open, no second smoke test.
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.store().read_count(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_force_reopens() {
        let (client, connector) = client_over(seeded_store(1)).await;

        client.reconnect(config(), true).await.unwrap();

        assert_eq!(connector.connect_count(), 2);
        assert_eq!(connector.store().read_count(), 2);
    }

    #[tokio::test]
    async fn test_reconnect_changed_coordinates_reopens() {
        let (client, connector) = client_over(seeded_store(1)).await;

        let rotated =
            StoreConfig::new("https://store.example.com", "rotated", "catalog", "titles").unwrap();
        client.reconnect(rotated, false).await.unwrap();

        assert_eq!(connector.connect_count(), 2);
        assert_eq!(client.config().await.key(), "rotated");
    }

    #[tokio::test]
    async fn test_reconnect_failure_keeps_old_connection() {
        let (client, connector) = client_over(seeded_store(3)).await;
        connector.fail_connect(true);

        let rotated =
            StoreConfig::new("https://store.example.com", "rotated", "catalog", "titles").unwrap();
        let err = client.reconnect(rotated, false).await.unwrap_err();
        assert!(err.is_connection());

        // Old configuration still installed, old handle still serves reads.
        assert_eq!(client.config().await.key(), "key");
        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 3);
    }

    /// Connector that hands out a different store per connect call, so
    /// tests can observe which handle is authoritative.
    #[derive(Clone)]
    struct SequenceConnector {
        stores: Arc<std::sync::Mutex<VecDeque<MemoryStore>>>,
    }

    #[async_trait]
    impl Connector for SequenceConnector {
        async fn connect(&self, _config: &StoreConfig) -> Result<Box<dyn DocumentBackend>> {
            let store = self
                .stores
                .lock()
                .expect("store queue poisoned")
                .pop_front()
                .ok_or_else(|| Error::connection("no more stores"))?;
            Ok(Box::new(store))
        }
    }

    #[tokio::test]
    async fn test_new_handle_is_authoritative_after_reconnect() {
        let first = seeded_store(1);
        let second = seeded_store(5);
        let connector = SequenceConnector {
            stores: Arc::new(std::sync::Mutex::new(VecDeque::from([first, second]))),
        };

        let client = DocumentStoreClient::connect_with(Arc::new(connector), config())
            .await
            .unwrap();

        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 1);

        client.reconnect(config(), true).await.unwrap();

        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 5);
    }

    #[tokio::test]
    async fn test_stream_keeps_handle_across_reconnect() {
        let first = seeded_store(4);
        let second = seeded_store(9);
        let connector = SequenceConnector {
            stores: Arc::new(std::sync::Mutex::new(VecDeque::from([first, second]))),
        };

        let client =
            DocumentStoreClient::connect_with(Arc::new(connector), config().with_page_size(2))
                .await
                .unwrap();

        let mut stream = client.query_stream(Query::new("SELECT * FROM c"));
        let head: Doc = stream.try_next().await.unwrap().unwrap();
        assert_eq!(head.id, "tt0000001");

        client.reconnect(config(), true).await.unwrap();

        // The stream stays bound to the handle it started on, including the
        // page fetches still ahead of it.
        let rest: Vec<Doc> = stream.try_collect().await.unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest.last().unwrap().id, "tt0000004");

        // Fresh calls go to the swapped-in handle.
        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 9);
    }

    #[tokio::test]
    async fn test_query_empty_result_set() {
        let store = seeded_store(1);
        let connector = MemoryConnector::new(store.clone());
        let client = DocumentStoreClient::connect_with(Arc::new(connector), config())
            .await
            .unwrap();

        store.clear();

        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert!(docs.is_empty());

        let docs: Vec<Doc> = client.query_raw("SELECT * FROM c").await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_query_pages_in_order() {
        let store = seeded_store(25);
        store.cap_page(10);
        let connector = MemoryConnector::new(store.clone());
        let client = DocumentStoreClient::connect_with(Arc::new(connector), config())
            .await
            .unwrap();

        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 25);
        assert_eq!(docs[0].id, "tt0000001");
        assert_eq!(docs[24].id, "tt0000025");
        assert!(docs.windows(2).all(|w| w[0].id < w[1].id));

        // One page per ten documents, plus the final short page.
        assert_eq!(store.query_count(), 3);
    }

    #[tokio::test]
    async fn test_query_requests_page_ceiling() {
        let store = seeded_store(1500);
        let (client, _connector) = client_over(store.clone()).await;

        let docs: Vec<Doc> = client.query(Query::new("SELECT * FROM c")).await.unwrap();
        assert_eq!(docs.len(), 1500);

        // Materializing paths page at the 1000-item ceiling, not the
        // configured page size, so 1500 documents take exactly two fetches.
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_query_raw_pages_in_order() {
        let store = seeded_store(12);
        store.cap_page(5);
        let connector = MemoryConnector::new(store.clone());
        let client = DocumentStoreClient::connect_with(Arc::new(connector), config())
            .await
            .unwrap();

        let docs: Vec<Doc> = client.query_raw("SELECT * FROM c").await.unwrap();
        assert_eq!(docs.len(), 12);
        assert_eq!(docs[0].id, "tt0000001");
        assert_eq!(docs[11].id, "tt0000012");
        assert_eq!(store.raw_query_count(), 3);
    }

    #[tokio::test]
    async fn test_query_stream_yields_all_pages() {
        let store = seeded_store(7);
        let connector = MemoryConnector::new(store.clone());
        let client = DocumentStoreClient::connect_with(
            Arc::new(connector),
            config().with_page_size(3),
        )
        .await
        .unwrap();

        let docs: Vec<Doc> = client
            .query_stream(Query::new("SELECT * FROM c"))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(docs.len(), 7);
        assert_eq!(docs[6].id, "tt0000007");
    }

    #[tokio::test]
    async fn test_query_propagates_fetch_failure() {
        let store = seeded_store(2);
        let (client, _connector) = client_over(store.clone()).await;

        store.fail_queries(true);
        let err = client
            .query::<Doc>(Query::new("SELECT * FROM c"))
            .await
            .unwrap_err();
        assert!(err.is_query());
    }

    /// Backend whose raw path returns frames without the envelope markers.
    struct BrokenEnvelopeBackend {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentBackend for BrokenEnvelopeBackend {
        async fn read_document(&self, id: &str, partition_key: &str) -> Result<bytes::Bytes> {
            self.inner.read_document(id, partition_key).await
        }

        async fn query_page(&self, query: &Query, page: &PageRequest) -> Result<TypedPage> {
            self.inner.query_page(query, page).await
        }

        async fn query_raw_page(&self, _query: &str, _page: &PageRequest) -> Result<RawPage> {
            Ok(RawPage {
                frame: bytes::Bytes::from_static(br#"{"_rid": "abc=="}"#),
                continuation: None,
            })
        }
    }

    struct BrokenEnvelopeConnector;

    #[async_trait]
    impl Connector for BrokenEnvelopeConnector {
        async fn connect(&self, _config: &StoreConfig) -> Result<Box<dyn DocumentBackend>> {
            Ok(Box::new(BrokenEnvelopeBackend {
                inner: seeded_store(1),
            }))
        }
    }

    #[tokio::test]
    async fn test_query_raw_fails_on_missing_markers() {
        let client = DocumentStoreClient::connect_with(Arc::new(BrokenEnvelopeConnector), config())
            .await
            .unwrap();

        let err = client.query_raw::<Doc>("SELECT * FROM c").await.unwrap_err();
        assert!(err.is_query());
    }

    #[tokio::test]
    async fn test_partition_key_passthrough() {
        let (client, _) = client_over(seeded_store(1)).await;
        assert_eq!(client.partition_key("nm0012345").unwrap(), "5");
        assert!(client.partition_key("xx123456").unwrap_err().is_validation());
    }
}
