//! Configuration for the document-store client.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default number of items requested per query page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Ceiling on the number of items requested per query page.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Configuration for the document-store client.
///
/// Holds the four connection coordinates (endpoint, access key, database,
/// container) plus fixed client options. The client replaces its installed
/// configuration wholesale on reconnect; individual fields are never
/// mutated in place.
///
/// # Examples
///
/// ```ignore
/// use filmdex_dal::StoreConfig;
///
/// let config = StoreConfig::new(
///     "https://filmdex.documents.example.com",
///     "base64-access-key",
///     "catalog",
///     "titles",
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Endpoint URI of the document-store account.
    endpoint: Url,

    /// Access key for request signing.
    key: String,

    /// Database name.
    database: String,

    /// Container (collection) name.
    container: String,

    /// Items requested per page for typed queries.
    page_size: usize,

    /// Ceiling on items per page.
    max_page_size: usize,

    /// Request timeout baked into the transport.
    timeout: Duration,

    /// Maximum retry attempts inside the transport.
    max_retries: u32,
}

impl StoreConfig {
    /// Creates a new configuration with default client options.
    ///
    /// Fails with a configuration error if the endpoint is empty or not a
    /// valid URL.
    pub fn new(
        endpoint: impl AsRef<str>,
        key: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.as_ref();
        if endpoint.is_empty() {
            return Err(Error::config("endpoint must not be empty"));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint '{endpoint}': {e}")))?;

        Ok(Self {
            endpoint,
            key: key.into(),
            database: database.into(),
            container: container.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            timeout: Duration::from_secs(60),
            max_retries: 10,
        })
    }

    /// Creates a new configuration builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Checks that every connection coordinate is present.
    ///
    /// Runs before any network call; fails with a configuration error
    /// naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::config("access key must not be empty"));
        }
        if self.database.is_empty() {
            return Err(Error::config("database must not be empty"));
        }
        if self.container.is_empty() {
            return Err(Error::config("container must not be empty"));
        }
        Ok(())
    }

    /// Returns true if all four connection coordinates match `other`.
    ///
    /// Client options (page sizes, timeout, retries) are not compared;
    /// reconnecting with identical coordinates is a no-op regardless of
    /// option changes.
    pub fn same_coordinates(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
            && self.key == other.key
            && self.database == other.database
            && self.container == other.container
    }

    /// Returns the endpoint URI.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the access key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the container name.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Returns the page size for typed queries.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the per-page item ceiling.
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Returns the transport timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the transport retry limit.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Sets the page size, clamped to the per-page ceiling.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.min(self.max_page_size);
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the transport retry limit.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Builder for [`StoreConfig`].
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    endpoint: Option<String>,
    key: Option<String>,
    database: Option<String>,
    container: Option<String>,
    page_size: Option<usize>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl StoreConfigBuilder {
    /// Sets the endpoint URI.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the container name.
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Sets the page size for typed queries.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the transport retry limit.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Builds the configuration.
    ///
    /// Fails with a configuration error if any coordinate is missing.
    pub fn build(self) -> Result<StoreConfig> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::config("endpoint is required"))?;
        let key = self.key.ok_or_else(|| Error::config("access key is required"))?;
        let database = self
            .database
            .ok_or_else(|| Error::config("database is required"))?;
        let container = self
            .container
            .ok_or_else(|| Error::config("container is required"))?;

        let mut config = StoreConfig::new(endpoint, key, database, container)?;

        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(max_retries) = self.max_retries {
            config = config.with_max_retries(max_retries);
        }

        Ok(config)
    }
}
