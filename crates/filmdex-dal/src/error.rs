//! Error types for document-store operations.

/// Result type for all document-store operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the
/// error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error source attached to connection and query failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for document-store operations.
///
/// Every failure surfaced by this crate falls into one of four kinds:
/// configuration problems caught before any network call, malformed
/// document ids, connection establishment failures, and query execution
/// failures. Errors are never swallowed or retried at this layer; they
/// propagate to the immediate caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required connection coordinate is missing or invalid.
    #[error("configuration error: {message}")]
    Config {
        /// Description naming the offending field.
        message: String,
    },

    /// A document id failed partition-key validation.
    #[error("invalid partition key: {message}")]
    Validation {
        /// Description carrying the offending id.
        message: String,
    },

    /// Client construction or the smoke-test read failed.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
        /// Underlying transport error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// A page fetch or envelope decode failed.
    #[error("query error: {message}")]
    Query {
        /// Description of the failure.
        message: String,
        /// Underlying transport or decode error, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection error with an underlying source.
    pub fn connection_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a query error with an underlying source.
    pub fn query_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns true if this is a query error.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Connection { .. } => "connection",
            Self::Query { .. } => "query",
        }
    }
}
