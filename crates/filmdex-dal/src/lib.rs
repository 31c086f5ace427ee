#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # filmdex-dal
//!
//! Data-access layer for the filmdex catalog service, backed by a managed
//! document database.
//!
//! The crate exposes one client, [`DocumentStoreClient`], covering:
//!
//! - **Connection lifecycle**: validated open with a post-connect smoke
//!   test, and all-or-nothing reconnect with an atomic handle swap.
//! - **Partition keys**: deterministic derivation from document ids, so
//!   point reads never need a cross-partition scan.
//! - **Query execution**: structured and raw query paths that paginate
//!   through the store's cursor and decode into typed collections, plus a
//!   lazy streaming variant.
//!
//! ## Quick Start
//!
//! ```ignore
//! use filmdex_dal::datatype::Title;
//! use filmdex_dal::{DocumentStoreClient, Query, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), filmdex_dal::Error> {
//!     let config = StoreConfig::new(
//!         "https://filmdex.documents.example.com",
//!         std::env::var("FILMDEX_STORE_KEY").unwrap_or_default(),
//!         "catalog",
//!         "titles",
//!     )?;
//!
//!     let client = DocumentStoreClient::connect(config).await?;
//!
//!     let titles: Vec<Title> = client
//!         .query(Query::new("SELECT * FROM c WHERE c.startYear = @y ORDER BY c.id")
//!             .param("@y", 1999))
//!         .await?;
//!
//!     println!("{} titles", titles.len());
//!     Ok(())
//! }
//! ```

// Tracing targets for observability
/// Logging target for client lifecycle and query operations.
pub const CLIENT_TARGET: &str = "filmdex_dal::client";

/// Logging target for the REST transport.
pub const REST_TARGET: &str = "filmdex_dal::rest";

pub mod backend;
pub mod client;
pub mod datatype;

mod error;

pub use client::{
    DEFAULT_PAGE_SIZE, DocumentStoreClient, DocumentStream, MAX_PAGE_SIZE, Query, QueryEnvelope,
    QueryParameter, StoreConfig, StoreConfigBuilder, derive_partition_key,
};
pub use error::{BoxError, Error, Result};
