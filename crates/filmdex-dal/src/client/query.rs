//! Query specification and response envelope types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A structured query: text plus named parameters.
///
/// Serializes to the wire shape the document store expects:
/// `{"query": "...", "parameters": [{"name": "@id", "value": ...}]}`.
/// Stateless; constructed per call.
///
/// # Examples
///
/// ```
/// # use filmdex_dal::Query;
/// let query = Query::new("SELECT * FROM c WHERE c.id = @id ORDER BY c.id")
///     .param("@id", "tt1234567");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Query {
    query: String,
    parameters: Vec<QueryParameter>,
}

/// A single named query parameter.
#[derive(Debug, Clone, Serialize)]
pub struct QueryParameter {
    name: String,
    value: serde_json::Value,
}

impl Query {
    /// Creates a new query from its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            query: text.into(),
            parameters: Vec::new(),
        }
    }

    /// Binds a named parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Returns the query text.
    pub fn text(&self) -> &str {
        &self.query
    }

    /// Returns the bound parameters.
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }
}

impl QueryParameter {
    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter value.
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Response envelope wrapping a page of query results.
///
/// The store frames each raw page as a JSON object carrying the results
/// array under `Documents` and a trailing `_count` field. Both fields are
/// required; a payload missing either is a decode failure, never silently
/// empty.
#[derive(Debug, Deserialize)]
pub struct QueryEnvelope<T> {
    /// The results array for this page.
    #[serde(rename = "Documents")]
    pub documents: Vec<T>,

    /// Number of documents in this page, per the store.
    #[serde(rename = "_count")]
    pub count: usize,
}

impl<T: DeserializeOwned> QueryEnvelope<T> {
    /// Decodes one raw page frame into its typed documents.
    ///
    /// A single structural parse straight into `Vec<T>`; fails with a
    /// query error if the payload is not valid JSON or lacks the
    /// `Documents`/`_count` envelope fields.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        serde_json::from_slice(frame)
            .map_err(|e| Error::query_with("malformed query response envelope", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        id: String,
        primary_title: String,
    }

    #[test]
    fn test_query_wire_shape() {
        let query = Query::new("SELECT * FROM c WHERE c.id = @id")
            .param("@id", "tt1234567")
            .param("@limit", 10);

        let wire = serde_json::to_value(&query).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "query": "SELECT * FROM c WHERE c.id = @id",
                "parameters": [
                    { "name": "@id", "value": "tt1234567" },
                    { "name": "@limit", "value": 10 },
                ],
            })
        );
    }

    #[test]
    fn test_envelope_decode() {
        let frame = br#"{
            "_rid": "abc==",
            "Documents": [
                { "id": "tt0000001", "primaryTitle": "Carmencita" },
                { "id": "tt0000002", "primaryTitle": "Le clown et ses chiens" }
            ],
            "_count": 2
        }"#;

        let envelope: QueryEnvelope<Item> = QueryEnvelope::decode(frame).unwrap();
        assert_eq!(envelope.count, 2);
        assert_eq!(envelope.documents.len(), 2);
        assert_eq!(envelope.documents[0].id, "tt0000001");
    }

    #[test]
    fn test_envelope_empty_page() {
        let frame = br#"{ "Documents": [], "_count": 0 }"#;
        let envelope: QueryEnvelope<Item> = QueryEnvelope::decode(frame).unwrap();
        assert!(envelope.documents.is_empty());
        assert_eq!(envelope.count, 0);
    }

    #[test]
    fn test_envelope_missing_markers() {
        let missing_documents = br#"{ "_count": 0 }"#;
        let err = QueryEnvelope::<Item>::decode(missing_documents).unwrap_err();
        assert!(err.is_query());

        let missing_count = br#"{ "Documents": [] }"#;
        let err = QueryEnvelope::<Item>::decode(missing_count).unwrap_err();
        assert!(err.is_query());

        let err = QueryEnvelope::<Item>::decode(b"not json").unwrap_err();
        assert!(err.is_query());
    }
}
