//! Catalog document types.
//!
//! The shapes the web layer reads out of the store: titles (`tt...` ids)
//! and people (`nm...` ids). Wire fields are camelCase, enum values are
//! matched by name, and runtimes travel in the catalog's fixed
//! `HH:MM:SS`-style textual format.

pub mod timespan;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// A catalog title document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    /// Document id, e.g. `tt1234567`.
    pub id: String,

    /// Display title.
    pub primary_title: String,

    /// Title in its original language, when it differs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,

    /// What kind of work this is.
    pub kind: TitleKind,

    /// First release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i16>,

    /// Final year, for series that have ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i16>,

    /// Total runtime.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timespan::option")]
    pub runtime: Option<SignedDuration>,

    /// Genre labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,

    /// Aggregate rating, 0.0 to 10.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// The kind of a catalog title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TitleKind {
    Movie,
    Short,
    Series,
    Episode,
    Video,
    VideoGame,
}

/// A catalog person document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Document id, e.g. `nm0000050`.
    pub id: String,

    /// Display name.
    pub primary_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i16>,

    /// Primary professions, e.g. `actor`, `director`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub professions: Vec<String>,

    /// Title ids this person is best known for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_for: Vec<String>,
}
