//! Core data model: bibliographic records and JSON-facing report shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier assigned to a record by the catalog. Never reused.
pub type RecordId = u64;

/// Year value meaning "unknown" in the date index.
pub const YEAR_UNKNOWN: u64 = 0;

/// A bibliographic record (article, paper, proceedings entry).
///
/// `id` is `None` until the catalog assigns one on `add`; once assigned it
/// is unique and immutable. `authors` preserves citation order. `extra`
/// carries opaque pass-through fields (venue, pages, url, publisher,
/// isbn, volume, series, school, journal, booktitle, editors, ...) that
/// the engine stores but never interprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: Option<RecordId>,
    pub title: String,
    pub authors: Vec<String>,
    /// Publication year, `0` when unknown.
    pub year: u64,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Convenience constructor for the common fields; `extra` starts empty.
    pub fn new(
        title: impl Into<String>,
        authors: Vec<String>,
        year: u64,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            authors,
            year,
            keywords,
            extra: BTreeMap::new(),
        }
    }
}

/// One row of the author article-count report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: u64,
}

/// One row of the per-year keyword frequency report.
///
/// `frequency` is occurrences of the keyword among a year's records
/// divided by that year's total record count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFrequency {
    pub keyword: String,
    pub frequency: f64,
}

/// One row of the complete-subgraph report: the number of cliques of
/// exactly `order` vertices in the collaboration graph.
///
/// `count` is a decimal string: clique counts grow combinatorially and
/// are tallied in 128-bit integers, wider than JSON numbers carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueCount {
    pub order: u32,
    pub count: String,
}
