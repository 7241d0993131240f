//! bibliograph: a bibliographic record store and collaboration analyzer.
//!
//! The engine persists records in an append-only segmented binary log
//! addressed by five synchronized B-tree indices (id, author, title,
//! keyword, year), and computes collaboration-network statistics over
//! the author graph, including exact counts of complete subgraphs of
//! each size.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use bibliograph::{Catalog, CatalogConfig, Record};
//!
//! let mut catalog = Catalog::open(CatalogConfig::new("./store"))?;
//! let mut record = Record::new(
//!     "The Power of Pivoting",
//!     vec!["Shweta Jain".into(), "C. Seshadhri".into()],
//!     2020,
//!     vec!["clique".into(), "counting".into()],
//! );
//! let id = catalog.add(&mut record)?;
//! assert_eq!(catalog.get_by_id(id)?.as_ref(), Some(&record));
//! ```
//!
//! Writes are single-writer: `Catalog::add` takes `&mut self`, and a
//! host service shares the catalog as `Arc<RwLock<Catalog>>`, funneling
//! writes through one task. Long-running clique counts run off-thread
//! via [`CliqueRunner`], streaming progress over a bounded channel.

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod logging;
pub mod model;
pub mod storage;

pub use catalog::cache::StatsCache;
pub use catalog::stats::clique_report;
pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{Result, StoreError};
pub use graph::clique::{count_cliques, CancelToken, CliqueCounts};
pub use graph::runner::{CliqueEvent, CliqueRunner};
pub use graph::{build_collaboration_graph, CollaborationGraph, Phase, Progress};
pub use index::BTree;
pub use model::{AuthorCount, CliqueCount, KeywordFrequency, Record, RecordId};
pub use storage::{Location, SegmentLog};
