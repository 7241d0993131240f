//! Catalog configuration.

use std::path::PathBuf;

/// Default maximum size of one record-log segment file.
pub const DEFAULT_MAX_SEGMENT_BYTES: u64 = 256 * 1024 * 1024;

/// Default B-tree fan-out (maximum keys per node).
pub const DEFAULT_BTREE_ORDER: usize = 64;

/// Configuration for a [`Catalog`](crate::catalog::Catalog).
///
/// Construct explicitly and pass to `Catalog::open`; there is no ambient
/// global instance.
///
/// # Example
///
/// ```rust,ignore
/// let mut config = CatalogConfig::new("/var/lib/bibliograph");
/// config.max_segment_bytes = 64 * 1024 * 1024;
/// let catalog = Catalog::open(config)?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Storage root. Segments live in `<root>/binary/`, persisted indices
    /// in `<root>/index/`, the id counter in `<root>/last_record_id`.
    pub root: PathBuf,

    /// Fan-out of every ordered index (maximum keys per tree node).
    pub btree_order: usize,

    /// Segment size cap; an append that would exceed it rotates to a new
    /// segment named by the record id being written.
    pub max_segment_bytes: u64,

    /// Vertex interval between progress reports while building the
    /// collaboration graph.
    pub graph_progress_interval: usize,
}

impl CatalogConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            btree_order: DEFAULT_BTREE_ORDER,
            max_segment_bytes: DEFAULT_MAX_SEGMENT_BYTES,
            graph_progress_interval: 1000,
        }
    }
}
