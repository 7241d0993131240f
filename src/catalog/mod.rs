//! The catalog: the storage engine coordinating the record log and the
//! five ordered indices.
//!
//! Writes are single-writer by construction (`add` takes `&mut self`);
//! a host service that wants concurrent readers shares the catalog as
//! `Arc<parking_lot::RwLock<Catalog>>` and serializes writes through the
//! write half. Reads only take `&self` and may run concurrently.

pub mod cache;
pub mod stats;

use crate::config::CatalogConfig;
use crate::error::{Result, StoreError};
use crate::index::BTree;
use crate::model::{Record, RecordId};
use crate::storage::{decode_record, encode_record, Location, SegmentLog};
use cache::StatsCache;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const ID_COUNTER_FILE: &str = "last_record_id";

/// Bibliographic record store: append-only log plus five synchronized
/// ordered indices (id, author, title, keyword, year).
pub struct Catalog {
    config: CatalogConfig,
    index_dir: PathBuf,
    log: SegmentLog,
    main_index: BTree<u64, Location>,
    author_index: BTree<String, Vec<u64>>,
    title_index: BTree<String, u64>,
    keyword_index: BTree<String, Vec<u64>>,
    year_index: BTree<u64, Vec<u64>>,
    last_id: u64,
    pub(crate) cache: StatsCache,
}

impl Catalog {
    /// Opens (or creates) a catalog under `config.root`, restoring all
    /// indices and the id counter from disk.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let binary_dir = config.root.join("binary");
        let index_dir = config.root.join("index");
        std::fs::create_dir_all(&index_dir)?;

        let log = SegmentLog::open(binary_dir, config.max_segment_bytes)?;
        let order = config.btree_order;
        let main_index = BTree::load(&index_dir.join("main.idx"), order)?;
        let author_index = BTree::load(&index_dir.join("author.idx"), order)?;
        let title_index = BTree::load(&index_dir.join("title.idx"), order)?;
        let keyword_index = BTree::load(&index_dir.join("keyword.idx"), order)?;
        let year_index = BTree::load(&index_dir.join("year.idx"), order)?;

        let last_id = Self::load_id_counter(&config.root)?;
        info!(
            root = %config.root.display(),
            records = main_index.len(),
            last_id,
            "catalog opened"
        );

        Ok(Self {
            config,
            index_dir,
            log,
            main_index,
            author_index,
            title_index,
            keyword_index,
            year_index,
            last_id,
            cache: StatsCache::new(),
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.main_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main_index.is_empty()
    }

    /// Adds a record: assigns an id if absent, appends the encoded bytes
    /// to the log, updates all five indices, persists the index set and
    /// id counter, and invalidates the aggregate cache.
    ///
    /// On return the record carries its assigned id, and — when its
    /// title collided with an existing one — a disambiguated title that
    /// matches both the stored bytes and the title-index key.
    ///
    /// Known gap: the log append is not rolled back if a later index
    /// mutation fails, so a failed `add` can leave an unindexed byte
    /// range in the current segment. It is unreachable (no index points
    /// at it) and harmless, but space is not reclaimed.
    pub fn add(&mut self, record: &mut Record) -> Result<RecordId> {
        if record.authors.is_empty() {
            return Err(StoreError::InvalidArgument(
                "record must list at least one author".into(),
            ));
        }

        let id = match record.id {
            // Pre-assigned ids keep the counter monotonic past them.
            Some(id) => {
                self.last_id = self.last_id.max(id);
                id
            }
            None => {
                self.last_id += 1;
                record.id = Some(self.last_id);
                self.last_id
            }
        };

        // Duplicate titles get a marker key carrying the new id; the
        // stored title and the index key must agree, so rewrite the
        // record before encoding it.
        if self.title_index.find(&record.title).is_some() {
            let disambiguated = format!("{} - dup id({})", record.title, id);
            debug!(id, title = %disambiguated, "duplicate title disambiguated");
            record.title = disambiguated;
        }

        let bytes = encode_record(record)?;
        let location = self.log.append(id, &bytes)?;

        self.main_index.insert(id, location)?;
        for author in dedup_preserving_order(&record.authors) {
            self.upsert_author(author, id)?;
        }
        for keyword in dedup_preserving_order(&record.keywords) {
            self.upsert_keyword(keyword, id)?;
        }
        self.title_index.insert(record.title.clone(), id)?;
        self.upsert_year(record.year, id)?;

        self.persist()?;
        self.cache.invalidate_all();
        debug!(id, segment = location.segment_id, "record added");
        Ok(id)
    }

    /// Fetches a record by id. Absent id is `Ok(None)`; a corrupt log
    /// entry is logged and also surfaced as `Ok(None)`.
    pub fn get_by_id(&self, id: RecordId) -> Result<Option<Record>> {
        let Some(location) = self.main_index.find(&id) else {
            return Ok(None);
        };
        let bytes = match self.log.read(location) {
            Ok(bytes) => bytes,
            Err(StoreError::CorruptRecord(reason)) => {
                warn!(id, reason, "record unavailable");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match decode_record(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::CorruptRecord(reason)) => {
                warn!(id, reason, "record undecodable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetches a record by its exact (possibly disambiguated) title.
    pub fn get_by_title(&self, title: &str) -> Result<Option<Record>> {
        match self.title_index.find(&title.to_string()) {
            Some(&id) => self.get_by_id(id),
            None => Ok(None),
        }
    }

    /// All records listing `author`. Unknown author is an empty list.
    pub fn get_by_author(&self, author: &str) -> Result<Vec<Record>> {
        self.fetch_ids(self.author_index.find(&author.to_string()))
    }

    /// All records published in `year`. Unknown year is an empty list.
    pub fn get_by_year(&self, year: u64) -> Result<Vec<Record>> {
        self.fetch_ids(self.year_index.find(&year))
    }

    /// AND-intersection search over pre-tokenized keywords.
    ///
    /// Tokenization is the caller's concern. An empty token list, or any
    /// token with no matches, yields an empty result.
    pub fn search_by_keywords(&self, keywords: &[String]) -> Result<Vec<Record>> {
        let Some(first) = keywords.first() else {
            return Ok(Vec::new());
        };
        let Some(ids) = self.keyword_index.find(first) else {
            return Ok(Vec::new());
        };
        let mut matched: FxHashSet<u64> = ids.iter().copied().collect();

        for keyword in &keywords[1..] {
            let Some(ids) = self.keyword_index.find(keyword) else {
                return Ok(Vec::new());
            };
            let next: FxHashSet<u64> = ids.iter().copied().collect();
            matched.retain(|id| next.contains(id));
            if matched.is_empty() {
                return Ok(Vec::new());
            }
        }

        let mut ids: Vec<u64> = matched.into_iter().collect();
        ids.sort_unstable();
        self.fetch_ids(Some(&ids))
    }

    pub(crate) fn author_index(&self) -> &BTree<String, Vec<u64>> {
        &self.author_index
    }

    pub(crate) fn keyword_index(&self) -> &BTree<String, Vec<u64>> {
        &self.keyword_index
    }

    pub(crate) fn year_index(&self) -> &BTree<u64, Vec<u64>> {
        &self.year_index
    }

    fn fetch_ids(&self, ids: Option<&Vec<u64>>) -> Result<Vec<Record>> {
        let Some(ids) = ids else {
            return Ok(Vec::new());
        };
        let mut records = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(record) = self.get_by_id(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn upsert_author(&mut self, author: &str, id: RecordId) -> Result<()> {
        match self.author_index.find(&author.to_string()) {
            None => self.author_index.insert(author.to_string(), vec![id]),
            Some(ids) if ids.contains(&id) => Ok(()),
            Some(ids) => {
                let mut ids = ids.clone();
                ids.push(id);
                self.author_index.update(&author.to_string(), ids)
            }
        }
    }

    fn upsert_keyword(&mut self, keyword: &str, id: RecordId) -> Result<()> {
        match self.keyword_index.find(&keyword.to_string()) {
            None => self.keyword_index.insert(keyword.to_string(), vec![id]),
            Some(ids) if ids.contains(&id) => Ok(()),
            Some(ids) => {
                let mut ids = ids.clone();
                ids.push(id);
                self.keyword_index.update(&keyword.to_string(), ids)
            }
        }
    }

    fn upsert_year(&mut self, year: u64, id: RecordId) -> Result<()> {
        match self.year_index.find(&year) {
            None => self.year_index.insert(year, vec![id]),
            Some(ids) if ids.contains(&id) => Ok(()),
            Some(ids) => {
                let mut ids = ids.clone();
                ids.push(id);
                self.year_index.update(&year, ids)
            }
        }
    }

    /// Persists all five indices and the id counter, so the index set on
    /// disk never records a fact newer than the log.
    fn persist(&self) -> Result<()> {
        self.main_index.serialize(&self.index_dir.join("main.idx"))?;
        self.author_index
            .serialize(&self.index_dir.join("author.idx"))?;
        self.title_index
            .serialize(&self.index_dir.join("title.idx"))?;
        self.keyword_index
            .serialize(&self.index_dir.join("keyword.idx"))?;
        self.year_index.serialize(&self.index_dir.join("year.idx"))?;
        std::fs::write(
            self.config.root.join(ID_COUNTER_FILE),
            self.last_id.to_string(),
        )?;
        Ok(())
    }

    fn load_id_counter(root: &std::path::Path) -> Result<u64> {
        let path = root.join(ID_COUNTER_FILE);
        if !path.exists() {
            std::fs::write(&path, "0")?;
            return Ok(0);
        }
        let text = std::fs::read_to_string(&path)?;
        text.trim().parse().map_err(|_| {
            StoreError::CorruptRecord(format!("id counter file holds non-numeric data: {text:?}"))
        })
    }
}

/// First occurrence of each element, preserving order. Author lists keep
/// citation order; index updates must still be duplicate-free.
fn dedup_preserving_order(items: &[String]) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .map(|item| item.as_str())
        .collect()
}
