//! Collaboration queries and memoized aggregate reports.
//!
//! The two full-scan aggregates (`author_article_counts`,
//! `yearly_keyword_frequencies`) are each memoized in a singleton cache
//! slot that every successful `add` invalidates; see
//! [`cache::StatsCache`](super::cache::StatsCache).

use super::Catalog;
use crate::error::Result;
use crate::graph::clique::CliqueCounts;
use crate::model::{AuthorCount, CliqueCount, KeywordFrequency, Record, YEAR_UNKNOWN};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Query terms excluded from keyword frequency reports before
/// normalization.
pub const STOP_TERMS: &[&str] = &["based", "of", "the", "using", "via"];

impl Catalog {
    /// Co-authors of `author`, each with the number of shared records.
    /// The author is excluded from their own collaborator set.
    pub fn collaborators(&self, author: &str) -> Result<FxHashMap<String, u64>> {
        let mut counts = FxHashMap::default();
        for record in self.get_by_author(author)? {
            for coauthor in &record.authors {
                if coauthor != author {
                    *counts.entry(coauthor.clone()).or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }

    /// The distinct co-authors of `author`, without multiplicities.
    pub fn collaborators_only(&self, author: &str) -> Result<FxHashSet<String>> {
        let mut coauthors = FxHashSet::default();
        for record in self.get_by_author(author)? {
            for coauthor in record.authors {
                if coauthor != author {
                    coauthors.insert(coauthor);
                }
            }
        }
        Ok(coauthors)
    }

    /// Records on which `author` and `coauthor` both appear.
    pub fn coauthor_records(&self, author: &str, coauthor: &str) -> Result<Vec<Record>> {
        Ok(self
            .get_by_author(author)?
            .into_iter()
            .filter(|record| record.authors.iter().any(|a| a == coauthor))
            .collect())
    }

    /// The full collaboration network: every author mapped to their
    /// distinct co-authors. Deterministically ordered for reporting.
    pub fn collaboration_network(&self) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut network = BTreeMap::new();
        for author in self.author_index().keys() {
            let coauthors = self.collaborators_only(&author)?;
            network.insert(author, coauthors.into_iter().collect());
        }
        Ok(network)
    }

    /// Article counts per author, descending by count. Memoized; two
    /// consecutive calls with no intervening `add` share one result.
    pub fn author_article_counts(&self) -> Arc<Vec<AuthorCount>> {
        self.cache.author_counts(|| {
            let mut counts: Vec<AuthorCount> = self
                .author_index()
                .entries()
                .into_iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(author, ids)| AuthorCount {
                    author,
                    count: ids.len() as u64,
                })
                .collect();
            counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.author.cmp(&b.author)));
            counts
        })
    }

    /// Per-year keyword frequency tables, descending by frequency within
    /// each year. Frequency is `occurrences(keyword, year) /
    /// total_records(year)`; stop terms are excluded before
    /// normalization, year 0 (unknown) is skipped, and a year with no
    /// records contributes nothing. Memoized.
    pub fn yearly_keyword_frequencies(&self) -> Arc<BTreeMap<u64, Vec<KeywordFrequency>>> {
        self.cache.yearly_keywords(|| {
            let year_entries = self.year_index().entries();
            let keyword_entries = self.keyword_index().entries();
            let mut totals: FxHashMap<u64, usize> = FxHashMap::default();
            let mut record_year: FxHashMap<u64, u64> = FxHashMap::default();
            for (year, ids) in &year_entries {
                if *year == YEAR_UNKNOWN || ids.is_empty() {
                    continue;
                }
                totals.insert(*year, ids.len());
                for id in ids {
                    record_year.insert(*id, *year);
                }
            }

            let mut occurrences: FxHashMap<u64, FxHashMap<&str, u64>> = FxHashMap::default();
            for (keyword, ids) in &keyword_entries {
                if STOP_TERMS.contains(&keyword.as_str()) {
                    continue;
                }
                for id in ids {
                    if let Some(year) = record_year.get(id) {
                        *occurrences
                            .entry(*year)
                            .or_default()
                            .entry(keyword.as_str())
                            .or_insert(0) += 1;
                    }
                }
            }

            let mut report = BTreeMap::new();
            for (year, keyword_counts) in occurrences {
                let Some(&total) = totals.get(&year) else {
                    continue;
                };
                let mut rows: Vec<KeywordFrequency> = keyword_counts
                    .into_iter()
                    .map(|(keyword, count)| KeywordFrequency {
                        keyword: keyword.to_string(),
                        frequency: count as f64 / total as f64,
                    })
                    .collect();
                rows.sort_by(|a, b| {
                    b.frequency
                        .total_cmp(&a.frequency)
                        .then_with(|| a.keyword.cmp(&b.keyword))
                });
                report.insert(year, rows);
            }
            report
        })
    }
}

/// Shapes raw clique counts for reporting: orders ≥ 2, counts rendered
/// as decimal strings (they exceed what JSON numbers carry).
pub fn clique_report(counts: &CliqueCounts) -> Vec<CliqueCount> {
    counts
        .iter()
        .filter(|(order, count)| **order >= 2 && **count > 0)
        .map(|(order, count)| CliqueCount {
            order: *order,
            count: count.to_string(),
        })
        .collect()
}
