//! Exact clique counting via pivoting branch-and-bound.
//!
//! Counts every clique of each size in an undirected graph — not only
//! maximal ones. The search runs over a degeneracy ordering so each
//! clique is discovered from its lowest-ordered vertex exactly once; at
//! each branch a pivot maximizing its candidate-set overlap is held back
//! as "optional" rather than branched on, and a leaf holding `drop`
//! optional vertices contributes `C(drop, i)` cliques of size
//! `rsize - i` in one step. This is what makes dense collaboration
//! clusters tractable where brute-force subset testing is not.
//!
//! Counts saturate at `u128::MAX`; reaching that would require more
//! cliques than any corpus can produce.

use crate::error::{Result, StoreError};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clique size → number of cliques of exactly that size (sizes ≥ 1).
pub type CliqueCounts = BTreeMap<u32, u128>;

/// Cooperative cancellation flag checked between search branches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counts all cliques of every size in the graph given by `adjacency`
/// (0-indexed vertex ids, symmetric, no self-loops).
///
/// Returns `Err(Cancelled)` if the token fires mid-search.
pub fn count_cliques(adjacency: &[FxHashSet<u32>], cancel: &CancelToken) -> Result<CliqueCounts> {
    let (order, rank) = degeneracy_order(adjacency);
    let mut counts = CliqueCounts::new();

    for &v in &order {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        // Candidates: neighbors later in the degeneracy order, so each
        // clique is rooted at its earliest vertex only.
        let candidates: Vec<u32> = adjacency[v as usize]
            .iter()
            .copied()
            .filter(|&w| rank[w as usize] > rank[v as usize])
            .collect();
        search(adjacency, candidates, 1, 0, cancel, &mut counts)?;
    }
    Ok(counts)
}

fn search(
    adjacency: &[FxHashSet<u32>],
    candidates: Vec<u32>,
    rsize: u32,
    drop: u32,
    cancel: &CancelToken,
    counts: &mut CliqueCounts,
) -> Result<()> {
    if candidates.is_empty() {
        // rsize vertices are held, drop of them optional: any subset of
        // the optional ones may be left out.
        for i in 0..=drop {
            let entry = counts.entry(rsize - i).or_insert(0);
            *entry = entry.saturating_add(binomial(drop, i));
        }
        return Ok(());
    }
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }

    let pivot = select_pivot(adjacency, &candidates);
    let branches: Vec<u32> = candidates
        .iter()
        .copied()
        .filter(|&w| w == pivot || !adjacency[pivot as usize].contains(&w))
        .collect();

    let mut remaining = candidates;
    for v in branches {
        let next: Vec<u32> = remaining
            .iter()
            .copied()
            .filter(|&w| adjacency[v as usize].contains(&w))
            .collect();
        let next_drop = if v == pivot { drop + 1 } else { drop };
        search(adjacency, next, rsize + 1, next_drop, cancel, counts)?;
        remaining.retain(|&w| w != v);
    }
    Ok(())
}

/// The candidate with the most neighbors among the candidates; branching
/// skips its neighborhood entirely.
fn select_pivot(adjacency: &[FxHashSet<u32>], candidates: &[u32]) -> u32 {
    candidates
        .iter()
        .copied()
        .max_by_key(|&u| {
            candidates
                .iter()
                .filter(|&&w| adjacency[u as usize].contains(&w))
                .count()
        })
        .unwrap_or(0)
}

/// Degeneracy ordering via repeated minimum-degree removal, with the
/// rank of each vertex in that order. O(V + E) bucket queue.
fn degeneracy_order(adjacency: &[FxHashSet<u32>]) -> (Vec<u32>, Vec<u32>) {
    let n = adjacency.len();
    let mut degree: Vec<usize> = adjacency.iter().map(FxHashSet::len).collect();
    let max_degree = degree.iter().copied().max().unwrap_or(0);
    let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); max_degree + 1];
    for v in 0..n {
        buckets[degree[v]].push(v as u32);
    }

    let mut removed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut rank = vec![0u32; n];
    let mut cursor = 0usize;

    while order.len() < n {
        // Skip stale bucket entries left behind by degree decreases.
        let v = loop {
            while cursor < buckets.len() && buckets[cursor].is_empty() {
                cursor += 1;
            }
            match buckets[cursor].pop() {
                Some(v) if !removed[v as usize] && degree[v as usize] == cursor => break v,
                _ => continue,
            }
        };
        removed[v as usize] = true;
        rank[v as usize] = order.len() as u32;
        order.push(v);
        for &w in &adjacency[v as usize] {
            let w = w as usize;
            if !removed[w] {
                degree[w] -= 1;
                buckets[degree[w]].push(w as u32);
                if degree[w] < cursor {
                    cursor = degree[w];
                }
            }
        }
    }
    (order, rank)
}

fn binomial(n: u32, k: u32) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k as u128 {
        result = result
            .saturating_mul(n as u128 - i)
            .checked_div(i + 1)
            .unwrap_or(u128::MAX);
    }
    result
}
