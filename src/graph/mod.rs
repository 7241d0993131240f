//! Collaboration graph: authors as vertices, co-authorship as edges.

pub mod clique;
pub mod runner;

use crate::catalog::Catalog;
use crate::error::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Phases a statistics run passes through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Deriving the adjacency structure from the author index.
    BuildGraph,
    /// Enumerating cliques.
    CountCliques,
}

/// One progress report: `completed` out of `total` units of `phase`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    pub completed: u64,
    pub total: u64,
}

/// Undirected collaboration graph with 0-indexed vertex ids.
///
/// `authors[v]` names vertex `v`; `adjacency[v]` holds its co-author
/// vertices. Edges carry no weights — shared-record multiplicity is a
/// separate on-demand query ([`Catalog::collaborators`]).
#[derive(Debug, Clone, Default)]
pub struct CollaborationGraph {
    pub authors: Vec<String>,
    pub adjacency: Vec<FxHashSet<u32>>,
}

impl CollaborationGraph {
    pub fn vertex_count(&self) -> usize {
        self.authors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(FxHashSet::len).sum::<usize>() / 2
    }
}

/// Builds the collaboration graph over every author in the catalog.
///
/// Vertices follow the author index's key order. Progress is reported
/// through `on_progress` every `interval` vertices and once at
/// completion; on large corpora the build can run for minutes.
pub fn build_collaboration_graph(
    catalog: &Catalog,
    interval: usize,
    mut on_progress: impl FnMut(Progress),
) -> Result<CollaborationGraph> {
    let authors = catalog.author_index().keys();
    let total = authors.len();
    let vertex_of: FxHashMap<&str, u32> = authors
        .iter()
        .enumerate()
        .map(|(idx, author)| (author.as_str(), idx as u32))
        .collect();

    let mut adjacency = vec![FxHashSet::default(); total];
    let interval = interval.max(1);

    for (idx, author) in authors.iter().enumerate() {
        let vertex = idx as u32;
        for coauthor in catalog.collaborators_only(author)? {
            if let Some(&other) = vertex_of.get(coauthor.as_str()) {
                adjacency[vertex as usize].insert(other);
                adjacency[other as usize].insert(vertex);
            }
        }
        if idx % interval == 0 || idx + 1 == total {
            on_progress(Progress {
                phase: Phase::BuildGraph,
                completed: (idx + 1) as u64,
                total: total as u64,
            });
        }
    }
    debug!(
        vertices = total,
        "collaboration graph built"
    );

    Ok(CollaborationGraph { authors, adjacency })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::model::Record;

    fn record(title: &str, authors: &[&str]) -> Record {
        Record::new(
            title,
            authors.iter().map(|a| a.to_string()).collect(),
            2024,
            vec![],
        )
    }

    #[test]
    fn edges_reflect_shared_authorship() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(CatalogConfig::new(dir.path())).unwrap();
        catalog.add(&mut record("p1", &["ada", "bob"])).unwrap();
        catalog.add(&mut record("p2", &["bob", "cyd"])).unwrap();
        catalog.add(&mut record("p3", &["dee"])).unwrap();

        let mut reports = Vec::new();
        let graph =
            build_collaboration_graph(&catalog, 1000, |p| reports.push(p)).unwrap();

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 2);

        let idx = |name: &str| graph.authors.iter().position(|a| a == name).unwrap();
        let (ada, bob, cyd, dee) = (idx("ada"), idx("bob"), idx("cyd"), idx("dee"));
        assert!(graph.adjacency[ada].contains(&(bob as u32)));
        assert!(graph.adjacency[bob].contains(&(cyd as u32)));
        assert!(!graph.adjacency[ada].contains(&(cyd as u32)));
        assert!(graph.adjacency[dee].is_empty());

        let last = reports.last().unwrap();
        assert_eq!(last.phase, Phase::BuildGraph);
        assert_eq!(last.completed, 4);
        assert_eq!(last.total, 4);
    }
}
