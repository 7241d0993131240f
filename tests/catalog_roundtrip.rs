//! End-to-end catalog behavior: write path, read paths, search, stats.

use bibliograph::{Catalog, CatalogConfig, Record};

fn record(title: &str, authors: &[&str], year: u64, keywords: &[&str]) -> Record {
    Record::new(
        title,
        authors.iter().map(|a| a.to_string()).collect(),
        year,
        keywords.iter().map(|k| k.to_string()).collect(),
    )
}

fn open(dir: &tempfile::TempDir) -> Catalog {
    Catalog::open(CatalogConfig::new(dir.path())).unwrap()
}

#[test]
fn add_then_get_by_id_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    let mut r = record(
        "Efficient B-Trees",
        &["Rudolf Bayer", "Edward McCreight"],
        1972,
        &["btree", "indexing"],
    );
    r.extra.insert("journal".into(), "Acta Informatica".into());

    let id = catalog.add(&mut r).unwrap();
    assert_eq!(id, 1);
    assert_eq!(r.id, Some(1));

    let stored = catalog.get_by_id(id).unwrap().expect("record must exist");
    assert_eq!(stored, r);
    assert!(catalog.get_by_id(999).unwrap().is_none());
}

#[test]
fn author_index_lists_every_author_of_a_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    let mut r = record("Shared Paper", &["alice", "bob", "carol"], 2020, &[]);
    let id = catalog.add(&mut r).unwrap();

    for author in ["alice", "bob", "carol"] {
        let records = catalog.get_by_author(author).unwrap();
        assert_eq!(records.len(), 1, "author {author} must index the record");
        assert_eq!(records[0].id, Some(id));
    }
    assert!(catalog.get_by_author("nobody").unwrap().is_empty());
}

#[test]
fn duplicate_authors_on_one_record_index_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    let mut r = record("Oddly Credited", &["dup", "dup"], 2020, &[]);
    catalog.add(&mut r).unwrap();
    assert_eq!(catalog.get_by_author("dup").unwrap().len(), 1);
}

#[test]
fn duplicate_titles_are_disambiguated_and_both_resolvable() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    let mut first = record("Attention Is All You Need", &["a"], 2017, &[]);
    let mut second = record("Attention Is All You Need", &["b"], 2023, &[]);
    let first_id = catalog.add(&mut first).unwrap();
    let second_id = catalog.add(&mut second).unwrap();

    // second record's stored title carries its id as a disambiguator
    assert_eq!(first.title, "Attention Is All You Need");
    assert!(second.title.contains(&second_id.to_string()));
    assert_ne!(first.title, second.title);

    let by_first = catalog.get_by_title(&first.title).unwrap().unwrap();
    let by_second = catalog.get_by_title(&second.title).unwrap().unwrap();
    assert_eq!(by_first.id, Some(first_id));
    assert_eq!(by_second.id, Some(second_id));
    // stored title and index key agree
    assert_eq!(by_second.title, second.title);

    assert!(catalog.get_by_title("No Such Title").unwrap().is_none());
}

#[test]
fn keyword_search_uses_and_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    let mut both = record("Graph Search Methods", &["a"], 2019, &["graph", "search"]);
    let mut only_graph = record("Graph Theory", &["b"], 2018, &["graph"]);
    let both_id = catalog.add(&mut both).unwrap();
    catalog.add(&mut only_graph).unwrap();

    let hits = catalog
        .search_by_keywords(&["graph".into(), "search".into()])
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, Some(both_id));

    assert_eq!(catalog.search_by_keywords(&["graph".into()]).unwrap().len(), 2);
    assert!(catalog.search_by_keywords(&[]).unwrap().is_empty());
    assert!(catalog
        .search_by_keywords(&["graph".into(), "absent".into()])
        .unwrap()
        .is_empty());
}

#[test]
fn year_index_resolves_and_skips_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    catalog.add(&mut record("a", &["x"], 1999, &[])).unwrap();
    catalog.add(&mut record("b", &["x"], 1999, &[])).unwrap();
    catalog.add(&mut record("c", &["x"], 0, &[])).unwrap();

    assert_eq!(catalog.get_by_year(1999).unwrap().len(), 2);
    assert_eq!(catalog.get_by_year(0).unwrap().len(), 1);
    assert!(catalog.get_by_year(2050).unwrap().is_empty());
}

#[test]
fn collaborators_tally_shared_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    catalog
        .add(&mut record("p1", &["ada", "bob"], 2020, &[]))
        .unwrap();
    catalog
        .add(&mut record("p2", &["ada", "bob", "cyd"], 2021, &[]))
        .unwrap();
    catalog
        .add(&mut record("p3", &["ada"], 2022, &[]))
        .unwrap();

    let counts = catalog.collaborators("ada").unwrap();
    assert_eq!(counts.get("bob"), Some(&2));
    assert_eq!(counts.get("cyd"), Some(&1));
    assert!(!counts.contains_key("ada"), "no self-collaboration");

    let only = catalog.collaborators_only("ada").unwrap();
    assert_eq!(only.len(), 2);

    let shared = catalog.coauthor_records("ada", "cyd").unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].title, "p2");

    assert!(catalog.collaborators("unknown").unwrap().is_empty());
}

#[test]
fn collaboration_network_covers_every_author() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);
    catalog
        .add(&mut record("p1", &["ada", "bob"], 2020, &[]))
        .unwrap();
    catalog.add(&mut record("p2", &["solo"], 2021, &[])).unwrap();

    let network = catalog.collaboration_network().unwrap();
    assert_eq!(network.len(), 3);
    assert!(network["ada"].contains("bob"));
    assert!(network["bob"].contains("ada"));
    assert!(network["solo"].is_empty());
}

#[test]
fn rejects_record_without_authors() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);
    let mut r = record("Ghost-Written", &[], 2020, &[]);
    assert!(catalog.add(&mut r).is_err());
    assert!(catalog.is_empty());
}

#[test]
fn aggregate_reports_are_cached_until_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);
    catalog
        .add(&mut record("p1", &["ada", "bob"], 2020, &["graph"]))
        .unwrap();
    catalog
        .add(&mut record("p2", &["ada"], 2020, &["search"]))
        .unwrap();

    let first = catalog.author_article_counts();
    let second = catalog.author_article_counts();
    assert!(std::sync::Arc::ptr_eq(&first, &second), "second read hits cache");
    assert_eq!(first[0].author, "ada");
    assert_eq!(first[0].count, 2);

    catalog
        .add(&mut record("p3", &["bob"], 2021, &["graph"]))
        .unwrap();
    let third = catalog.author_article_counts();
    assert!(!std::sync::Arc::ptr_eq(&second, &third), "write invalidates");
    let bob = third.iter().find(|c| c.author == "bob").unwrap();
    assert_eq!(bob.count, 2);
}

#[test]
fn yearly_keyword_frequencies_normalize_per_year() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open(&dir);

    catalog
        .add(&mut record("p1", &["a"], 2020, &["graph", "search"]))
        .unwrap();
    catalog
        .add(&mut record("p2", &["b"], 2020, &["graph"]))
        .unwrap();
    // stop terms never appear in the report
    catalog
        .add(&mut record("p3", &["c"], 2021, &["the", "clique"]))
        .unwrap();
    // year 0 (unknown) is skipped entirely
    catalog
        .add(&mut record("p4", &["d"], 0, &["graph"]))
        .unwrap();

    let report = catalog.yearly_keyword_frequencies();
    let y2020 = &report[&2020];
    let graph = y2020.iter().find(|k| k.keyword == "graph").unwrap();
    let search = y2020.iter().find(|k| k.keyword == "search").unwrap();
    assert!((graph.frequency - 1.0).abs() < 1e-9);
    assert!((search.frequency - 0.5).abs() < 1e-9);
    // sorted descending by frequency
    assert!(y2020.windows(2).all(|w| w[0].frequency >= w[1].frequency));

    let y2021 = &report[&2021];
    assert!(y2021.iter().all(|k| k.keyword != "the"));
    assert!(y2021.iter().any(|k| k.keyword == "clique"));

    assert!(!report.contains_key(&0));
}
