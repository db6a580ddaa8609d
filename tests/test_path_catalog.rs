mod common;

use std::sync::Arc;

use common::{diamond_topology, line_topology, node};
use mpls_te_controller::domain::capacity::ledger::CapacityLedger;
use mpls_te_controller::domain::flow::flow::Tier;
use mpls_te_controller::domain::routing::path::Path;
use mpls_te_controller::domain::routing::path_catalog::PathCatalog;
use mpls_te_controller::domain::topology::topology::{NetworkTopology, TopologyView};

fn path(hops: &[&str]) -> Path {
    hops.iter().copied().collect()
}

fn catalog_and_ledger(topology: NetworkTopology) -> (PathCatalog, CapacityLedger) {
    let topology: Arc<dyn TopologyView> = Arc::new(topology);
    let ledger = CapacityLedger::from_topology(topology.as_ref());
    (PathCatalog::new(topology), ledger)
}

#[test]
fn test_paths_are_trimmed_and_sorted() {
    let (mut catalog, _) = catalog_and_ledger(diamond_topology(10.0));
    let paths = catalog.paths(&node("h1"), &node("h2"));

    assert_eq!(
        paths.to_vec(),
        vec![path(&["s1", "s2", "s4"]), path(&["s1", "s3", "s4"]), path(&["s1", "s2", "s3", "s4"]), path(&["s1", "s3", "s2", "s4"])]
    );
}

#[test]
fn test_paths_are_cached() {
    let (mut catalog, _) = catalog_and_ledger(diamond_topology(10.0));

    let first = catalog.paths(&node("h1"), &node("h2"));
    let second = catalog.paths(&node("h1"), &node("h2"));

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_available_paths_filters_by_capacity() {
    let (mut catalog, mut ledger) = catalog_and_ledger(diamond_topology(10.0));
    ledger.debit(&path(&["s1", "s2"]), 9_000_000, Tier::Bronze).unwrap();

    let available = catalog.available_paths(&ledger, &node("h1"), &node("h2"), 2_000_000, Tier::Bronze, false);

    assert_eq!(available, vec![path(&["s1", "s3", "s4"]), path(&["s1", "s3", "s2", "s4"])]);
}

#[test]
fn test_available_paths_gold_ignores_bronze_load() {
    let (mut catalog, mut ledger) = catalog_and_ledger(diamond_topology(10.0));
    ledger.debit(&path(&["s1", "s2"]), 9_000_000, Tier::Bronze).unwrap();

    let available = catalog.available_paths(&ledger, &node("h1"), &node("h2"), 2_000_000, Tier::Gold, false);

    assert_eq!(available.len(), 4);
}

#[test]
fn test_greedy_fallback_returns_undersized_path() {
    let (mut catalog, mut ledger) = catalog_and_ledger(line_topology(10.0));
    ledger.debit(&path(&["s1", "s2"]), 8_000_000, Tier::Bronze).unwrap();

    let degraded = catalog.available_paths(&ledger, &node("h1"), &node("h2"), 5_000_000, Tier::Bronze, true);
    assert_eq!(degraded, vec![path(&["s1", "s2"])]);

    let strict = catalog.available_paths(&ledger, &node("h1"), &node("h2"), 5_000_000, Tier::Bronze, false);
    assert!(strict.is_empty());
}

#[test]
fn test_greedy_fallback_skips_exhausted_links() {
    let (mut catalog, mut ledger) = catalog_and_ledger(line_topology(10.0));
    ledger.debit(&path(&["s1", "s2"]), 11_000_000, Tier::Bronze).unwrap();

    assert!(catalog.available_paths(&ledger, &node("h1"), &node("h2"), 1, Tier::Bronze, true).is_empty());
}

#[test]
fn test_shuffled_candidates_keep_the_same_set() {
    let topology: Arc<dyn TopologyView> = Arc::new(diamond_topology(10.0));
    let ledger = CapacityLedger::from_topology(topology.as_ref());
    let mut catalog = PathCatalog::new(topology).with_shuffled_candidates(true);

    let mut available = catalog.available_paths(&ledger, &node("h1"), &node("h2"), 1_000_000, Tier::Silver, false);
    available.sort_by_key(|p| p.to_string());

    let mut expected = catalog.paths(&node("h1"), &node("h2")).to_vec();
    expected.sort_by_key(|p| p.to_string());

    assert_eq!(available, expected);
}

#[test]
fn test_no_paths_for_unconnected_hosts() {
    let (mut catalog, ledger) = catalog_and_ledger(common::twin_lines_topology(10.0));
    assert!(catalog.available_paths(&ledger, &node("h1"), &node("h4"), 0, Tier::Gold, true).is_empty());
}
