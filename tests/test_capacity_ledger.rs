mod common;

use common::{diamond_topology, line_topology, node};
use mpls_te_controller::domain::capacity::ledger::{CapacityLedger, CapacityView};
use mpls_te_controller::domain::flow::flow::Tier;
use mpls_te_controller::domain::routing::path::Path;
use mpls_te_controller::error::Error;

fn path(hops: &[&str]) -> Path {
    hops.iter().copied().collect()
}

fn residuals(ledger: &CapacityLedger, a: &str, b: &str) -> [i64; 3] {
    CapacityView::ALL.map(|view| ledger.residual(&node(a), &node(b), view).unwrap())
}

#[test]
fn test_host_links_are_not_tracked() {
    let ledger = CapacityLedger::from_topology(&line_topology(10.0));

    assert_eq!(ledger.links().count(), 2);
    assert!(ledger.link(&node("h1"), &node("s1")).is_none());
    assert_eq!(residuals(&ledger, "s1", "s2"), [10_000_000; 3]);
    assert_eq!(residuals(&ledger, "s2", "s1"), [10_000_000; 3]);
}

#[test]
fn test_tiers_debit_nested_views() {
    let mut ledger = CapacityLedger::from_topology(&line_topology(10.0));
    let p = path(&["s1", "s2"]);

    ledger.debit(&p, 1_000_000, Tier::Gold).unwrap();
    assert_eq!(residuals(&ledger, "s1", "s2"), [9_000_000, 9_000_000, 9_000_000]);

    ledger.debit(&p, 1_000_000, Tier::Silver).unwrap();
    assert_eq!(residuals(&ledger, "s1", "s2"), [8_000_000, 8_000_000, 9_000_000]);

    ledger.debit(&p, 1_000_000, Tier::Bronze).unwrap();
    assert_eq!(residuals(&ledger, "s1", "s2"), [7_000_000, 8_000_000, 9_000_000]);

    // Views never cross: a broader view is always at most as large as a narrower one.
    let [all, silver_gold, gold] = residuals(&ledger, "s1", "s2");
    assert!(all <= silver_gold && silver_gold <= gold);

    // The reverse direction is independent.
    assert_eq!(residuals(&ledger, "s2", "s1"), [10_000_000; 3]);
}

#[test]
fn test_credit_is_inverse_of_debit() {
    let mut ledger = CapacityLedger::from_topology(&diamond_topology(10.0));
    let p = path(&["s1", "s2", "s3", "s4"]);

    for tier in [Tier::Gold, Tier::Silver, Tier::Bronze] {
        ledger.debit(&p, 333_333, tier).unwrap();
        ledger.credit(&p, 333_333, tier).unwrap();
    }

    for (a, b) in [("s1", "s2"), ("s2", "s3"), ("s3", "s4")] {
        assert_eq!(residuals(&ledger, a, b), [10_000_000; 3]);
    }
}

#[test]
fn test_fits_checks_the_tier_view() {
    let mut ledger = CapacityLedger::from_topology(&line_topology(10.0));
    let p = path(&["s1", "s2"]);

    ledger.debit(&p, 8_000_000, Tier::Bronze).unwrap();

    assert!(!ledger.fits(&p, 5_000_000, Tier::Bronze));
    assert!(ledger.fits(&p, 5_000_000, Tier::Gold));
    assert!(ledger.fits(&p, 2_000_000, Tier::Bronze));
    assert!(ledger.fits(&p, 0, Tier::Bronze));
}

#[test]
fn test_oversubscribed_link_fails_zero_bandwidth_check() {
    let mut ledger = CapacityLedger::from_topology(&line_topology(1.0));
    let p = path(&["s1", "s2"]);

    ledger.debit(&p, 2_000_000, Tier::Bronze).unwrap();

    assert_eq!(ledger.residual(&node("s1"), &node("s2"), CapacityView::AllTraffic), Some(-1_000_000));
    assert!(!ledger.fits(&p, 0, Tier::Bronze));
}

#[test]
fn test_unknown_link_leaves_ledger_untouched() {
    let mut ledger = CapacityLedger::from_topology(&line_topology(10.0));
    let p = path(&["s1", "s2", "s9"]);

    assert!(!ledger.fits(&p, 0, Tier::Gold));
    assert!(matches!(ledger.debit(&p, 1_000_000, Tier::Gold), Err(Error::UnknownLink { .. })));
    assert_eq!(residuals(&ledger, "s1", "s2"), [10_000_000; 3]);
}

#[test]
fn test_single_switch_path_always_fits() {
    let ledger = CapacityLedger::from_topology(&line_topology(10.0));
    assert!(ledger.fits(&path(&["s1"]), i64::MAX, Tier::Bronze));
}
