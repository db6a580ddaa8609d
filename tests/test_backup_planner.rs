mod common;

use std::collections::HashSet;

use common::{TopologyBuilder, config, diamond_topology, fixture, node, single_split_config};
use mpls_te_controller::api::controller_dto::{BackupPolicyDto, ControllerConfigDto};
use mpls_te_controller::domain::capacity::ledger::CapacityView;
use mpls_te_controller::domain::device::programming::MPLS_FEC_TABLE;
use mpls_te_controller::domain::device::switch_control::BACKUP_SUBFLOWS;
use mpls_te_controller::domain::flow::flow::Flow;
use mpls_te_controller::domain::reservation::reservation_table::ReservationTable;
use mpls_te_controller::domain::reservation::subflow::SubflowState;
use mpls_te_controller::domain::routing::path::Path;

fn path(hops: &[&str]) -> Path {
    hops.iter().copied().collect()
}

fn assert_chains_are_acyclic(table: &ReservationTable) {
    for subflow in table.iter() {
        let chain = table.ancestor_chain(subflow.id);
        let unique: HashSet<u64> = chain.iter().copied().collect();
        assert_eq!(unique.len(), chain.len(), "chain of {} revisits a subflow", subflow.id);

        let root = table.get(*chain.last().unwrap()).unwrap();
        assert!(!root.is_backup(), "chain of {} does not end at a primary", subflow.id);
    }
}

#[tokio::test]
async fn test_two_backup_rounds_build_a_chain() {
    let mut fx = fixture(diamond_topology(10.0), config(single_split_config(2)));

    fx.controller.place_flows(&[Flow::new("h1", "h2", 128, 1_000_000)]).await.unwrap();
    let created = fx.controller.plan_backups().await.unwrap();
    assert_eq!(created, 2);

    let table = fx.controller.table();
    let primary = table.get(1).unwrap();
    let first = table.get(2).unwrap();
    let second = table.get(3).unwrap();

    assert_eq!(primary.backup_id, Some(2));
    assert_eq!(first.parent_id, Some(1));
    assert_eq!(first.backup_id, Some(3));
    assert_eq!(second.parent_id, Some(2));
    assert_eq!(second.backup_id, None);

    assert_eq!(first.path, path(&["s1", "s3", "s4"]));
    assert_eq!(second.path, path(&["s1", "s2", "s3", "s4"]));

    for backup in [first, second] {
        assert!(!backup.active);
        assert_eq!(backup.flow_id, 1);
        assert_eq!(backup.rate_share, primary.rate_share);
        assert_eq!(table.state(backup.id, 2), Some(SubflowState::Standby));
    }

    assert_eq!(table.ancestor_chain(3), vec![3, 2, 1]);
    assert_eq!(table.descendant_chain(1), vec![2, 3]);
    assert_chains_are_acyclic(table);
}

#[tokio::test]
async fn test_backup_never_contains_a_protected_path() {
    let mut fx = fixture(diamond_topology(10.0), config(single_split_config(3)));

    fx.controller.place_flows(&[Flow::new("h1", "h2", 128, 1_000_000)]).await.unwrap();
    fx.controller.plan_backups().await.unwrap();

    let table = fx.controller.table();
    for backup in table.iter().filter(|s| s.is_backup()) {
        for ancestor in table.ancestor_chain(backup.id).into_iter().skip(1) {
            let protected = &table.get(ancestor).unwrap().path;
            assert!(backup.path.shared_links(protected) < protected.edge_count(), "backup {} contains path of {}", backup.id, ancestor);
        }
    }
    assert_chains_are_acyclic(table);
}

#[tokio::test]
async fn test_backups_reserve_capacity_and_program_the_ingress() {
    let mut fx = fixture(diamond_topology(10.0), config(single_split_config(1)));

    fx.controller.place_flows(&[Flow::new("h1", "h2", 128, 1_000_000)]).await.unwrap();
    fx.controller.plan_backups().await.unwrap();

    let ledger = fx.controller.ledger();
    for (a, b) in [("s1", "s2"), ("s2", "s4"), ("s1", "s3"), ("s3", "s4")] {
        assert_eq!(ledger.residual(&node(a), &node(b), CapacityView::GoldOnly), Some(9_000_000), "{} -> {}", a, b);
    }
    assert_eq!(ledger.residual(&node("s2"), &node("s3"), CapacityView::GoldOnly), Some(10_000_000));

    let s1 = fx.switch("s1");
    assert_eq!(s1.register(BACKUP_SUBFLOWS, 1), 2);
    assert_eq!(s1.entries(MPLS_FEC_TABLE).len(), 2);
}

#[tokio::test]
async fn test_chain_reservations_do_not_block_their_backup() {
    // The only alternative to [s1 s2 s4] reuses the saturated s1 -> s2 link.
    let topology = TopologyBuilder::new()
        .host("h1", "10.0.1.1/24")
        .host("h2", "10.0.2.2/24")
        .switch("s1")
        .switch("s2")
        .switch("s3")
        .switch("s4")
        .link("h1", "s1", 10.0)
        .link("s1", "s2", 1.0)
        .link("s2", "s3", 10.0)
        .link("s2", "s4", 10.0)
        .link("s3", "s4", 10.0)
        .link("s4", "h2", 10.0)
        .build();
    let mut fx = fixture(topology, config(ControllerConfigDto { allow_degraded: false, ..single_split_config(1) }));

    fx.controller.place_flows(&[Flow::new("h1", "h2", 128, 1_000_000)]).await.unwrap();
    assert_eq!(fx.controller.ledger().residual(&node("s1"), &node("s2"), CapacityView::GoldOnly), Some(0));

    assert_eq!(fx.controller.plan_backups().await.unwrap(), 1);

    let backup = fx.controller.table().get(2).unwrap();
    assert_eq!(backup.path, path(&["s1", "s2", "s3", "s4"]));
    assert_eq!(fx.controller.ledger().residual(&node("s1"), &node("s2"), CapacityView::GoldOnly), Some(-1_000_000));
    assert_eq!(fx.controller.ledger().residual(&node("s2"), &node("s4"), CapacityView::GoldOnly), Some(9_000_000));
}

#[tokio::test]
async fn test_single_path_gets_no_backup() {
    let mut fx = fixture(common::line_topology(10.0), config(single_split_config(5)));

    fx.controller.place_flows(&[Flow::new("h1", "h2", 128, 1_000_000)]).await.unwrap();

    assert_eq!(fx.controller.plan_backups().await.unwrap(), 0);
    assert_eq!(fx.controller.table().get(1).unwrap().backup_id, None);
}

#[tokio::test]
async fn test_policy_only_covers_listed_tiers() {
    let dto = ControllerConfigDto {
        splits_override: Some(1),
        backup_policy: vec![BackupPolicyDto { tos: 64, count: 1 }],
        ..Default::default()
    };
    let mut fx = fixture(diamond_topology(10.0), config(dto));

    let flows = [Flow::new("h1", "h2", 128, 1_000_000), Flow::new("h1", "h2", 64, 1_000_000), Flow::new("h1", "h2", 0, 1_000_000)];
    fx.controller.place_flows(&flows).await.unwrap();
    assert_eq!(fx.controller.plan_backups().await.unwrap(), 1);

    let table = fx.controller.table();
    assert_eq!(table.get(1).unwrap().backup_id, None);
    assert_eq!(table.get(2).unwrap().backup_id, Some(4));
    assert_eq!(table.get(3).unwrap().backup_id, None);
}
