mod common;

use common::{TopologyBuilder, diamond_topology, line_topology, node};
use mpls_te_controller::api::topology_dto::TopologyDto;
use mpls_te_controller::domain::topology::topology::{NetworkTopology, NodeKind, TopologyView};
use mpls_te_controller::error::Error;

const TOPOLOGY_JSON: &str = r#"{
    "nodes": [
        { "name": "h1", "kind": "host", "ip": "10.0.1.1/24" },
        { "name": "s1", "kind": "switch" },
        { "name": "r1", "kind": "router" }
    ],
    "links": [
        { "node1": "h1", "node2": "s1", "bw": 10, "port1": 0, "port2": 1, "mac1": "00:00:0a:00:01:01", "mac2": "00:01:0a:00:01:01" },
        { "node1": "s1", "node2": "r1", "bw": 2.5, "port1": 2, "port2": 1, "mac1": "00:01:0a:00:01:02", "mac2": "00:02:0a:00:01:01", "ip2": "10.0.9.1/24" }
    ]
}"#;

#[test]
fn test_topology_from_json() {
    let dto: TopologyDto = serde_json::from_str(TOPOLOGY_JSON).unwrap();
    let topology = NetworkTopology::try_from(dto).unwrap();

    assert_eq!(topology.kind(&node("r1")), Some(NodeKind::Router));
    assert_eq!(topology.switches(), vec![node("s1")]);
    assert_eq!(topology.port(&node("s1"), &node("r1")), Some(2));
    assert_eq!(topology.mac(&node("r1"), &node("s1")).as_deref(), Some("00:02:0a:00:01:01"));
    assert_eq!(topology.interface_ip(&node("r1"), &node("s1")).as_deref(), Some("10.0.9.1/24"));
    assert_eq!(topology.host_ip(&node("h1")).as_deref(), Some("10.0.1.1/24"));
    assert_eq!(topology.host_ip(&node("s1")), None);
    assert_eq!(topology.hosts_connected_to(&node("s1")), vec![node("h1")]);
    assert_eq!(topology.routers_connected_to(&node("s1")), vec![node("r1")]);

    let bandwidths: Vec<i64> = topology.edges().iter().map(|(_, _, bw)| *bw).collect();
    assert_eq!(bandwidths, vec![10_000_000, 2_500_000]);
}

#[test]
fn test_unknown_node_rejected() {
    let dto = TopologyBuilder::new().switch("s1").link("s1", "s9", 10.0).dto();
    assert!(matches!(NetworkTopology::try_from(dto), Err(Error::TopologyError(_))));
}

#[test]
fn test_duplicate_link_rejected() {
    let dto = TopologyBuilder::new().switch("s1").switch("s2").link("s1", "s2", 10.0).link("s2", "s1", 10.0).dto();
    assert!(matches!(NetworkTopology::try_from(dto), Err(Error::TopologyError(_))));
}

#[test]
fn test_negative_bandwidth_rejected() {
    let dto = TopologyBuilder::new().switch("s1").switch("s2").link("s1", "s2", -1.0).dto();
    assert!(matches!(NetworkTopology::try_from(dto), Err(Error::TopologyError(_))));
}

#[test]
fn test_simple_paths_include_endpoints() {
    let topology = line_topology(10.0);
    assert_eq!(topology.all_simple_paths(&node("h1"), &node("h2")), vec![vec![node("h1"), node("s1"), node("s2"), node("h2")]]);
}

#[test]
fn test_simple_paths_in_diamond() {
    let topology = diamond_topology(10.0);
    let paths = topology.all_simple_paths(&node("h1"), &node("h2"));

    assert_eq!(paths.len(), 4);
    for path in &paths {
        assert_eq!(path.first(), Some(&node("h1")));
        assert_eq!(path.last(), Some(&node("h2")));
    }
}

#[test]
fn test_hosts_are_not_transit_nodes() {
    // h1 sits between s1 and s2; the only other way is the direct s1 - s2 link.
    let topology = TopologyBuilder::new()
        .host("h1", "10.0.1.1/24")
        .host("h2", "10.0.2.2/24")
        .switch("s1")
        .switch("s2")
        .link("s1", "h1", 10.0)
        .link("h1", "s2", 10.0)
        .link("s1", "s2", 10.0)
        .link("s2", "h2", 10.0)
        .build();

    let paths = topology.all_simple_paths(&node("s1"), &node("h2"));
    assert_eq!(paths, vec![vec![node("s1"), node("s2"), node("h2")]]);
}

#[test]
fn test_no_path_between_unknown_nodes() {
    let topology = line_topology(10.0);
    assert!(topology.all_simple_paths(&node("h1"), &node("h9")).is_empty());
}
