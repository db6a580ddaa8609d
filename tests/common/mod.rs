#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mpls_te_controller::api::controller_dto::{BackupPolicyDto, ControllerConfigDto};
use mpls_te_controller::api::topology_dto::{LinkDto, NodeDto, NodeKindDto, TopologyDto};
use mpls_te_controller::domain::clock::clock_mock::MockClock;
use mpls_te_controller::domain::control_plane::config::ControllerConfig;
use mpls_te_controller::domain::control_plane::controller::Controller;
use mpls_te_controller::domain::device::fabric::SwitchFabric;
use mpls_te_controller::domain::device::switch_mock::SimulatedSwitch;
use mpls_te_controller::domain::topology::topology::{NetworkTopology, TopologyView};
use mpls_te_controller::domain::utils::id::NodeId;

/// Builds topology documents with generated ports and MAC addresses.
#[derive(Default)]
pub struct TopologyBuilder {
    nodes: Vec<NodeDto>,
    links: Vec<LinkDto>,
    next_port: HashMap<String, u16>,
    interfaces: u16,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, name: &str, ip: &str) -> Self {
        self.nodes.push(NodeDto { name: name.to_string(), kind: NodeKindDto::Host, ip: Some(ip.to_string()) });
        self
    }

    pub fn switch(mut self, name: &str) -> Self {
        self.nodes.push(NodeDto { name: name.to_string(), kind: NodeKindDto::Switch, ip: None });
        self
    }

    /// Link with `bw` Mbit/s. Ports count up from 1 on every node.
    pub fn link(mut self, a: &str, b: &str, bw: f64) -> Self {
        let port1 = self.port(a);
        let port2 = self.port(b);
        let mac1 = self.mac();
        let mac2 = self.mac();

        self.links.push(LinkDto {
            node1: a.to_string(),
            node2: b.to_string(),
            bw,
            port1,
            port2,
            mac1,
            mac2,
            ip1: None,
            ip2: None,
        });
        self
    }

    fn port(&mut self, node: &str) -> u16 {
        let port = self.next_port.entry(node.to_string()).or_insert(0);
        *port += 1;
        *port
    }

    fn mac(&mut self) -> String {
        self.interfaces += 1;
        format!("02:00:00:00:{:02x}:{:02x}", self.interfaces / 256, self.interfaces % 256)
    }

    pub fn dto(self) -> TopologyDto {
        TopologyDto { nodes: self.nodes, links: self.links }
    }

    pub fn build(self) -> NetworkTopology {
        NetworkTopology::try_from(self.dto()).unwrap()
    }
}

/// h1 - s1 - s2 - h2, every link `bw` Mbit/s. Exactly one path: [s1, s2].
pub fn line_topology(bw: f64) -> NetworkTopology {
    TopologyBuilder::new()
        .host("h1", "10.0.1.1/24")
        .host("h2", "10.0.2.2/24")
        .switch("s1")
        .switch("s2")
        .link("h1", "s1", bw)
        .link("s1", "s2", bw)
        .link("s2", "h2", bw)
        .build()
}

/// h1 - s1, s1 - s2, s1 - s3, s2 - s3, s2 - s4, s3 - s4, s4 - h2.
///
/// Paths h1 => h2, shortest first: [s1 s2 s4], [s1 s3 s4], [s1 s2 s3 s4], [s1 s3 s2 s4].
pub fn diamond_topology(bw: f64) -> NetworkTopology {
    TopologyBuilder::new()
        .host("h1", "10.0.1.1/24")
        .host("h2", "10.0.2.2/24")
        .switch("s1")
        .switch("s2")
        .switch("s3")
        .switch("s4")
        .link("h1", "s1", bw)
        .link("s1", "s2", bw)
        .link("s1", "s3", bw)
        .link("s2", "s3", bw)
        .link("s2", "s4", bw)
        .link("s3", "s4", bw)
        .link("s4", "h2", bw)
        .build()
}

/// Two disconnected lines: h1 - s1 - s2 - h2 and h3 - s3 - s4 - h4.
pub fn twin_lines_topology(bw: f64) -> NetworkTopology {
    TopologyBuilder::new()
        .host("h1", "10.0.1.1/24")
        .host("h2", "10.0.2.2/24")
        .host("h3", "10.0.3.3/24")
        .host("h4", "10.0.4.4/24")
        .switch("s1")
        .switch("s2")
        .switch("s3")
        .switch("s4")
        .link("h1", "s1", bw)
        .link("s1", "s2", bw)
        .link("s2", "h2", bw)
        .link("h3", "s3", bw)
        .link("s3", "s4", bw)
        .link("s4", "h4", bw)
        .build()
}

pub fn config(dto: ControllerConfigDto) -> ControllerConfig {
    ControllerConfig::try_from(dto).unwrap()
}

/// One split per flow, `gold_backups` backup rounds for gold and none for other tiers.
pub fn single_split_config(gold_backups: u32) -> ControllerConfigDto {
    ControllerConfigDto {
        splits_override: Some(1),
        backup_policy: vec![BackupPolicyDto { tos: 128, count: gold_backups }],
        device_retries: 0,
        retry_backoff_ms: 0,
        ..Default::default()
    }
}

pub struct Fixture {
    pub controller: Controller,
    pub switches: BTreeMap<NodeId, SimulatedSwitch>,
    pub clock: MockClock,
}

impl Fixture {
    pub fn switch(&self, name: &str) -> &SimulatedSwitch {
        &self.switches[&NodeId::new(name)]
    }
}

/// A controller over simulated switches and a mock clock starting at 0 ms.
pub fn fixture(topology: NetworkTopology, config: ControllerConfig) -> Fixture {
    let topology: Arc<dyn TopologyView> = Arc::new(topology);
    let (fabric, switches) = SwitchFabric::simulated(topology.as_ref());
    let clock = MockClock::new(0);
    let controller = Controller::new(topology, fabric, config, Arc::new(clock.clone()));

    Fixture { controller, switches, clock }
}

pub fn node(name: &str) -> NodeId {
    NodeId::new(name)
}
