use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::topology_dto::{NodeKindDto, TopologyDto};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Host,
    Switch,
    Router,
}

impl From<NodeKindDto> for NodeKind {
    fn from(dto: NodeKindDto) -> Self {
        match dto {
            NodeKindDto::Host => NodeKind::Host,
            NodeKindDto::Switch => NodeKind::Switch,
            NodeKindDto::Router => NodeKind::Router,
        }
    }
}

/// The topology surface consumed by the control plane.
///
/// Directed queries (`port`, `mac`, `interface_ip`) describe the interface of `node` that faces `neighbor`.
pub trait TopologyView: std::fmt::Debug + Send + Sync {
    fn kind(&self, node: &NodeId) -> Option<NodeKind>;

    /// All programmable switches, sorted by name.
    fn switches(&self) -> Vec<NodeId>;

    /// Neighbours of `node`, sorted by name.
    fn neighbors(&self, node: &NodeId) -> Vec<NodeId>;

    fn port(&self, node: &NodeId, neighbor: &NodeId) -> Option<u16>;

    fn mac(&self, node: &NodeId, neighbor: &NodeId) -> Option<String>;

    fn interface_ip(&self, node: &NodeId, neighbor: &NodeId) -> Option<String>;

    /// Address of a host in CIDR notation.
    fn host_ip(&self, host: &NodeId) -> Option<String>;

    /// Undirected edges with their bandwidth in bit/s. Each physical link appears once.
    fn edges(&self) -> Vec<(NodeId, NodeId, i64)>;

    /// Every simple path from `source` to `destination`, endpoints included.
    fn all_simple_paths(&self, source: &NodeId, destination: &NodeId) -> Vec<Vec<NodeId>>;

    fn is_host(&self, node: &NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Host)
    }

    fn is_router(&self, node: &NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Router)
    }

    fn hosts_connected_to(&self, switch: &NodeId) -> Vec<NodeId> {
        self.neighbors(switch).into_iter().filter(|n| self.is_host(n)).collect()
    }

    fn routers_connected_to(&self, switch: &NodeId) -> Vec<NodeId> {
        self.neighbors(switch).into_iter().filter(|n| self.is_router(n)).collect()
    }
}

#[derive(Debug, Clone)]
struct Interface {
    port: u16,
    mac: String,
    ip: Option<String>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    ip: Option<String>,
}

/// Static graph of hosts, switches and routers loaded from a topology document.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    nodes: BTreeMap<NodeId, Node>,

    /// Sorted adjacency so path enumeration is deterministic.
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,

    /// Interface of the first node facing the second one.
    interfaces: HashMap<(NodeId, NodeId), Interface>,

    edges: Vec<(NodeId, NodeId, i64)>,
}

impl NetworkTopology {
    fn mbps_to_bps(bw: f64) -> i64 {
        (bw * 1_000_000.0).round() as i64
    }
}

impl TryFrom<TopologyDto> for NetworkTopology {
    type Error = Error;

    fn try_from(dto: TopologyDto) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for node in dto.nodes {
            let id = NodeId::new(node.name);
            if nodes.insert(id.clone(), Node { kind: node.kind.into(), ip: node.ip }).is_some() {
                return Err(Error::TopologyError(format!("Node {} is declared twice", id)));
            }
        }

        let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = nodes.keys().map(|id| (id.clone(), BTreeSet::new())).collect();
        let mut interfaces = HashMap::new();
        let mut edges = Vec::new();

        for link in dto.links {
            let a = NodeId::new(link.node1);
            let b = NodeId::new(link.node2);

            for end in [&a, &b] {
                if !nodes.contains_key(end) {
                    return Err(Error::TopologyError(format!("Link {} -- {} references unknown node {}", a, b, end)));
                }
            }

            if a == b || adjacency[&a].contains(&b) {
                return Err(Error::TopologyError(format!("Link {} -- {} is a self loop or duplicate", a, b)));
            }

            if !link.bw.is_finite() || link.bw < 0.0 {
                return Err(Error::TopologyError(format!("Link {} -- {} has invalid bandwidth {}", a, b, link.bw)));
            }

            adjacency.entry(a.clone()).or_default().insert(b.clone());
            adjacency.entry(b.clone()).or_default().insert(a.clone());

            interfaces.insert((a.clone(), b.clone()), Interface { port: link.port1, mac: link.mac1, ip: link.ip1 });
            interfaces.insert((b.clone(), a.clone()), Interface { port: link.port2, mac: link.mac2, ip: link.ip2 });

            edges.push((a, b, NetworkTopology::mbps_to_bps(link.bw)));
        }

        log::info!("Topology loaded: {} nodes, {} links.", nodes.len(), edges.len());

        Ok(NetworkTopology { nodes, adjacency, interfaces, edges })
    }
}

impl TopologyView for NetworkTopology {
    fn kind(&self, node: &NodeId) -> Option<NodeKind> {
        self.nodes.get(node).map(|n| n.kind)
    }

    fn switches(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|(_, n)| n.kind == NodeKind::Switch).map(|(id, _)| id.clone()).collect()
    }

    fn neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        self.adjacency.get(node).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    fn port(&self, node: &NodeId, neighbor: &NodeId) -> Option<u16> {
        self.interfaces.get(&(node.clone(), neighbor.clone())).map(|i| i.port)
    }

    fn mac(&self, node: &NodeId, neighbor: &NodeId) -> Option<String> {
        self.interfaces.get(&(node.clone(), neighbor.clone())).map(|i| i.mac.clone())
    }

    fn interface_ip(&self, node: &NodeId, neighbor: &NodeId) -> Option<String> {
        self.interfaces.get(&(node.clone(), neighbor.clone())).and_then(|i| i.ip.clone())
    }

    fn host_ip(&self, host: &NodeId) -> Option<String> {
        self.nodes.get(host).filter(|n| n.kind == NodeKind::Host).and_then(|n| n.ip.clone())
    }

    fn edges(&self) -> Vec<(NodeId, NodeId, i64)> {
        self.edges.clone()
    }

    /// Depth-first enumeration over the sorted adjacency. Hosts are never used as transit nodes.
    fn all_simple_paths(&self, source: &NodeId, destination: &NodeId) -> Vec<Vec<NodeId>> {
        let mut found = Vec::new();

        if !self.nodes.contains_key(source) || !self.nodes.contains_key(destination) || source == destination {
            log::debug!("NoPathFound: {} => {}", source, destination);
            return found;
        }

        // Explicit stack of (path so far, index of the next neighbour to try).
        let mut path: Vec<NodeId> = vec![source.clone()];
        let mut cursors: Vec<usize> = vec![0];

        while let Some(cursor) = cursors.last_mut() {
            let current = path.last().cloned().unwrap_or_else(|| source.clone());
            let neighbors = self.adjacency.get(&current);
            let next = neighbors.and_then(|set| set.iter().nth(*cursor)).cloned();
            *cursor += 1;

            match next {
                None => {
                    cursors.pop();
                    path.pop();
                }
                Some(next) if &next == destination => {
                    let mut solution = path.clone();
                    solution.push(next);
                    found.push(solution);
                }
                Some(next) => {
                    if path.contains(&next) || self.is_host(&next) {
                        continue;
                    }
                    path.push(next);
                    cursors.push(0);
                }
            }
        }

        log::debug!("Paths found {} => {}: {} solutions", source, destination, found.len());
        found
    }
}
