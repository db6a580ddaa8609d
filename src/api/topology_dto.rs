use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindDto {
    Host,
    Switch,
    Router,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDto {
    pub name: String,
    pub kind: NodeKindDto,
    /// Host address in CIDR notation, e.g. `10.0.1.1/24`.
    pub ip: Option<String>,
}

/// One physical, bidirectional link. Each end carries its own port, MAC and (for routers) interface address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub node1: String,
    pub node2: String,
    /// Link bandwidth in Mbit/s.
    pub bw: f64,
    pub port1: u16,
    pub port2: u16,
    pub mac1: String,
    pub mac2: String,
    pub ip1: Option<String>,
    pub ip2: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyDto {
    pub nodes: Vec<NodeDto>,
    pub links: Vec<LinkDto>,
}
