use std::fmt;

use crate::domain::utils::id::NodeId;

/// Ordered sequence of the switches and routers a subflow traverses. Source and destination hosts are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    pub hops: Vec<NodeId>,
}

impl Path {
    pub fn new(hops: Vec<NodeId>) -> Self {
        Self { hops }
    }

    pub fn ingress(&self) -> Option<&NodeId> {
        self.hops.first()
    }

    pub fn egress(&self) -> Option<&NodeId> {
        self.hops.last()
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Directed links between consecutive hops.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.hops.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn edge_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }

    /// Number of this path's links that also belong to `other`.
    pub fn shared_links(&self, other: &Path) -> usize {
        let other_edges: Vec<(&NodeId, &NodeId)> = other.edges().collect();
        self.edges().filter(|edge| other_edges.contains(edge)).count()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.hops.iter().map(|hop| hop.as_str()).collect();
        write!(f, "[{}]", names.join(" -> "))
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path::new(iter.into_iter().map(NodeId::new).collect())
    }
}
