use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Names the kind of entity an [`Id`] refers to.
pub trait IdTag {
    const KIND: &'static str;
}

/// String identifier tagged with the kind of entity it names, so ids of different kinds cannot be mixed up.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize)]
#[serde(transparent)]
pub struct Id<T> {
    pub id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl<T: IdTag> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", T::KIND, self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id: Id<T>) -> Self {
        id.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct NodeTag;

impl IdTag for NodeTag {
    const KIND: &'static str = "Node";
}

/// Name of a host, switch or router in the topology.
pub type NodeId = Id<NodeTag>;

/// Identifier of a subflow (primary or backup). Also used as register index and FEC key on the devices.
pub type SubflowId = u64;

/// Identifier of a flow: the id of its first subflow.
pub type FlowId = u64;
