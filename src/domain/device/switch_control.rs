use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Register holding the number of packets a flow sent, indexed by flow id (ingress device).
pub const FLOW_PACKETS_COUNTER: &str = "flow_packets_counter";
/// Register holding the number of packets received on a subflow, indexed by subflow id (egress device).
pub const SUBFLOW_PACKETS_COUNTER: &str = "subflow_packets_counter";
/// 0/1 flag telling the dataplane that a subflow failed, indexed by subflow id.
pub const SUBFLOW_FAILURE_STATUS: &str = "subflow_failure_status";
/// Maps a parent subflow id to the id of its backup.
pub const BACKUP_SUBFLOWS: &str = "backup_subflows";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("circuit open until {until_ms} ms")]
    CircuitOpen { until_ms: i64 },
}

/// A match-action table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub table: String,
    pub action: String,
    pub match_fields: Vec<String>,
    pub action_params: Vec<String>,
}

impl TableEntry {
    pub fn new(table: &str, action: impl Into<String>, match_fields: Vec<String>, action_params: Vec<String>) -> Self {
        Self { table: table.to_string(), action: action.into(), match_fields, action_params }
    }
}

impl fmt::Display for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?} => {:?}", self.table, self.action, self.match_fields, self.action_params)
    }
}

/// Request/response control channel of one programmable device.
///
/// Implementations own all switch-side state; the controller only writes it or samples it.
#[async_trait]
pub trait SwitchControl: fmt::Debug + Send + Sync {
    /// Clears tables, registers and multicast state.
    async fn reset_state(&self) -> Result<(), DeviceError>;

    async fn install_table_entry(&self, entry: TableEntry) -> Result<(), DeviceError>;

    async fn create_multicast_group(&self, group_id: u32) -> Result<(), DeviceError>;

    /// Creates a replication node and returns its handle.
    async fn create_multicast_node(&self, replication_id: u32, ports: Vec<u16>) -> Result<u32, DeviceError>;

    async fn associate_multicast_node(&self, group_id: u32, node_handle: u32) -> Result<(), DeviceError>;

    async fn read_register(&self, name: &str, index: u64) -> Result<i64, DeviceError>;

    async fn write_register(&self, name: &str, index: u64, value: i64) -> Result<(), DeviceError>;
}
