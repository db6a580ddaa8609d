use crate::domain::flow::flow::Tier;
use crate::domain::routing::path::Path;
use crate::domain::utils::id::{FlowId, NodeId, SubflowId};

/// Liveness state of a subflow, derived from `active`, `failure_count` and the backup relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubflowState {
    /// Forwarding and the last sample saw traffic.
    ActiveHealthy,
    /// Forwarding, but the last `failure_count` samples saw no traffic.
    ActiveSuspect,
    /// Not forwarding because it failed; its backup carries the traffic and it is waiting to be retried.
    FailedOver,
    /// Not forwarding and not needed.
    Standby,
    /// Failed over and counting towards the recovery threshold.
    StandbyVerifying,
}

/// One bandwidth-bounded slice of a flow, or a standby copy protecting another subflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Subflow {
    pub id: SubflowId,

    /// Id of the first subflow of the parent flow.
    pub flow_id: FlowId,

    /// Path currently assigned to this entity (primary or backup path).
    pub path: Path,

    /// Bandwidth in bit/s this single subflow consumes.
    pub rate_share: i64,

    /// Number of subflows the parent flow was split into.
    pub n_splits: u32,

    pub tier: Tier,
    pub source: NodeId,
    pub destination: NodeId,

    pub active: bool,

    /// The subflow this entity backs up. `None` for primaries.
    pub parent_id: Option<SubflowId>,

    /// The entity backing up this one.
    pub backup_id: Option<SubflowId>,

    /// Consecutive missed-traffic samples (while active) or verification ticks (while failed over).
    pub failure_count: u32,
}

impl Subflow {
    pub fn is_backup(&self) -> bool {
        self.parent_id.is_some()
    }

    /// `backup_active` tells whether this subflow's direct backup is currently forwarding.
    pub fn state(&self, threshold_fail: u32, backup_active: bool) -> SubflowState {
        match (self.active, self.failure_count) {
            (true, 0) => SubflowState::ActiveHealthy,
            (true, _) => SubflowState::ActiveSuspect,
            (false, _) if backup_active && self.failure_count > threshold_fail => SubflowState::StandbyVerifying,
            (false, _) if backup_active => SubflowState::FailedOver,
            (false, _) => SubflowState::Standby,
        }
    }
}
