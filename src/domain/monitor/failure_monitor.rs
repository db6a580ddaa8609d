use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::clock::clock::SharedClock;
use crate::domain::control_plane::config::ControllerConfig;
use crate::domain::device::fabric::SwitchFabric;
use crate::domain::device::switch_control::{DeviceError, FLOW_PACKETS_COUNTER, SUBFLOW_FAILURE_STATUS, SUBFLOW_PACKETS_COUNTER};
use crate::domain::monitor::device_guard::DeviceGuard;
use crate::domain::monitor::event_log::{EventKind, EventLog, FailoverEvent};
use crate::domain::reservation::reservation_table::ReservationTable;
use crate::domain::utils::id::{FlowId, NodeId, SubflowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub check_interval: Duration,
    pub threshold_fail: u32,
    pub threshold_recover: u32,
}

impl From<&ControllerConfig> for MonitorConfig {
    fn from(config: &ControllerConfig) -> Self {
        MonitorConfig { check_interval: config.check_interval, threshold_fail: config.threshold_fail, threshold_recover: config.threshold_recover }
    }
}

/// What one monitoring pass observed and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sampled_flows: usize,

    /// Flows whose ingress counter could not be read; none of their subflows were evaluated.
    pub skipped_flows: Vec<FlowId>,

    /// Subflows whose egress counter could not be read.
    pub skipped_subflows: Vec<SubflowId>,

    /// (failed subflow, backup now forwarding)
    pub failovers: Vec<(SubflowId, SubflowId)>,

    pub recoveries: Vec<SubflowId>,

    /// Backups returned to standby by a recovery.
    pub reset_backups: Vec<SubflowId>,
}

impl TickReport {
    pub fn has_transitions(&self) -> bool {
        !self.failovers.is_empty() || !self.recoveries.is_empty()
    }
}

/// Periodic liveness check of every subflow, driven by the packet counters of the devices.
///
/// A subflow is only judged while its flow is sending, i.e. while the flow counter at the ingress changed since
/// the previous tick. An active subflow that saw no traffic at its egress for `threshold_fail` such ticks fails
/// over to its backup. A failed-over subflow is put back in service after `threshold_recover` ticks, and every
/// backup below it returns to standby; if its link is still down it simply fails over again.
#[derive(Debug)]
pub struct FailureMonitor {
    table: ReservationTable,
    fabric: SwitchFabric,
    guard: DeviceGuard,
    config: MonitorConfig,
    clock: SharedClock,

    /// Flow counter value seen at the previous tick.
    last_flow_counts: HashMap<FlowId, i64>,

    event_log: Option<EventLog>,
}

impl FailureMonitor {
    pub fn new(table: ReservationTable, fabric: SwitchFabric, guard: DeviceGuard, config: MonitorConfig, clock: SharedClock) -> Self {
        let last_flow_counts = table.iter().map(|subflow| (subflow.flow_id, 0)).collect();
        Self { table, fabric, guard, config, clock, last_flow_counts, event_log: None }
    }

    pub fn with_event_log(mut self, event_log: EventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn table(&self) -> &ReservationTable {
        &self.table
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn guard(&self) -> &DeviceGuard {
        &self.guard
    }

    /// Ticks every `check_interval` until `cancel` fires. Cancellation is honoured between ticks.
    ///
    /// # Returns
    /// The reservation table as the loop left it.
    pub async fn run(mut self, cancel: CancellationToken) -> ReservationTable {
        log::info!(
            "Starting failure detection: {} subflows, interval {:?}, fail after {} ticks, retry after {} ticks.",
            self.table.len(),
            self.config.check_interval,
            self.config.threshold_fail,
            self.config.threshold_recover
        );

        while !cancel.is_cancelled() {
            let report = self.tick().await;
            log::debug!(
                "Tick: {} flows sampled, {} flows and {} subflows skipped, {} failovers, {} recoveries.",
                report.sampled_flows,
                report.skipped_flows.len(),
                report.skipped_subflows.len(),
                report.failovers.len(),
                report.recoveries.len()
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.check_interval) => {}
            }
        }

        log::info!("Failure detection stopped.");
        self.table
    }

    /// One monitoring pass over all subflows in ascending id.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        let mut flow_ingress: BTreeMap<FlowId, NodeId> = BTreeMap::new();
        for subflow in self.table.iter() {
            if let Some(ingress) = subflow.path.ingress() {
                flow_ingress.entry(subflow.flow_id).or_insert_with(|| ingress.clone());
            }
        }

        let mut flow_counts: HashMap<FlowId, i64> = HashMap::new();
        for (flow_id, ingress) in flow_ingress {
            match self.read_register(&ingress, FLOW_PACKETS_COUNTER, flow_id).await {
                Ok(count) => {
                    flow_counts.insert(flow_id, count);
                }
                Err(e) => {
                    log::warn!("{}: cannot read counter of flow {}: {}", ingress, flow_id, e);
                    report.skipped_flows.push(flow_id);
                }
            }
        }
        report.sampled_flows = flow_counts.len();

        for id in self.table.ids() {
            let Some(subflow) = self.table.get(id) else {
                continue;
            };
            let Some(&count) = flow_counts.get(&subflow.flow_id) else {
                continue;
            };
            if self.last_flow_counts.get(&subflow.flow_id).copied().unwrap_or(0) == count {
                continue;
            }

            if subflow.active {
                self.check_active(id, &mut report).await;
            } else {
                self.check_failed_over(id, &mut report).await;
            }
        }

        self.last_flow_counts.extend(flow_counts);
        report
    }

    async fn check_active(&mut self, id: SubflowId, report: &mut TickReport) {
        let Some(subflow) = self.table.get(id) else {
            return;
        };
        let (Some(ingress), Some(egress)) = (subflow.path.ingress().cloned(), subflow.path.egress().cloned()) else {
            return;
        };
        let flow_id = subflow.flow_id;
        let has_backup = subflow.backup_id.is_some();

        let received = match self.read_register(&egress, SUBFLOW_PACKETS_COUNTER, id).await {
            Ok(received) => received,
            Err(e) => {
                log::warn!("{}: cannot read counter of subflow {}: {}", egress, id, e);
                report.skipped_subflows.push(id);
                return;
            }
        };

        if received > 0 {
            if let Err(e) = self.write_register(&egress, SUBFLOW_PACKETS_COUNTER, id, 0).await {
                log::warn!("{}: cannot clear counter of subflow {}: {}", egress, id, e);
            }
            if let Some(subflow) = self.table.get_mut(id) {
                subflow.failure_count = 0;
            }
            return;
        }

        let Some(failure_count) = self.table.get_mut(id).map(|subflow| {
            subflow.failure_count += 1;
            subflow.failure_count
        }) else {
            return;
        };

        if failure_count < self.config.threshold_fail {
            log::debug!("Subflow {} saw no traffic for {} ticks.", id, failure_count);
            return;
        }
        if !has_backup {
            if failure_count == self.config.threshold_fail {
                log::warn!("Subflow {} of flow {} looks failed but has no backup.", id, flow_id);
            }
            return;
        }

        // The dataplane switches on the failure flag; only fail over once it is set.
        if let Err(e) = self.write_register(&ingress, SUBFLOW_FAILURE_STATUS, id, 1).await {
            log::warn!("{}: cannot flag subflow {} as failed: {}", ingress, id, e);
            return;
        }

        match self.table.fail_over(id) {
            Ok(Some(backup_id)) => {
                log::warn!("Subflow {} of flow {} failed; traffic moved to backup {}.", id, flow_id, backup_id);
                report.failovers.push((id, backup_id));
                self.record(id, flow_id, EventKind::Failover);
            }
            Ok(None) => {}
            Err(e) => log::error!("Failover of subflow {} failed: {}", id, e),
        }
    }

    async fn check_failed_over(&mut self, id: SubflowId, report: &mut TickReport) {
        if !self.table.backup_active(id) {
            return;
        }

        let Some(subflow) = self.table.get_mut(id) else {
            return;
        };
        subflow.failure_count += 1;
        if subflow.failure_count < self.config.threshold_recover {
            return;
        }

        let flow_id = subflow.flow_id;
        let Some(ingress) = subflow.path.ingress().cloned() else {
            return;
        };

        if let Err(e) = self.write_register(&ingress, SUBFLOW_FAILURE_STATUS, id, 0).await {
            log::warn!("{}: cannot clear failure flag of subflow {}: {}", ingress, id, e);
            return;
        }

        let descendants = self.table.descendant_chain(id);
        let reset = match self.table.recover(id) {
            Ok(reset) => reset,
            Err(e) => {
                log::error!("Recovery of subflow {} failed: {}", id, e);
                return;
            }
        };

        log::info!("Subflow {} of flow {} back in service; {} backups returned to standby.", id, flow_id, reset.len());
        report.recoveries.push(id);
        self.record(id, flow_id, EventKind::Recovery);
        for backup_id in &reset {
            self.record(*backup_id, flow_id, EventKind::Reset);
        }
        report.reset_backups.extend(reset);

        // Backups that had failed themselves still carry the flag on their ingress.
        for backup_id in descendants {
            let Some(backup_ingress) = self.table.get(backup_id).and_then(|b| b.path.ingress().cloned()) else {
                continue;
            };
            if let Err(e) = self.write_register(&backup_ingress, SUBFLOW_FAILURE_STATUS, backup_id, 0).await {
                log::warn!("{}: cannot clear failure flag of backup {}: {}", backup_ingress, backup_id, e);
            }
        }
    }

    fn record(&mut self, subflow_id: SubflowId, flow_id: FlowId, event: EventKind) {
        let timestamp_ms = self.clock.now_ms();
        if let Some(event_log) = self.event_log.as_mut() {
            event_log.record(FailoverEvent { timestamp_ms, subflow_id, flow_id, event });
        }
    }

    async fn read_register(&mut self, device: &NodeId, name: &str, index: u64) -> Result<i64, DeviceError> {
        let control = match self.fabric.device(device) {
            Ok(control) => control.clone(),
            Err(e) => return Err(DeviceError::Unreachable(e.to_string())),
        };
        self.guard.call(device, || control.read_register(name, index)).await
    }

    async fn write_register(&mut self, device: &NodeId, name: &str, index: u64, value: i64) -> Result<(), DeviceError> {
        let control = match self.fabric.device(device) {
            Ok(control) => control.clone(),
            Err(e) => return Err(DeviceError::Unreachable(e.to_string())),
        };
        self.guard.call(device, || control.write_register(name, index, value)).await
    }
}
