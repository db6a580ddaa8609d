use std::sync::Arc;

use crate::domain::capacity::ledger::CapacityLedger;
use crate::domain::clock::clock::SharedClock;
use crate::domain::control_plane::config::ControllerConfig;
use crate::domain::device::bootstrap::Bootstrap;
use crate::domain::device::fabric::SwitchFabric;
use crate::domain::device::programming::DeviceProgrammer;
use crate::domain::flow::flow::Flow;
use crate::domain::monitor::device_guard::DeviceGuard;
use crate::domain::monitor::event_log::EventLog;
use crate::domain::monitor::failure_monitor::{FailureMonitor, MonitorConfig};
use crate::domain::planning::backup_planner::BackupPlanner;
use crate::domain::planning::network_state::NetworkState;
use crate::domain::planning::reservation_engine::{FlowPlacement, ReservationEngine};
use crate::domain::reservation::reservation_table::ReservationTable;
use crate::domain::topology::topology::TopologyView;
use crate::error::Result;

/// Result of the one-shot setup phase.
#[derive(Debug, Clone, Default)]
pub struct SetupSummary {
    pub placements: Vec<FlowPlacement>,
    pub backups: usize,
}

impl SetupSummary {
    pub fn flows(&self) -> usize {
        self.placements.len()
    }

    pub fn subflows(&self) -> usize {
        self.placements.iter().map(|p| p.placed.len()).sum()
    }

    /// Flows that got fewer subflows than requested (possibly none).
    pub fn under_provisioned(&self) -> impl Iterator<Item = &FlowPlacement> {
        self.placements.iter().filter(|p| !p.is_complete())
    }

    pub fn print_summary(&self) {
        let under_provisioned: Vec<&FlowPlacement> = self.under_provisioned().collect();

        log::info!(
            "Setup finished: {} flows, {} subflows, {} backups, {} flows under-provisioned.",
            self.flows(),
            self.subflows(),
            self.backups,
            under_provisioned.len()
        );
        for placement in under_provisioned {
            log::warn!(
                "  {} => {} ({}): {}/{} subflows placed.",
                placement.flow.source,
                placement.flow.destination,
                placement.flow.tier,
                placement.placed.len(),
                placement.requested_splits
            );
        }
    }
}

/// Owns the control plane from bootstrap to the hand-over to the failure monitor.
#[derive(Debug)]
pub struct Controller {
    config: ControllerConfig,
    programmer: DeviceProgrammer,
    state: NetworkState,
    clock: SharedClock,
}

impl Controller {
    pub fn new(topology: Arc<dyn TopologyView>, fabric: SwitchFabric, config: ControllerConfig, clock: SharedClock) -> Self {
        let state = NetworkState::new(topology.clone(), config.shuffle_candidates);
        let programmer = DeviceProgrammer::new(topology, fabric, config.label_offset);

        Self { config, programmer, state, clock }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.state.ledger
    }

    pub fn table(&self) -> &ReservationTable {
        &self.state.table
    }

    pub fn programmer(&self) -> &DeviceProgrammer {
        &self.programmer
    }

    /// Bootstraps the devices, places `flows` and provisions backups according to the backup policy.
    pub async fn setup(&mut self, flows: &[Flow]) -> Result<SetupSummary> {
        Bootstrap::new(&self.programmer).run().await?;

        let placements = self.place_flows(flows).await?;
        let backups = self.plan_backups().await?;

        let summary = SetupSummary { placements, backups };
        summary.print_summary();
        Ok(summary)
    }

    pub async fn place_flows(&mut self, flows: &[Flow]) -> Result<Vec<FlowPlacement>> {
        ReservationEngine::new(&mut self.state, &self.programmer, self.config.allow_degraded, self.config.splits_override).place_flows(flows).await
    }

    /// Runs the backup rounds of every tier in the policy, gold first.
    ///
    /// # Returns
    /// The number of backups created.
    pub async fn plan_backups(&mut self) -> Result<usize> {
        let mut created = 0;
        let mut planner = BackupPlanner::new(&mut self.state, &self.programmer, self.config.allow_degraded);

        for policy in self.config.backup_policy_in_priority_order() {
            created += planner.plan(policy.tier, policy.count).await?.len();
        }

        Ok(created)
    }

    /// Ends the setup phase. The reservation table moves into the monitor, which becomes its only writer.
    pub fn into_monitor(self) -> Result<FailureMonitor> {
        let guard = DeviceGuard::new(
            self.clock.clone(),
            self.config.device_timeout,
            self.config.device_retries,
            self.config.retry_backoff,
            self.config.breaker_threshold,
            self.config.breaker_cooldown_ms,
        );
        let monitor_config = MonitorConfig::from(&self.config);
        let fabric = self.programmer.fabric().clone();

        let mut monitor = FailureMonitor::new(self.state.table, fabric, guard, monitor_config, self.clock);
        if let Some(file_path) = &self.config.event_log {
            monitor = monitor.with_event_log(EventLog::create(file_path)?);
        }

        Ok(monitor)
    }
}
