use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::device::switch_control::{DeviceError, SwitchControl, TableEntry};

#[derive(Debug, Default, Clone)]
pub struct SwitchState {
    pub tables: Vec<TableEntry>,
    pub registers: HashMap<(String, u64), i64>,
    pub multicast_groups: Vec<u32>,
    /// Replication nodes as (replication id, ports), indexed by handle.
    pub multicast_nodes: Vec<(u32, Vec<u16>)>,
    /// (group id, node handle) associations.
    pub associations: Vec<(u32, u32)>,
    pub resets: u32,
    pub writes: u32,
    pub reads: u32,
}

/// In-memory device used by tests and the dry-run binary.
///
/// Registers default to zero. `set_unreachable(true)` makes every call fail until cleared.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSwitch {
    pub name: String,
    state: Arc<Mutex<SwitchState>>,
    unreachable: Arc<Mutex<bool>>,
}

impl SimulatedSwitch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    fn lock(&self) -> MutexGuard<'_, SwitchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_reachable(&self) -> Result<(), DeviceError> {
        let unreachable = *self.unreachable.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if unreachable { Err(DeviceError::Unreachable(self.name.clone())) } else { Ok(()) }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = unreachable;
    }

    pub fn snapshot(&self) -> SwitchState {
        self.lock().clone()
    }

    pub fn register(&self, name: &str, index: u64) -> i64 {
        self.lock().registers.get(&(name.to_string(), index)).copied().unwrap_or(0)
    }

    /// Sets a register directly, bypassing reachability. Stands in for the dataplane updating counters.
    pub fn set_register(&self, name: &str, index: u64, value: i64) {
        self.lock().registers.insert((name.to_string(), index), value);
    }

    pub fn add_to_register(&self, name: &str, index: u64, delta: i64) {
        *self.lock().registers.entry((name.to_string(), index)).or_insert(0) += delta;
    }

    pub fn entries(&self, table: &str) -> Vec<TableEntry> {
        self.lock().tables.iter().filter(|entry| entry.table == table).cloned().collect()
    }
}

#[async_trait]
impl SwitchControl for SimulatedSwitch {
    async fn reset_state(&self) -> Result<(), DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();
        let resets = state.resets + 1;
        *state = SwitchState { resets, ..Default::default() };
        Ok(())
    }

    async fn install_table_entry(&self, entry: TableEntry) -> Result<(), DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();

        let duplicate = state.tables.iter().any(|existing| existing.table == entry.table && existing.match_fields == entry.match_fields);
        if duplicate {
            return Err(DeviceError::Rejected(format!("duplicate match {:?} in table {}", entry.match_fields, entry.table)));
        }

        state.tables.push(entry);
        Ok(())
    }

    async fn create_multicast_group(&self, group_id: u32) -> Result<(), DeviceError> {
        self.check_reachable()?;
        self.lock().multicast_groups.push(group_id);
        Ok(())
    }

    async fn create_multicast_node(&self, replication_id: u32, ports: Vec<u16>) -> Result<u32, DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();
        state.multicast_nodes.push((replication_id, ports));
        Ok(state.multicast_nodes.len() as u32 - 1)
    }

    async fn associate_multicast_node(&self, group_id: u32, node_handle: u32) -> Result<(), DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();
        if !state.multicast_groups.contains(&group_id) || node_handle as usize >= state.multicast_nodes.len() {
            return Err(DeviceError::Rejected(format!("cannot associate node {} with group {}", node_handle, group_id)));
        }
        state.associations.push((group_id, node_handle));
        Ok(())
    }

    async fn read_register(&self, name: &str, index: u64) -> Result<i64, DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.registers.get(&(name.to_string(), index)).copied().unwrap_or(0))
    }

    async fn write_register(&self, name: &str, index: u64, value: i64) -> Result<(), DeviceError> {
        self.check_reachable()?;
        let mut state = self.lock();
        state.writes += 1;
        state.registers.insert((name.to_string(), index), value);
        Ok(())
    }
}
