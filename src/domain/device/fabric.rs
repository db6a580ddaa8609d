use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::device::switch_control::SwitchControl;
use crate::domain::device::switch_mock::SimulatedSwitch;
use crate::domain::topology::topology::TopologyView;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

pub type SharedSwitch = Arc<dyn SwitchControl>;

/// Control channels of every programmable device, keyed by device name.
#[derive(Debug, Clone, Default)]
pub struct SwitchFabric {
    devices: BTreeMap<NodeId, SharedSwitch>,
}

impl SwitchFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fabric with one [`SimulatedSwitch`] per switch of `topology`. Also returns the concrete handles.
    pub fn simulated(topology: &dyn TopologyView) -> (Self, BTreeMap<NodeId, SimulatedSwitch>) {
        let mut fabric = SwitchFabric::new();
        let mut handles = BTreeMap::new();

        for switch in topology.switches() {
            let device = SimulatedSwitch::new(switch.as_str());
            handles.insert(switch.clone(), device.clone());
            fabric.register(switch, Arc::new(device));
        }

        (fabric, handles)
    }

    pub fn register(&mut self, device: NodeId, control: SharedSwitch) {
        log::debug!("Registered control channel for {}.", device);
        self.devices.insert(device, control);
    }

    pub fn device(&self, device: &NodeId) -> Result<&SharedSwitch> {
        self.devices.get(device).ok_or_else(|| Error::UnknownDevice(device.clone()))
    }

    pub fn devices(&self) -> impl Iterator<Item = (&NodeId, &SharedSwitch)> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
