use std::sync::Arc;

use crate::domain::device::fabric::SwitchFabric;
use crate::domain::device::switch_control::{BACKUP_SUBFLOWS, DeviceError, TableEntry};
use crate::domain::routing::path::Path;
use crate::domain::topology::topology::TopologyView;
use crate::domain::utils::id::{FlowId, NodeId, SubflowId};
use crate::error::{Error, Result};

pub const IPV4_FORWARD_TABLE: &str = "ipv4_forward";
pub const MPLS_FEC_TABLE: &str = "mpls_fec";
pub const MPLS_FORWARD_TABLE: &str = "mpls_forward";
pub const L2_FORWARD_TABLE: &str = "l2_forward";

/// Writes forwarding state derived from placement decisions to the devices.
///
/// Labels follow one convention: the label of hop `a -> b` is `port(a -> b) + label_offset`,
/// and the last label of a subflow's stack is `subflow_id + label_offset`.
#[derive(Debug, Clone)]
pub struct DeviceProgrammer {
    topology: Arc<dyn TopologyView>,
    fabric: SwitchFabric,
    label_offset: u32,
}

impl DeviceProgrammer {
    pub fn new(topology: Arc<dyn TopologyView>, fabric: SwitchFabric, label_offset: u32) -> Self {
        Self { topology, fabric, label_offset }
    }

    pub fn fabric(&self) -> &SwitchFabric {
        &self.fabric
    }

    pub fn topology(&self) -> &Arc<dyn TopologyView> {
        &self.topology
    }

    pub fn label_offset(&self) -> u32 {
        self.label_offset
    }

    /// Label that makes `node` forward out of the port facing `neighbor`.
    pub fn hop_label(&self, node: &NodeId, neighbor: &NodeId) -> Result<u32> {
        let port = self
            .topology
            .port(node, neighbor)
            .ok_or_else(|| Error::TopologyError(format!("No port on {} facing {}", node, neighbor)))?;
        Ok(port as u32 + self.label_offset)
    }

    /// Full label stack pushed at the ingress for subflow `subflow_id` on `path`.
    ///
    /// Hosts are not part of the path: the last transit device pops the outer label.
    pub fn label_stack(&self, path: &Path, subflow_id: SubflowId) -> Result<Vec<u64>> {
        let mut labels = path.edges().map(|(a, b)| self.hop_label(a, b).map(u64::from)).collect::<Result<Vec<u64>>>()?;
        labels.push(subflow_id + self.label_offset as u64);
        Ok(labels)
    }

    /// Installs a table entry on `device`.
    ///
    /// A rejected entry (e.g. a duplicate match) is logged and skipped; an unreachable device is an error.
    pub async fn install(&self, device: &NodeId, entry: TableEntry) -> Result<()> {
        let control = self.fabric.device(device)?;
        log::debug!("{}: table_add {}", device, entry);

        match control.install_table_entry(entry.clone()).await {
            Ok(()) => Ok(()),
            Err(DeviceError::Rejected(reason)) => {
                log::warn!("{}: entry {} rejected: {}", device, entry, reason);
                Ok(())
            }
            Err(source) => Err(Error::Device { device: device.clone(), source }),
        }
    }

    pub async fn write_register(&self, device: &NodeId, name: &str, index: u64, value: i64) -> Result<()> {
        let control = self.fabric.device(device)?;
        log::debug!("{}: register_write {}[{}] = {}", device, name, index, value);

        control.write_register(name, index, value).await.map_err(|source| Error::Device { device: device.clone(), source })
    }

    /// Ingress rule that hashes traffic towards `destination` over `n_splits` FEC entries starting at `flow_id`.
    pub async fn program_ecmp_select(&self, ingress: &NodeId, destination: &NodeId, n_splits: u32, flow_id: FlowId) -> Result<()> {
        let dst_ip = self
            .topology
            .host_ip(destination)
            .ok_or_else(|| Error::TopologyError(format!("Destination {} has no host address", destination)))?;

        let entry = TableEntry::new(
            IPV4_FORWARD_TABLE,
            "mpls_ecmp_select",
            vec![format!("{}/32", strip_prefix_len(&dst_ip))],
            vec![n_splits.to_string(), flow_id.to_string()],
        );
        self.install(ingress, entry).await
    }

    /// FEC entry that pushes the label stack of `path` for `subflow_id` at the path's ingress.
    pub async fn program_fec(&self, path: &Path, subflow_id: SubflowId) -> Result<()> {
        let ingress = path.ingress().ok_or_else(|| Error::InvalidReservation(format!("subflow {} has an empty path", subflow_id)))?;
        let labels = self.label_stack(path, subflow_id)?;

        let entry = TableEntry::new(
            MPLS_FEC_TABLE,
            format!("mpls_ingress_{}_hop", labels.len()),
            vec![subflow_id.to_string()],
            labels.iter().map(|l| l.to_string()).collect(),
        );
        self.install(ingress, entry).await
    }

    /// Lets the dataplane splice in `backup_id` when `parent_id` is flagged as failed.
    pub async fn program_backup_register(&self, ingress: &NodeId, parent_id: SubflowId, backup_id: SubflowId) -> Result<()> {
        self.write_register(ingress, BACKUP_SUBFLOWS, parent_id, backup_id as i64).await
    }
}

/// `10.0.1.1/24` -> `10.0.1.1`
pub fn strip_prefix_len(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}
