use crate::domain::device::programming::{
    DeviceProgrammer, IPV4_FORWARD_TABLE, L2_FORWARD_TABLE, MPLS_FORWARD_TABLE, strip_prefix_len,
};
use crate::domain::device::switch_control::{DeviceError, TableEntry};
use crate::domain::topology::topology::NodeKind;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

pub const L2_BROADCAST_GROUP_ID: u32 = 1;
pub const L2_MULTICAST_GROUP_ID: u32 = 2;

const BROADCAST_MAC: &str = "ff:ff:ff:ff:ff:ff/48";
const MULTICAST_MAC: &str = "01:00:5e:00:00:00/25";

/// One-shot static programming of every switch before any flow is placed.
pub struct Bootstrap<'a> {
    programmer: &'a DeviceProgrammer,
}

impl<'a> Bootstrap<'a> {
    pub fn new(programmer: &'a DeviceProgrammer) -> Self {
        Self { programmer }
    }

    pub async fn run(&self) -> Result<()> {
        self.reset_states().await?;
        self.create_l2_multicast_groups().await?;
        self.add_l2_forwarding_rules().await?;
        self.add_l3_forwarding_rules().await?;
        self.set_default_mpls_labels().await?;

        log::info!("Static forwarding state installed on {} switches.", self.programmer.fabric().len());
        Ok(())
    }

    fn port(&self, switch: &NodeId, neighbor: &NodeId) -> Result<u16> {
        self.programmer
            .topology()
            .port(switch, neighbor)
            .ok_or_else(|| Error::TopologyError(format!("No port on {} facing {}", switch, neighbor)))
    }

    fn mac(&self, node: &NodeId, neighbor: &NodeId) -> Result<String> {
        self.programmer
            .topology()
            .mac(node, neighbor)
            .ok_or_else(|| Error::TopologyError(format!("No MAC on {} facing {}", node, neighbor)))
    }

    async fn reset_states(&self) -> Result<()> {
        for (device, control) in self.programmer.fabric().devices() {
            log::debug!("{}: reset_state", device);
            control.reset_state().await.map_err(|source| Error::Device { device: device.clone(), source })?;
        }
        Ok(())
    }

    /// Group 1 floods to hosts and routers (ARP), group 2 to routers only (e.g. OSPF hellos).
    async fn create_l2_multicast_groups(&self) -> Result<()> {
        let topology = self.programmer.topology();

        for switch in topology.switches() {
            let control = self.programmer.fabric().device(&switch)?;
            let device_error = |source: DeviceError| Error::Device { device: switch.clone(), source };

            let mut broadcast_ports = Vec::new();
            let mut multicast_ports = Vec::new();

            for host in topology.hosts_connected_to(&switch) {
                broadcast_ports.push(self.port(&switch, &host)?);
            }
            for router in topology.routers_connected_to(&switch) {
                let port = self.port(&switch, &router)?;
                broadcast_ports.push(port);
                multicast_ports.push(port);
            }

            log::debug!("{}: multicast groups bcast={:?} mcast={:?}", switch, broadcast_ports, multicast_ports);

            control.create_multicast_group(L2_BROADCAST_GROUP_ID).await.map_err(device_error)?;
            control.create_multicast_group(L2_MULTICAST_GROUP_ID).await.map_err(device_error)?;

            let broadcast_handle = control.create_multicast_node(0, broadcast_ports).await.map_err(device_error)?;
            let multicast_handle = control.create_multicast_node(0, multicast_ports).await.map_err(device_error)?;

            control.associate_multicast_node(L2_BROADCAST_GROUP_ID, broadcast_handle).await.map_err(device_error)?;
            control.associate_multicast_node(L2_MULTICAST_GROUP_ID, multicast_handle).await.map_err(device_error)?;
        }
        Ok(())
    }

    async fn add_l2_forwarding_rules(&self) -> Result<()> {
        let topology = self.programmer.topology();

        for switch in topology.switches() {
            self.programmer.install(&switch, TableEntry::new(L2_FORWARD_TABLE, "broadcast", vec![BROADCAST_MAC.to_string()], vec![])).await?;
            self.programmer.install(&switch, TableEntry::new(L2_FORWARD_TABLE, "multicast", vec![MULTICAST_MAC.to_string()], vec![])).await?;

            let neighbors = topology.hosts_connected_to(&switch).into_iter().chain(topology.routers_connected_to(&switch));
            for neighbor in neighbors {
                let neighbor_mac = self.mac(&neighbor, &switch)?;
                let port = self.port(&switch, &neighbor)?;
                let entry = TableEntry::new(L2_FORWARD_TABLE, "l2_forward_action", vec![format!("{}/48", neighbor_mac)], vec![port.to_string()]);
                self.programmer.install(&switch, entry).await?;
            }
        }
        Ok(())
    }

    /// Host routes (/32), router interface routes (/32) and, through neighbouring switches, their hosts' subnets (/24).
    async fn add_l3_forwarding_rules(&self) -> Result<()> {
        let topology = self.programmer.topology();

        for switch in topology.switches() {
            for neighbor in topology.neighbors(&switch) {
                let port = self.port(&switch, &neighbor)?;
                let dst_mac = self.mac(&neighbor, &switch)?;
                let src_mac = self.mac(&switch, &neighbor)?;
                let params = vec![dst_mac, src_mac, port.to_string()];

                let prefixes = match topology.kind(&neighbor) {
                    Some(NodeKind::Host) => {
                        let ip = topology.host_ip(&neighbor).ok_or_else(|| Error::TopologyError(format!("Host {} has no address", neighbor)))?;
                        vec![format!("{}/32", strip_prefix_len(&ip))]
                    }
                    Some(NodeKind::Router) => match topology.interface_ip(&neighbor, &switch) {
                        Some(ip) => vec![format!("{}/32", strip_prefix_len(&ip))],
                        None => {
                            log::warn!("Router {} has no interface address towards {}; no route installed.", neighbor, switch);
                            vec![]
                        }
                    },
                    Some(NodeKind::Switch) => topology
                        .hosts_connected_to(&neighbor)
                        .iter()
                        .filter_map(|host| topology.host_ip(host))
                        .map(|ip| format!("{}/24", strip_prefix_len(&ip)))
                        .collect(),
                    None => return Err(Error::TopologyError(format!("Unknown neighbor {} of {}", neighbor, switch))),
                };

                for prefix in prefixes {
                    let entry = TableEntry::new(IPV4_FORWARD_TABLE, "ipv4_forward_action", vec![prefix], params.clone());
                    self.programmer.install(&switch, entry).await?;
                }
            }
        }
        Ok(())
    }

    /// Default label per port: a packet carrying `port + label_offset` leaves through `port`.
    async fn set_default_mpls_labels(&self) -> Result<()> {
        let topology = self.programmer.topology();

        for switch in topology.switches() {
            for neighbor in topology.neighbors(&switch) {
                let label = self.programmer.hop_label(&switch, &neighbor)?;
                let port = self.port(&switch, &neighbor)?;
                let dst_mac = self.mac(&neighbor, &switch)?;
                let src_mac = self.mac(&switch, &neighbor)?;

                let entry = TableEntry::new(MPLS_FORWARD_TABLE, "mpls_forward_action", vec![label.to_string()], vec![dst_mac, src_mac, port.to_string()]);
                self.programmer.install(&switch, entry).await?;
            }
        }
        Ok(())
    }
}
