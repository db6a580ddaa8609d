use crate::api::controller_dto::ControllerConfigDto;
use crate::api::topology_dto::TopologyDto;
use crate::domain::control_plane::config::ControllerConfig;
use crate::domain::flow::flow::Flow;
use crate::domain::topology::topology::NetworkTopology;
use crate::error::Result;
use crate::loader::parser::{parse_json_file, parse_traffic_file};

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Validated inputs of one controller run.
#[derive(Debug, Clone)]
pub struct ControllerInputs {
    pub topology: NetworkTopology,
    pub flows: Vec<Flow>,
    pub config: ControllerConfig,
}

/// Reads and validates the topology, the traffic matrix and the optional controller configuration.
pub fn load_inputs(topology_path: &str, traffic_path: &str, config_path: Option<&str>) -> Result<ControllerInputs> {
    let topology_dto: TopologyDto = parse_json_file::<TopologyDto>(topology_path)?;
    let topology = NetworkTopology::try_from(topology_dto)?;
    log::info!("Topology '{}' loaded.", topology_path);

    let flows = parse_traffic_file(traffic_path)?.into_iter().map(Flow::try_from).collect::<Result<Vec<Flow>>>()?;
    log::info!("Traffic matrix '{}' loaded: {} flows.", traffic_path, flows.len());

    let config = match config_path {
        Some(path) => {
            let config = ControllerConfig::try_from(parse_json_file::<ControllerConfigDto>(path)?)?;
            log::info!("Controller configuration '{}' loaded.", path);
            config
        }
        None => ControllerConfig::default(),
    };

    Ok(ControllerInputs { topology, flows, config })
}
