pub mod controller_dto;
pub mod topology_dto;
pub mod traffic_dto;
