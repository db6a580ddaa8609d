pub mod backup_planner;
pub mod network_state;
pub mod reservation_engine;
