pub mod capacity;
pub mod clock;
pub mod control_plane;
pub mod device;
pub mod flow;
pub mod monitor;
pub mod planning;
pub mod reservation;
pub mod routing;
pub mod topology;
pub mod utils;
