pub mod reservation_table;
pub mod subflow;
