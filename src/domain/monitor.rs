pub mod device_guard;
pub mod event_log;
pub mod failure_monitor;
