pub mod bootstrap;
pub mod fabric;
pub mod programming;
pub mod switch_control;
pub mod switch_mock;
