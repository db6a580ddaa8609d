use thiserror::Error;

use crate::domain::device::switch_control::DeviceError;
use crate::domain::utils::id::NodeId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to read traffic matrix: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Invalid topology: {0}")]
    TopologyError(String),

    #[error("Link {from} -> {to} is not tracked by the capacity ledger")]
    UnknownLink { from: NodeId, to: NodeId },

    #[error("No switch controller registered for device {0}")]
    UnknownDevice(NodeId),

    #[error("Subflow {0} does not exist in the reservation table")]
    UnknownSubflow(u64),

    #[error("Invalid reservation: {0}")]
    InvalidReservation(String),

    #[error("Device {device} failed: {source}")]
    Device {
        device: NodeId,
        #[source]
        source: DeviceError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
