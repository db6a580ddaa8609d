use std::fs::File;
use std::io::Write;

use serde::Serialize;

use crate::domain::utils::id::{FlowId, SubflowId};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A subflow handed its traffic to its backup.
    Failover,
    /// A failed-over subflow was put back in service.
    Recovery,
    /// A forwarding backup returned to standby because its ancestor recovered.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailoverEvent {
    pub timestamp_ms: i64,
    pub subflow_id: SubflowId,
    pub flow_id: FlowId,
    pub event: EventKind,
}

/// Semicolon separated record of every state transition of the monitor.
pub struct EventLog {
    writer: csv::Writer<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").finish_non_exhaustive()
    }
}

impl EventLog {
    pub fn create(file_path: &str) -> Result<Self> {
        let file = File::create(file_path)?;
        log::info!("Writing failover events to {}.", file_path);
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        EventLog { writer: csv::WriterBuilder::new().delimiter(b';').from_writer(writer) }
    }

    /// Appends and flushes one event. A failed write is logged and otherwise ignored.
    pub fn record(&mut self, event: FailoverEvent) {
        let result = self.writer.serialize(&event).and_then(|_| self.writer.flush().map_err(csv::Error::from));
        if let Err(e) = result {
            log::warn!("Could not record {:?} event of subflow {}: {}", event.event, event.subflow_id, e);
        }
    }
}
