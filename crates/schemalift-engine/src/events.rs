//! Run events
//!
//! The sequencer reports progress through an [`EventSink`]. The CLI prints
//! each event as a status line; tests collect them into a `Vec`.

use schemalift_core::RunPhase;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run entered a new phase
    Phase(RunPhase),

    /// The snapshot directory exists
    SnapshotDirReady(PathBuf),

    /// A manifest or snapshot file was written
    FileWritten(PathBuf),

    /// A statement was executed successfully
    StatementExecuted(String),
}

/// Receives run events as they happen
pub trait EventSink {
    fn on_event(&mut self, event: &RunEvent);
}

impl EventSink for Vec<RunEvent> {
    fn on_event(&mut self, event: &RunEvent) {
        self.push(event.clone());
    }
}

/// Discards every event
impl EventSink for () {
    fn on_event(&mut self, _event: &RunEvent) {}
}
