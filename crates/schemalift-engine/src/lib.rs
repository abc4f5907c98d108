//! SchemaLift engine - snapshot and migrate sequencing
//!
//! This crate implements the run itself:
//! - Snapshot directory and file layout
//! - The snapshot-and-migrate sequencer
//! - Run events for status reporting
//! - The run error taxonomy

pub mod error;
pub mod events;
pub mod snapshot;
pub mod sequencer;

pub use error::LiftError;
pub use events::{EventSink, RunEvent};
pub use sequencer::{Sequencer, check_connection};
