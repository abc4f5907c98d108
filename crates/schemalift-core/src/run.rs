//! Run identity and lifecycle phases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of run ids: UTC, second resolution
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identifies one run by its UTC start time (`YYYYMMDD_HHMMSS`)
///
/// Computed once at the start of a run and passed to every step, so the
/// manifest and the snapshot files always agree on the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Run id for the current instant
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(RUN_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Start,
    ConfigResolved,
    TablesLoaded,
    SnapshotDirReady,
    ManifestWritten,
    Connected,
    Snapshotting,
    Migrating,
    Done,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Start => "start",
            RunPhase::ConfigResolved => "config_resolved",
            RunPhase::TablesLoaded => "tables_loaded",
            RunPhase::SnapshotDirReady => "snapshot_dir_ready",
            RunPhase::ManifestWritten => "manifest_written",
            RunPhase::Connected => "connected",
            RunPhase::Snapshotting => "snapshotting",
            RunPhase::Migrating => "migrating",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        }
    }

    /// Whether the run can no longer change phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
