//! Run report (stable v1)
//!
//! Structured record of what a run did. Saved as JSON on request; the human
//! readable status lines are printed independently of it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::identifier::{Namespace, TableName};
use crate::run::{RunId, RunPhase};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Run report (run-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601) at which the report was created
    pub timestamp: String,

    pub run_id: RunId,

    /// DEV namespace
    pub source: Namespace,

    /// PROD namespace
    pub target: Namespace,

    /// Tables in reader order
    pub tables: Vec<TableName>,

    /// Snapshot directory, if snapshots were taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,

    /// Files written during the run, manifest first
    pub snapshot_files: Vec<PathBuf>,

    /// SQL executed against the warehouse, in order
    pub statements: Vec<String>,

    /// Last phase reached
    pub phase: RunPhase,
}

impl RunReport {
    pub fn new(run_id: RunId, source: Namespace, target: Namespace, tables: Vec<TableName>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_id,
            source,
            target,
            tables,
            snapshot_dir: None,
            snapshot_files: Vec::new(),
            statements: Vec::new(),
            phase: RunPhase::Start,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == RunPhase::Done
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
