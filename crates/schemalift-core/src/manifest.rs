//! Snapshot manifest (`_manifest.txt`)
//!
//! One manifest is written per snapshot run and never read back. It records
//! when the run happened, which namespace was captured, and which tables were
//! requested, in reader order and including duplicates.

use crate::identifier::{Namespace, TableName};
use crate::run::RunId;
use std::path::{Path, PathBuf};

/// File name of the manifest inside a snapshot directory
pub const MANIFEST_FILE_NAME: &str = "_manifest.txt";

const MANIFEST_HEADER: &str = "# schemalift snapshot manifest";

/// Record of one snapshot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotManifest {
    pub run_id: RunId,
    pub source: Namespace,
    pub tables: Vec<TableName>,
}

impl SnapshotManifest {
    pub fn new(run_id: RunId, source: Namespace, tables: Vec<TableName>) -> Self {
        Self { run_id, source, tables }
    }

    /// Render the plain-text manifest
    pub fn render(&self) -> String {
        let tables = self
            .tables
            .iter()
            .map(TableName::as_str)
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{}\ntimestamp_utc: {}\nsource: {}\ntables: {}\n",
            MANIFEST_HEADER, self.run_id, self.source, tables
        )
    }

    /// Write the manifest into `dir` in a single write, replacing any existing one
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE_NAME);
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}
