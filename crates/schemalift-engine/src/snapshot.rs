//! Snapshot directory layout
//!
//! `<root>/<DEV_DB>.<DEV_SCHEMA>/<run id>/` holds `_manifest.txt` and one
//! `<TABLE>.sql` per captured table.

use schemalift_core::{Namespace, RunId, TableName};
use std::io;
use std::path::{Path, PathBuf};

/// Directory for one run's snapshots
pub fn snapshot_dir(root: &Path, source: &Namespace, run_id: &RunId) -> PathBuf {
    root.join(source.to_string()).join(run_id.as_str())
}

/// Create `dir` and its parents
///
/// A directory that already exists, including one created concurrently by
/// another process, is not an error.
pub fn prepare_dir(dir: &Path) -> io::Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// File name for a table's captured definition
pub fn definition_file_name(table: &TableName) -> String {
    let stem: String = table
        .as_str()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{}.sql", stem)
}

/// Write a definition, trimmed and newline-terminated, replacing any earlier file
pub fn write_definition(dir: &Path, table: &TableName, definition: &str) -> io::Result<PathBuf> {
    let path = dir.join(definition_file_name(table));
    std::fs::write(&path, format!("{}\n", definition.trim()))?;
    Ok(path)
}
