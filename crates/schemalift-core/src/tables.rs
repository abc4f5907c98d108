//! Table list reader
//!
//! The table list is a UTF-8 text file of table names separated by commas
//! and/or newlines. Order is preserved and duplicates are kept.

use crate::config::ConfigError;
use crate::identifier::TableName;
use std::path::Path;

/// Parse table names out of delimited text
pub fn parse_table_list(text: &str) -> Vec<TableName> {
    text.split(|c| c == ',' || c == '\n' || c == '\r')
        .filter_map(|token| TableName::new(token).ok())
        .collect()
}

/// Read and parse a table list file
pub fn read_table_list(path: &Path) -> Result<Vec<TableName>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::TablesFileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    Ok(parse_table_list(&contents))
}
