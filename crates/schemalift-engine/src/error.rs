//! Run errors

use schemalift_catalog::CatalogError;
use schemalift_core::ConfigError;
use std::path::PathBuf;

/// Exit status for configuration and missing-file errors
pub const EXIT_CONFIG: i32 = 2;

/// Exit status for every other failure
pub const EXIT_FAILURE: i32 = 1;

/// Errors that abort a run
///
/// None of these are retried. Any warehouse session opened by the run has
/// already been released by the time one of these reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum LiftError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Failed to connect to warehouse: {0}")]
    Connection(CatalogError),

    #[error("Failed to retrieve definition of {table}: {source}")]
    DefinitionRetrieval {
        table: String,
        source: CatalogError,
    },

    #[error("Failed to execute `{statement}`: {source}")]
    DdlExecution {
        statement: String,
        source: CatalogError,
    },

    #[error("Failed to write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to release warehouse session: {0}")]
    Release(CatalogError),
}

impl LiftError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LiftError::Configuration(_) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}
