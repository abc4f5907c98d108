//! SchemaLift Core
//!
//! Domain model shared by the catalog adapters, the sequencer and the CLI:
//! identifiers, configuration, the table list reader, run ids, snapshot
//! manifests, DDL statements and the run report.

pub mod identifier;
pub mod tables;
pub mod config;
pub mod run;
pub mod manifest;
pub mod statement;
pub mod report;

pub use identifier::{TableName, Namespace, QualifiedTable, InvalidIdentifier};
pub use tables::{parse_table_list, read_table_list};
pub use config::{Config, ConfigError, ConnectionConfig, LiftConfig, EnvLookup};
pub use run::{RunId, RunPhase};
pub use manifest::{SnapshotManifest, MANIFEST_FILE_NAME};
pub use statement::Statement;
pub use report::{RunReport, ReportVersion};
