//! End-to-end sequencer tests against the mock warehouse
//!
//! These run the full snapshot-and-migrate pass on a temporary directory and
//! check the files written, the statements executed, and that the warehouse
//! session is released on every exit path.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use schemalift_catalog::{CatalogError, MockConnector};
use schemalift_core::{
    ConfigError, ConnectionConfig, LiftConfig, Namespace, QualifiedTable, RunId, RunPhase,
    Statement, TableName,
};
use schemalift_engine::{check_connection, LiftError, RunEvent, Sequencer};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn credentials() -> ConnectionConfig {
    ConnectionConfig {
        user: "loader".to_string(),
        password: "secret".to_string(),
        account: "xy12345".to_string(),
        warehouse: "COMPUTE_WH".to_string(),
        role: "PUBLIC".to_string(),
    }
}

fn dev() -> Namespace {
    Namespace::new("dev_db", "public")
}

fn prod() -> Namespace {
    Namespace::new("prod_db", "public")
}

fn table(ns: &Namespace, name: &str) -> QualifiedTable {
    ns.table(&TableName::new(name).unwrap())
}

fn definition(name: &str) -> String {
    format!("\n  create or replace TABLE {} (\n\tID NUMBER(38,0)\n);\n\n", name.to_uppercase())
}

fn run_id() -> RunId {
    RunId::from_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap())
}

/// Temp workspace with a table list and a lift config pointing into it
struct Workspace {
    _dir: TempDir,
    config: LiftConfig,
}

impl Workspace {
    fn new(tables_csv: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tables_file = dir.path().join("tables.csv");
        if let Some(contents) = tables_csv {
            std::fs::write(&tables_file, contents).unwrap();
        }

        let config = LiftConfig {
            source: dev(),
            target: prod(),
            tables_file,
            snapshot_enabled: true,
            snapshot_root: dir.path().join("schema_snapshots"),
        };

        Self { _dir: dir, config }
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.config
            .snapshot_root
            .join("DEV_DB.PUBLIC")
            .join("20240601_123000")
    }
}

/// Mock warehouse holding the given DEV tables
async fn warehouse(tables: &[&str]) -> MockConnector {
    let connector = MockConnector::new();
    for name in tables {
        connector.add_table(&table(&dev(), name), definition(name)).await;
    }
    connector
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Successful runs
// =============================================================================

#[tokio::test]
async fn test_full_run() {
    let ws = Workspace::new(Some("orders, customers\ninventory"));
    let connector = warehouse(&["orders", "customers", "inventory"]).await;
    let mut events: Vec<RunEvent> = Vec::new();

    let report = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut events)
        .await
        .unwrap();

    assert!(report.is_done());
    assert_eq!(report.snapshot_dir, Some(ws.snapshot_dir()));
    assert_eq!(
        report.statements,
        vec![
            "SELECT GET_DDL('TABLE', 'DEV_DB.PUBLIC.ORDERS')",
            "SELECT GET_DDL('TABLE', 'DEV_DB.PUBLIC.CUSTOMERS')",
            "SELECT GET_DDL('TABLE', 'DEV_DB.PUBLIC.INVENTORY')",
            "CREATE SCHEMA IF NOT EXISTS PROD_DB.PUBLIC",
            "CREATE TABLE IF NOT EXISTS PROD_DB.PUBLIC.ORDERS LIKE DEV_DB.PUBLIC.ORDERS",
            "CREATE TABLE IF NOT EXISTS PROD_DB.PUBLIC.CUSTOMERS LIKE DEV_DB.PUBLIC.CUSTOMERS",
            "CREATE TABLE IF NOT EXISTS PROD_DB.PUBLIC.INVENTORY LIKE DEV_DB.PUBLIC.INVENTORY",
        ]
    );

    assert_eq!(
        file_names(&ws.snapshot_dir()),
        vec!["CUSTOMERS.sql", "INVENTORY.sql", "ORDERS.sql", "_manifest.txt"]
    );

    for name in ["orders", "customers", "inventory"] {
        assert!(connector.has_table(&table(&prod(), name)).await);
    }

    assert_eq!(connector.connect_calls().await, 1);
    assert_eq!(connector.cursor_closes().await, 1);
    assert_eq!(connector.connection_closes().await, 1);

    let phases: Vec<RunPhase> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Phase(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            RunPhase::ConfigResolved,
            RunPhase::TablesLoaded,
            RunPhase::SnapshotDirReady,
            RunPhase::ManifestWritten,
            RunPhase::Connected,
            RunPhase::Snapshotting,
            RunPhase::Migrating,
            RunPhase::Done,
        ]
    );
}

#[tokio::test]
async fn test_snapshot_file_for_orders() {
    let ws = Workspace::new(Some("orders"));
    let connector = warehouse(&["orders"]).await;

    Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap();

    let dir = ws.snapshot_dir();
    assert_eq!(file_names(&dir), vec!["ORDERS.sql", "_manifest.txt"]);
    assert_eq!(
        std::fs::read_to_string(dir.join("ORDERS.sql")).unwrap(),
        "create or replace TABLE ORDERS (\n\tID NUMBER(38,0)\n);\n"
    );
}

#[tokio::test]
async fn test_manifest_keeps_duplicates_in_order() {
    let ws = Workspace::new(Some("customers\norders,customers\n\n ORDERS "));
    let connector = warehouse(&["orders", "customers"]).await;

    let report = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap();

    let manifest = std::fs::read_to_string(ws.snapshot_dir().join("_manifest.txt")).unwrap();
    assert_eq!(
        manifest,
        "# schemalift snapshot manifest\n\
         timestamp_utc: 20240601_123000\n\
         source: DEV_DB.PUBLIC\n\
         tables: CUSTOMERS,ORDERS,CUSTOMERS,ORDERS\n"
    );
    assert_eq!(report.tables.len(), 4);
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let ws = Workspace::new(Some("orders,customers"));
    let connector = warehouse(&["orders", "customers"]).await;

    for _ in 0..2 {
        Sequencer::new(&ws.config, &connector)
            .with_run_id(run_id())
            .run(&credentials(), &mut ())
            .await
            .unwrap();
    }

    assert!(connector.has_schema(&prod()).await);
    assert_eq!(connector.table_count().await, 4);
    assert_eq!(connector.connection_closes().await, 2);
}

#[tokio::test]
async fn test_existing_prod_table_left_alone() {
    let ws = Workspace::new(Some("orders"));
    let connector = warehouse(&["orders"]).await;
    connector.add_table(&table(&prod(), "orders"), "create TABLE ORDERS (LEGACY VARCHAR);").await;

    let mut config = ws.config.clone();
    config.snapshot_enabled = false;

    Sequencer::new(&config, &connector)
        .run(&credentials(), &mut ())
        .await
        .unwrap();

    assert!(connector.has_table(&table(&prod(), "orders")).await);
    assert_eq!(connector.table_count().await, 2);
}

#[tokio::test]
async fn test_snapshot_disabled() {
    let ws = Workspace::new(Some("orders"));
    let connector = warehouse(&["orders"]).await;
    let mut config = ws.config.clone();
    config.snapshot_enabled = false;

    let report = Sequencer::new(&config, &connector)
        .run(&credentials(), &mut ())
        .await
        .unwrap();

    assert!(!config.snapshot_root.exists());
    assert!(report.snapshot_files.is_empty());
    assert!(connector
        .executed()
        .await
        .iter()
        .all(|s| !matches!(s, Statement::GetDdl { .. })));
}

#[tokio::test]
async fn test_empty_table_list_still_ensures_schema() {
    let ws = Workspace::new(Some(" \n,\n"));
    let connector = warehouse(&[]).await;

    let report = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap();

    assert_eq!(report.statements, vec!["CREATE SCHEMA IF NOT EXISTS PROD_DB.PUBLIC"]);
    assert_eq!(file_names(&ws.snapshot_dir()), vec!["_manifest.txt"]);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_tables_file_never_connects() {
    let ws = Workspace::new(None);
    let connector = warehouse(&["orders"]).await;
    let mut events: Vec<RunEvent> = Vec::new();

    let err = Sequencer::new(&ws.config, &connector)
        .run(&credentials(), &mut events)
        .await
        .unwrap_err();

    assert!(matches!(err, LiftError::Configuration(ConfigError::TablesFileNotFound(_))));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(connector.connect_calls().await, 0);
    assert!(!ws.config.snapshot_root.exists());
    assert_eq!(events.last(), Some(&RunEvent::Phase(RunPhase::Failed)));
}

#[tokio::test]
async fn test_definition_failure_on_second_table() {
    let ws = Workspace::new(Some("orders,customers,inventory"));
    let connector = warehouse(&["orders", "customers", "inventory"]).await;
    connector
        .fail_definition(
            &table(&dev(), "customers"),
            CatalogError::PermissionDenied("Insufficient privileges".to_string()),
        )
        .await;

    let err = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap_err();

    match &err {
        LiftError::DefinitionRetrieval { table, source } => {
            assert_eq!(table, "DEV_DB.PUBLIC.CUSTOMERS");
            assert!(matches!(source, CatalogError::PermissionDenied(_)));
        }
        other => panic!("Expected DefinitionRetrieval, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);

    let dir = ws.snapshot_dir();
    assert!(dir.join("ORDERS.sql").exists());
    assert!(!dir.join("CUSTOMERS.sql").exists());
    assert!(!dir.join("INVENTORY.sql").exists());

    assert_eq!(connector.cursor_closes().await, 1);
    assert_eq!(connector.connection_closes().await, 1);

    // Nothing was migrated
    assert!(!connector.has_schema(&prod()).await);
    assert_eq!(connector.executed().await.len(), 2);
}

#[tokio::test]
async fn test_ddl_failure_stops_migration() {
    let ws = Workspace::new(Some("orders,customers,inventory"));
    let connector = warehouse(&["orders", "customers", "inventory"]).await;
    let failing = Statement::ensure_table_like(table(&prod(), "customers"), table(&dev(), "customers"));
    connector
        .fail_statement(failing, CatalogError::QueryError("warehouse suspended".to_string()))
        .await;

    let err = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        LiftError::DdlExecution { statement, .. }
            if statement == "CREATE TABLE IF NOT EXISTS PROD_DB.PUBLIC.CUSTOMERS LIKE DEV_DB.PUBLIC.CUSTOMERS"
    ));

    // Created before the failure and left in place
    assert!(connector.has_table(&table(&prod(), "orders")).await);
    assert!(!connector.has_table(&table(&prod(), "inventory")).await);
    assert_eq!(file_names(&ws.snapshot_dir()).len(), 4);

    assert_eq!(connector.cursor_closes().await, 1);
    assert_eq!(connector.connection_closes().await, 1);
}

#[tokio::test]
async fn test_connection_failure_after_manifest() {
    let ws = Workspace::new(Some("orders"));
    let connector = MockConnector::new().with_connection_failure();

    let err = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap_err();

    assert!(matches!(err, LiftError::Connection(CatalogError::ConnectionError(_))));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(file_names(&ws.snapshot_dir()), vec!["_manifest.txt"]);
    assert_eq!(connector.connection_closes().await, 0);
}

#[tokio::test]
async fn test_missing_dev_table_is_definition_error() {
    let ws = Workspace::new(Some("ghost"));
    let connector = warehouse(&[]).await;

    let err = Sequencer::new(&ws.config, &connector)
        .with_run_id(run_id())
        .run(&credentials(), &mut ())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LiftError::DefinitionRetrieval { source: CatalogError::ObjectNotFound(_), .. }
    ));
    assert_eq!(connector.connection_closes().await, 1);
}

// =============================================================================
// Connection check
// =============================================================================

#[tokio::test]
async fn test_check_connection_releases_session() {
    let connector = MockConnector::new();

    check_connection(&connector, &credentials()).await.unwrap();

    assert_eq!(connector.executed().await, vec![Statement::Ping]);
    assert_eq!(connector.cursor_closes().await, 1);
    assert_eq!(connector.connection_closes().await, 1);
}

#[tokio::test]
async fn test_check_connection_failure() {
    let connector = MockConnector::new().with_connection_failure();

    let result = check_connection(&connector, &credentials()).await;
    assert!(matches!(result, Err(LiftError::Connection(_))));
}
