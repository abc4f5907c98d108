//! Snapshot-and-migrate sequencer
//!
//! One run walks these phases in order:
//!
//! `Start → ConfigResolved → TablesLoaded → SnapshotDirReady → ManifestWritten
//! → Connected → Snapshotting → Migrating → Done`
//!
//! Any phase can end in `Failed`. Once connected, the cursor and the
//! connection are closed on every exit path before the error surfaces.
//! Nothing is rolled back: snapshot files and PROD objects created before a
//! failure stay in place, and a retried run re-applies the idempotent DDL.

use crate::error::LiftError;
use crate::events::{EventSink, RunEvent};
use crate::snapshot;
use schemalift_catalog::{CatalogError, Connection, Connector, Cursor};
use schemalift_core::{
    read_table_list, ConnectionConfig, LiftConfig, RunId, RunPhase, RunReport, SnapshotManifest,
    Statement, TableName,
};
use std::path::{Path, PathBuf};

/// Runs one snapshot-and-migrate pass
pub struct Sequencer<'a> {
    config: &'a LiftConfig,
    connector: &'a dyn Connector,
    run_id: RunId,
}

impl<'a> Sequencer<'a> {
    /// Create a sequencer whose run id is the current UTC second
    pub fn new(config: &'a LiftConfig, connector: &'a dyn Connector) -> Self {
        Self {
            config,
            connector,
            run_id: RunId::now(),
        }
    }

    /// Use a fixed run id
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Statements a run would execute for `tables`, in order
    pub fn plan(&self, tables: &[TableName]) -> Vec<Statement> {
        let mut statements = Vec::with_capacity(tables.len() * 2 + 1);

        if self.config.snapshot_enabled {
            statements.extend(tables.iter().map(|t| Statement::get_ddl(self.config.source.table(t))));
        }

        statements.push(Statement::ensure_schema(&self.config.target));
        statements.extend(tables.iter().map(|t| {
            Statement::ensure_table_like(self.config.target.table(t), self.config.source.table(t))
        }));

        statements
    }

    /// Execute the run
    pub async fn run(
        &self,
        credentials: &ConnectionConfig,
        sink: &mut dyn EventSink,
    ) -> Result<RunReport, LiftError> {
        let result = self.execute(credentials, sink).await;

        match &result {
            Ok(report) => tracing::info!(
                run_id = %self.run_id,
                statements = report.statements.len(),
                files = report.snapshot_files.len(),
                "run finished"
            ),
            Err(e) => {
                tracing::error!(run_id = %self.run_id, error = %e, "run failed");
                sink.on_event(&RunEvent::Phase(RunPhase::Failed));
            }
        }

        result
    }

    async fn execute(
        &self,
        credentials: &ConnectionConfig,
        sink: &mut dyn EventSink,
    ) -> Result<RunReport, LiftError> {
        enter(sink, None, RunPhase::ConfigResolved);

        let tables = read_table_list(&self.config.tables_file)?;
        tracing::debug!(count = tables.len(), file = %self.config.tables_file.display(), "tables loaded");

        let mut report = RunReport::new(
            self.run_id.clone(),
            self.config.source.clone(),
            self.config.target.clone(),
            tables.clone(),
        );
        enter(sink, Some(&mut report), RunPhase::TablesLoaded);

        let snapshot_dir = if self.config.snapshot_enabled {
            Some(self.prepare_snapshot(&tables, &mut report, sink)?)
        } else {
            None
        };

        let connection = self
            .connector
            .connect(credentials)
            .await
            .map_err(LiftError::Connection)?;
        enter(sink, Some(&mut report), RunPhase::Connected);

        self.in_session(connection, &tables, snapshot_dir.as_deref(), &mut report, sink)
            .await?;

        enter(sink, Some(&mut report), RunPhase::Done);
        Ok(report)
    }

    /// Create the snapshot directory and write the manifest
    fn prepare_snapshot(
        &self,
        tables: &[TableName],
        report: &mut RunReport,
        sink: &mut dyn EventSink,
    ) -> Result<PathBuf, LiftError> {
        let dir = snapshot::snapshot_dir(&self.config.snapshot_root, &self.config.source, &self.run_id);
        snapshot::prepare_dir(&dir).map_err(|source| LiftError::Snapshot {
            path: dir.clone(),
            source,
        })?;
        report.snapshot_dir = Some(dir.clone());
        enter(sink, Some(&mut *report), RunPhase::SnapshotDirReady);
        sink.on_event(&RunEvent::SnapshotDirReady(dir.clone()));

        let manifest = SnapshotManifest::new(
            self.run_id.clone(),
            self.config.source.clone(),
            tables.to_vec(),
        );
        let path = manifest.write_to(&dir).map_err(|source| LiftError::Snapshot {
            path: dir.join(schemalift_core::MANIFEST_FILE_NAME),
            source,
        })?;
        file_written(sink, report, path);
        enter(sink, Some(&mut *report), RunPhase::ManifestWritten);

        Ok(dir)
    }

    /// Open a cursor, do the work, and release cursor and connection
    /// regardless of how the work ended
    async fn in_session(
        &self,
        mut connection: Box<dyn Connection>,
        tables: &[TableName],
        snapshot_dir: Option<&Path>,
        report: &mut RunReport,
        sink: &mut dyn EventSink,
    ) -> Result<(), LiftError> {
        let outcome = match connection.cursor().await {
            Ok(mut cursor) => {
                let work = self
                    .snapshot_and_migrate(cursor.as_mut(), tables, snapshot_dir, report, sink)
                    .await;
                let released = cursor.close().await;
                settle(work, released)
            }
            Err(e) => Err(LiftError::Connection(e)),
        };

        let closed = connection.close().await;
        settle(outcome, closed)
    }

    async fn snapshot_and_migrate(
        &self,
        cursor: &mut dyn Cursor,
        tables: &[TableName],
        snapshot_dir: Option<&Path>,
        report: &mut RunReport,
        sink: &mut dyn EventSink,
    ) -> Result<(), LiftError> {
        if let Some(dir) = snapshot_dir {
            enter(sink, Some(&mut *report), RunPhase::Snapshotting);

            for table in tables {
                let source = self.config.source.table(table);
                let statement = Statement::get_ddl(source.clone());

                let definition = fetch_definition(cursor, &statement)
                    .await
                    .map_err(|e| LiftError::DefinitionRetrieval {
                        table: source.to_string(),
                        source: e,
                    })?;
                statement_executed(sink, report, &statement);

                let path = snapshot::write_definition(dir, table, &definition).map_err(|e| {
                    LiftError::Snapshot {
                        path: dir.join(snapshot::definition_file_name(table)),
                        source: e,
                    }
                })?;
                file_written(sink, report, path);
            }
        }

        enter(sink, Some(&mut *report), RunPhase::Migrating);

        let ensure_schema = Statement::ensure_schema(&self.config.target);
        execute_ddl(cursor, &ensure_schema).await?;
        statement_executed(sink, report, &ensure_schema);

        for table in tables {
            let statement = Statement::ensure_table_like(
                self.config.target.table(table),
                self.config.source.table(table),
            );
            execute_ddl(cursor, &statement).await?;
            statement_executed(sink, report, &statement);
        }

        Ok(())
    }
}

/// Connect, run `SELECT 1`, and release the session
pub async fn check_connection(
    connector: &dyn Connector,
    credentials: &ConnectionConfig,
) -> Result<(), LiftError> {
    let mut connection = connector
        .connect(credentials)
        .await
        .map_err(LiftError::Connection)?;

    let outcome = match connection.cursor().await {
        Ok(mut cursor) => {
            let ping = cursor
                .execute(&Statement::Ping)
                .await
                .map(|_| ())
                .map_err(LiftError::Connection);
            let released = cursor.close().await;
            settle(ping, released)
        }
        Err(e) => Err(LiftError::Connection(e)),
    };

    let closed = connection.close().await;
    settle(outcome, closed)
}

async fn fetch_definition(cursor: &mut dyn Cursor, statement: &Statement) -> Result<String, CatalogError> {
    let mut rows = cursor.execute(statement).await?;
    let row = rows
        .fetch_one()
        .ok_or_else(|| CatalogError::InvalidResponse("GET_DDL returned no rows".to_string()))?;

    row.get(0)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::InvalidResponse("GET_DDL returned NULL".to_string()))
}

async fn execute_ddl(cursor: &mut dyn Cursor, statement: &Statement) -> Result<(), LiftError> {
    cursor
        .execute(statement)
        .await
        .map(|_| ())
        .map_err(|source| LiftError::DdlExecution {
            statement: statement.to_string(),
            source,
        })
}

/// Combine the outcome of some work with the outcome of releasing a resource.
/// The work's error wins; a release error only surfaces when the work succeeded.
fn settle(work: Result<(), LiftError>, released: Result<(), CatalogError>) -> Result<(), LiftError> {
    match (work, released) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(e)) => Err(LiftError::Release(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release)) => {
            tracing::warn!(error = %release, "failed to release warehouse session after error");
            Err(e)
        }
    }
}

fn enter(sink: &mut dyn EventSink, report: Option<&mut RunReport>, phase: RunPhase) {
    tracing::debug!(%phase, "entering phase");
    if let Some(report) = report {
        report.phase = phase;
    }
    sink.on_event(&RunEvent::Phase(phase));
}

fn statement_executed(sink: &mut dyn EventSink, report: &mut RunReport, statement: &Statement) {
    let sql = statement.to_string();
    tracing::info!(%sql, "executed");
    sink.on_event(&RunEvent::StatementExecuted(sql.clone()));
    report.statements.push(sql);
}

fn file_written(sink: &mut dyn EventSink, report: &mut RunReport, path: PathBuf) {
    tracing::info!(path = %path.display(), "wrote");
    sink.on_event(&RunEvent::FileWritten(path.clone()));
    report.snapshot_files.push(path);
}
