//! Mock warehouse for testing
//!
//! An in-memory warehouse that interprets [`Statement`]s directly. It's useful for:
//! - Unit testing the sequencer without credentials
//! - Verifying resource release (connect/close counters)
//! - Simulating failures for specific tables or statements
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemalift_catalog::{MockConnector, Connector};
//!
//! let connector = MockConnector::new();
//! connector.add_table(&dev.table(&orders), "create or replace TABLE ORDERS (ID NUMBER);").await;
//!
//! let mut connection = connector.connect(&config).await?;
//! // ...
//! assert_eq!(connector.connect_calls().await, 1);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Connection failure
//! let connector = MockConnector::new().with_connection_failure();
//!
//! // GET_DDL failure for one table
//! connector.fail_definition(&dev.table(&customers), CatalogError::PermissionDenied("no".into())).await;
//! ```

use crate::adapter::{CatalogError, Connection, Connector, Cursor, Row, Rows};
use schemalift_core::{ConnectionConfig, Namespace, QualifiedTable, Statement};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state of the mock warehouse
#[derive(Debug, Default)]
struct MockState {
    /// Existing schemas, keyed by `DB.SCHEMA`
    schemas: HashSet<String>,

    /// Existing tables and their definitions, keyed by FQN
    tables: HashMap<String, String>,

    /// Errors returned by GET_DDL for specific tables
    definition_errors: HashMap<String, CatalogError>,

    /// Errors returned for specific statements
    statement_errors: Vec<(Statement, CatalogError)>,

    /// Every statement passed to `execute`, in order
    executed: Vec<Statement>,

    connect_calls: usize,
    connection_closes: usize,
    cursor_closes: usize,
}

impl MockState {
    fn apply(&mut self, statement: &Statement) -> Result<Rows, CatalogError> {
        if let Some((_, error)) = self.statement_errors.iter().find(|(s, _)| s == statement) {
            return Err(error.clone());
        }

        match statement {
            Statement::Ping => Ok(Rows::from_rows(vec![Row::single("1")])),

            Statement::GetDdl { table } => {
                if let Some(error) = self.definition_errors.get(&table.fqn()) {
                    return Err(error.clone());
                }
                self.tables
                    .get(&table.fqn())
                    .map(|ddl| Rows::from_rows(vec![Row::single(ddl.clone())]))
                    .ok_or_else(|| CatalogError::ObjectNotFound(table.fqn()))
            }

            Statement::CreateSchema { namespace, if_not_exists } => {
                let key = namespace.to_sql();
                if self.schemas.contains(&key) {
                    if *if_not_exists {
                        return Ok(Rows::empty());
                    }
                    return Err(CatalogError::AlreadyExists(key));
                }
                self.schemas.insert(key);
                Ok(Rows::empty())
            }

            Statement::CreateTableLike { target, source, if_not_exists } => {
                if !self.schemas.contains(&target.namespace.to_sql()) {
                    return Err(CatalogError::ObjectNotFound(target.namespace.to_sql()));
                }
                if self.tables.contains_key(&target.fqn()) {
                    if *if_not_exists {
                        return Ok(Rows::empty());
                    }
                    return Err(CatalogError::AlreadyExists(target.fqn()));
                }
                let definition = self
                    .tables
                    .get(&source.fqn())
                    .cloned()
                    .ok_or_else(|| CatalogError::ObjectNotFound(source.fqn()))?;
                self.tables.insert(target.fqn(), definition);
                Ok(Rows::empty())
            }
        }
    }
}

/// Mock connector backed by an in-memory warehouse
///
/// Clones share the same warehouse state, so a test can keep one handle for
/// inspection while the sequencer uses another.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<RwLock<MockState>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Name to return from name() method
    adapter_name: &'static str,
}

impl MockConnector {
    /// Create an empty mock warehouse
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            fail_connection: false,
            adapter_name: "Mock",
        }
    }

    /// Add an existing table (and its schema) with the given definition
    pub async fn add_table(&self, table: &QualifiedTable, definition: impl Into<String>) {
        let mut state = self.state.write().await;
        state.schemas.insert(table.namespace.to_sql());
        state.tables.insert(table.fqn(), definition.into());
    }

    /// Add an existing, empty schema
    pub async fn add_schema(&self, namespace: &Namespace) {
        self.state.write().await.schemas.insert(namespace.to_sql());
    }

    /// Make GET_DDL fail for a specific table
    pub async fn fail_definition(&self, table: &QualifiedTable, error: CatalogError) {
        self.state.write().await.definition_errors.insert(table.fqn(), error);
    }

    /// Make a specific statement fail
    pub async fn fail_statement(&self, statement: Statement, error: CatalogError) {
        self.state.write().await.statement_errors.push((statement, error));
    }

    /// Configure to fail all connection attempts
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Set a custom adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Number of `connect` calls, including failed ones
    pub async fn connect_calls(&self) -> usize {
        self.state.read().await.connect_calls
    }

    /// Number of `Connection::close` calls
    pub async fn connection_closes(&self) -> usize {
        self.state.read().await.connection_closes
    }

    /// Number of `Cursor::close` calls
    pub async fn cursor_closes(&self) -> usize {
        self.state.read().await.cursor_closes
    }

    /// Statements passed to `execute`, including failed ones
    pub async fn executed(&self) -> Vec<Statement> {
        self.state.read().await.executed.clone()
    }

    /// Check if a table exists
    pub async fn has_table(&self, table: &QualifiedTable) -> bool {
        self.state.read().await.tables.contains_key(&table.fqn())
    }

    /// Check if a schema exists
    pub async fn has_schema(&self, namespace: &Namespace) -> bool {
        self.state.read().await.schemas.contains(&namespace.to_sql())
    }

    /// Get the number of tables stored in the warehouse
    pub async fn table_count(&self) -> usize {
        self.state.read().await.tables.len()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    fn name(&self) -> &'static str {
        self.adapter_name
    }

    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Connection>, CatalogError> {
        self.state.write().await.connect_calls += 1;

        if self.fail_connection {
            return Err(CatalogError::ConnectionError(
                "Simulated connection failure".to_string(),
            ));
        }

        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

/// Session on the mock warehouse
pub struct MockConnection {
    state: Arc<RwLock<MockState>>,
    closed: bool,
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>, CatalogError> {
        if self.closed {
            return Err(CatalogError::Closed);
        }

        Ok(Box::new(MockCursor {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }

    async fn close(&mut self) -> Result<(), CatalogError> {
        self.state.write().await.connection_closes += 1;
        self.closed = true;
        Ok(())
    }
}

/// Cursor on the mock warehouse
pub struct MockCursor {
    state: Arc<RwLock<MockState>>,
    closed: bool,
}

#[async_trait::async_trait]
impl Cursor for MockCursor {
    async fn execute(&mut self, statement: &Statement) -> Result<Rows, CatalogError> {
        if self.closed {
            return Err(CatalogError::Closed);
        }

        let mut state = self.state.write().await;
        state.executed.push(statement.clone());
        state.apply(statement)
    }

    async fn close(&mut self) -> Result<(), CatalogError> {
        self.state.write().await.cursor_closes += 1;
        self.closed = true;
        Ok(())
    }
}

/// Builder for creating a MockConnector with existing tables
///
/// # Example
///
/// ```rust,ignore
/// let connector = MockConnectorBuilder::new()
///     .with_table("dev_db", "public", "orders", "create or replace TABLE ORDERS (ID NUMBER);")
///     .with_table("dev_db", "public", "customers", "create or replace TABLE CUSTOMERS (ID NUMBER);")
///     .build();
/// ```
pub struct MockConnectorBuilder {
    state: MockState,
    fail_connection: bool,
    adapter_name: &'static str,
}

impl MockConnectorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            state: MockState::default(),
            fail_connection: false,
            adapter_name: "Mock",
        }
    }

    /// Add an existing table
    pub fn with_table(mut self, database: &str, schema: &str, table: &str, definition: &str) -> Self {
        let namespace = Namespace::new(database, schema);
        let fqn = match schemalift_core::TableName::new(table) {
            Ok(name) => namespace.table(&name).fqn(),
            Err(_) => return self,
        };
        self.state.schemas.insert(namespace.to_sql());
        self.state.tables.insert(fqn, definition.to_string());
        self
    }

    /// Add an existing schema
    pub fn with_schema(mut self, database: &str, schema: &str) -> Self {
        self.state.schemas.insert(Namespace::new(database, schema).to_sql());
        self
    }

    /// Make GET_DDL fail for a table
    pub fn with_definition_error(mut self, table: &QualifiedTable, error: CatalogError) -> Self {
        self.state.definition_errors.insert(table.fqn(), error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Set adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Build the MockConnector
    pub fn build(self) -> MockConnector {
        MockConnector {
            state: Arc::new(RwLock::new(self.state)),
            fail_connection: self.fail_connection,
            adapter_name: self.adapter_name,
        }
    }
}

impl Default for MockConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
