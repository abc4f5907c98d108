//! Connector, connection and cursor traits

use schemalift_core::{ConnectionConfig, Statement};
use std::collections::VecDeque;

/// One result row; `None` marks a SQL NULL
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row(pub Vec<Option<String>>);

impl Row {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self(values)
    }

    /// Row holding a single text value
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![Some(value.into())])
    }

    /// Value of the column at `index`, if present and not NULL
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result rows of one executed statement, consumed front to back
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rows {
    rows: VecDeque<Row>,
}

impl Rows {
    /// Result of a statement that returns nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }

    /// Take the next row
    pub fn fetch_one(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Rows not yet fetched
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

/// Errors raised by warehouse sessions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session already closed")]
    Closed,
}

/// Opens warehouse connections
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Get the adapter name (e.g., "Snowflake")
    fn name(&self) -> &'static str;

    /// Establish a session with the given credentials
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, CatalogError>;
}

/// An open warehouse session
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Open a cursor for executing statements
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>, CatalogError>;

    /// End the session. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), CatalogError>;
}

/// Executes statements over a connection
#[async_trait::async_trait]
pub trait Cursor: Send {
    /// Execute a statement, binding its parameters
    async fn execute(&mut self, statement: &Statement) -> Result<Rows, CatalogError>;

    /// Release the cursor. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), CatalogError>;
}
