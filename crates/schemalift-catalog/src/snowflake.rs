//! Snowflake session adapter
//!
//! Opens a password-authenticated session through the `snowflake-api` crate
//! and executes statements over it. The session is verified with `SELECT 1`
//! when connecting, so bad credentials fail before any work is done.
//!
//! `snowflake-api` cannot bind parameters, so statements are sent with their
//! parameters inlined as escaped string literals.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connector = SnowflakeConnector::new();
//! let mut connection = connector.connect(&config).await?;
//! ```
//!
//! Reference: https://docs.snowflake.com/en/sql-reference/functions/get_ddl

use crate::adapter::{CatalogError, Connection, Connector};
use schemalift_core::ConnectionConfig;

#[cfg(feature = "snowflake")]
use crate::adapter::{Cursor, Row, Rows};

#[cfg(feature = "snowflake")]
use schemalift_core::Statement;

#[cfg(feature = "snowflake")]
use snowflake_api::{QueryResult, SnowflakeApi};

#[cfg(feature = "snowflake")]
use std::sync::Arc;

#[cfg(feature = "snowflake")]
use tokio::sync::Mutex;

#[cfg(feature = "snowflake")]
use arrow_array::cast::AsArray;

#[cfg(feature = "snowflake")]
use arrow_array::types::{Int16Type, Int32Type, Int64Type, Int8Type};

#[cfg(feature = "snowflake")]
use arrow_array::{Array, ArrayRef};

#[cfg(feature = "snowflake")]
use arrow_schema::DataType;

/// Connects to Snowflake with password authentication
#[derive(Debug, Clone)]
pub struct SnowflakeConnector {
    verify_on_connect: bool,
}

impl SnowflakeConnector {
    pub fn new() -> Self {
        Self { verify_on_connect: true }
    }

    /// Skip the `SELECT 1` round trip on connect. Authentication errors then
    /// surface on the first executed statement.
    pub fn without_verification(mut self) -> Self {
        self.verify_on_connect = false;
        self
    }
}

impl Default for SnowflakeConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a Snowflake error message onto the catalog error taxonomy
pub fn classify_error(message: String) -> CatalogError {
    if message.contains("does not exist") || message.contains("not found") {
        CatalogError::ObjectNotFound(message)
    } else if message.contains("already exists") {
        CatalogError::AlreadyExists(message)
    } else if message.contains("Insufficient privileges") || message.contains("not authorized") {
        CatalogError::PermissionDenied(message)
    } else {
        CatalogError::QueryError(message)
    }
}

fn classify_connect_error(message: String) -> CatalogError {
    if message.contains("Incorrect username or password") || message.contains("authentication") {
        CatalogError::AuthenticationError(message)
    } else {
        CatalogError::ConnectionError(message)
    }
}

#[async_trait::async_trait]
impl Connector for SnowflakeConnector {
    fn name(&self) -> &'static str {
        "Snowflake"
    }

    #[cfg(feature = "snowflake")]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, CatalogError> {
        let api = SnowflakeApi::with_password_auth(
            &config.account,
            Some(config.warehouse.as_str()),
            None, // database
            None, // schema
            &config.user,
            Some(config.role.as_str()),
            &config.password,
        )
        .map_err(|e| CatalogError::AuthenticationError(format!(
            "Failed to authenticate with Snowflake: {}",
            e
        )))?;

        if self.verify_on_connect {
            api.exec("SELECT 1")
                .await
                .map_err(|e| classify_connect_error(e.to_string()))?;
        }

        tracing::debug!(account = %config.account, user = %config.user, "snowflake session opened");

        Ok(Box::new(SnowflakeConnection {
            api: Arc::new(Mutex::new(api)),
            closed: false,
        }))
    }

    #[cfg(not(feature = "snowflake"))]
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Connection>, CatalogError> {
        Err(CatalogError::ConfigError(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string()
        ))
    }
}

/// An open Snowflake session
#[cfg(feature = "snowflake")]
pub struct SnowflakeConnection {
    api: Arc<Mutex<SnowflakeApi>>,
    closed: bool,
}

#[cfg(feature = "snowflake")]
#[async_trait::async_trait]
impl Connection for SnowflakeConnection {
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>, CatalogError> {
        if self.closed {
            return Err(CatalogError::Closed);
        }

        Ok(Box::new(SnowflakeCursor {
            api: Arc::clone(&self.api),
            closed: false,
        }))
    }

    async fn close(&mut self) -> Result<(), CatalogError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.api
            .lock()
            .await
            .close_session()
            .await
            .map_err(|e| CatalogError::ConnectionError(format!("Failed to close session: {}", e)))
    }
}

/// Cursor over a shared Snowflake session
#[cfg(feature = "snowflake")]
pub struct SnowflakeCursor {
    api: Arc<Mutex<SnowflakeApi>>,
    closed: bool,
}

#[cfg(feature = "snowflake")]
#[async_trait::async_trait]
impl Cursor for SnowflakeCursor {
    async fn execute(&mut self, statement: &Statement) -> Result<Rows, CatalogError> {
        if self.closed {
            return Err(CatalogError::Closed);
        }

        let sql = statement.inline_sql();
        let result = self.api
            .lock()
            .await
            .exec(&sql)
            .await
            .map_err(|e| classify_error(e.to_string()))?;

        match result {
            QueryResult::Arrow(batches) => {
                let mut rows = Vec::new();
                for batch in batches {
                    for row_idx in 0..batch.num_rows() {
                        let values = batch
                            .columns()
                            .iter()
                            .map(|column| arrow_value(column, row_idx))
                            .collect();
                        rows.push(Row::new(values));
                    }
                }
                Ok(Rows::from_rows(rows))
            }
            QueryResult::Json(json) => json_rows(&json.value),
            QueryResult::Empty => Ok(Rows::empty()),
        }
    }

    async fn close(&mut self) -> Result<(), CatalogError> {
        // The cursor holds no server-side state of its own
        self.closed = true;
        Ok(())
    }
}

/// Read one cell as text. Only text, integer and boolean columns are read;
/// anything else comes back as `None`.
#[cfg(feature = "snowflake")]
fn arrow_value(column: &ArrayRef, row: usize) -> Option<String> {
    if column.is_null(row) {
        return None;
    }

    match column.data_type() {
        DataType::Utf8 => Some(column.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Some(column.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Some(column.as_primitive::<Int8Type>().value(row).to_string()),
        DataType::Int16 => Some(column.as_primitive::<Int16Type>().value(row).to_string()),
        DataType::Int32 => Some(column.as_primitive::<Int32Type>().value(row).to_string()),
        DataType::Int64 => Some(column.as_primitive::<Int64Type>().value(row).to_string()),
        DataType::Boolean => Some(column.as_boolean().value(row).to_string()),
        other => {
            tracing::debug!(data_type = ?other, "unsupported column type read as NULL");
            None
        }
    }
}

/// Convert a JSON result (array of row arrays) into rows
#[cfg(feature = "snowflake")]
fn json_rows(value: &serde_json::Value) -> Result<Rows, CatalogError> {
    let rows = value
        .as_array()
        .ok_or_else(|| CatalogError::InvalidResponse("Expected an array of rows".to_string()))?;

    rows.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .ok_or_else(|| CatalogError::InvalidResponse("Expected a row array".to_string()))?;
            Ok(Row::new(cells.iter().map(json_cell).collect()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Rows::from_rows)
}

#[cfg(feature = "snowflake")]
fn json_cell(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
