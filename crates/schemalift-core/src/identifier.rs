//! Table and namespace identifiers
//!
//! All identifiers are normalized to uppercase, which is how Snowflake stores
//! unquoted names. Names that are not plain identifiers are double-quoted when
//! rendered into SQL.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A normalized (trimmed, uppercased) table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

/// Error for identifiers that are empty after normalization
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Identifier is empty")]
pub struct InvalidIdentifier;

impl TableName {
    /// Normalize a raw table name
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidIdentifier> {
        let normalized = raw.as_ref().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(InvalidIdentifier);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render for use inside a SQL statement
    pub fn to_sql(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A (database, schema) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    /// Database name
    pub database: String,

    /// Schema name
    pub schema: String,
}

impl Namespace {
    /// Create a namespace, uppercasing both parts
    pub fn new(database: impl AsRef<str>, schema: impl AsRef<str>) -> Self {
        Self {
            database: database.as_ref().trim().to_uppercase(),
            schema: schema.as_ref().trim().to_uppercase(),
        }
    }

    /// Qualify a table with this namespace
    pub fn table(&self, table: &TableName) -> QualifiedTable {
        QualifiedTable {
            namespace: self.clone(),
            table: table.clone(),
        }
    }

    /// `DB.SCHEMA` as used inside SQL
    pub fn to_sql(&self) -> String {
        format!("{}.{}", quote_identifier(&self.database), quote_identifier(&self.schema))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.schema)
    }
}

/// A table qualified by its namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedTable {
    pub namespace: Namespace,
    pub table: TableName,
}

impl QualifiedTable {
    /// Fully qualified name as used inside SQL
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.namespace.to_sql(), self.table.to_sql())
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

fn plain_identifier() -> &'static Regex {
    static PLAIN: OnceLock<Regex> = OnceLock::new();
    PLAIN.get_or_init(|| Regex::new(r"^[A-Z_][A-Z0-9_$]*$").expect("valid identifier regex"))
}

/// Quote an identifier unless it is a plain unquoted Snowflake identifier
pub fn quote_identifier(name: &str) -> String {
    if plain_identifier().is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
