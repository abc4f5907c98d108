//! Statements issued against the warehouse
//!
//! Statements are typed so adapters can bind parameters their own way and the
//! mock warehouse can interpret them without parsing SQL.

use crate::identifier::{Namespace, QualifiedTable};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `CREATE SCHEMA [IF NOT EXISTS] db.schema`
    CreateSchema {
        namespace: Namespace,
        if_not_exists: bool,
    },

    /// `CREATE TABLE [IF NOT EXISTS] target LIKE source`
    ///
    /// Copies column definitions only: no rows, grants or dependent objects.
    CreateTableLike {
        target: QualifiedTable,
        source: QualifiedTable,
        if_not_exists: bool,
    },

    /// `SELECT GET_DDL('TABLE', ?)`, returning one row with one text column
    GetDdl { table: QualifiedTable },

    /// `SELECT 1`
    Ping,
}

impl Statement {
    /// Idempotent schema creation
    pub fn ensure_schema(namespace: &Namespace) -> Self {
        Statement::CreateSchema {
            namespace: namespace.clone(),
            if_not_exists: true,
        }
    }

    /// Idempotent structural copy of `source` into `target`
    pub fn ensure_table_like(target: QualifiedTable, source: QualifiedTable) -> Self {
        Statement::CreateTableLike {
            target,
            source,
            if_not_exists: true,
        }
    }

    pub fn get_ddl(table: QualifiedTable) -> Self {
        Statement::GetDdl { table }
    }

    /// SQL text with `?` placeholders
    pub fn sql(&self) -> String {
        match self {
            Statement::CreateSchema { namespace, if_not_exists } => format!(
                "CREATE SCHEMA {}{}",
                if_not_exists_clause(*if_not_exists),
                namespace.to_sql()
            ),
            Statement::CreateTableLike { target, source, if_not_exists } => format!(
                "CREATE TABLE {}{} LIKE {}",
                if_not_exists_clause(*if_not_exists),
                target.fqn(),
                source.fqn()
            ),
            Statement::GetDdl { .. } => "SELECT GET_DDL('TABLE', ?)".to_string(),
            Statement::Ping => "SELECT 1".to_string(),
        }
    }

    /// Positional parameters for the placeholders in [`Statement::sql`]
    pub fn params(&self) -> Vec<String> {
        match self {
            Statement::GetDdl { table } => vec![table.fqn()],
            _ => Vec::new(),
        }
    }

    /// SQL text with parameters inlined as string literals
    ///
    /// For clients that cannot bind parameters.
    pub fn inline_sql(&self) -> String {
        let mut params = self.params().into_iter();
        let sql = self.sql();
        let mut out = String::with_capacity(sql.len());

        for c in sql.chars() {
            if c == '?' {
                if let Some(param) = params.next() {
                    out.push_str(&string_literal(&param));
                    continue;
                }
            }
            out.push(c);
        }

        out
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inline_sql())
    }
}

fn if_not_exists_clause(if_not_exists: bool) -> &'static str {
    if if_not_exists {
        "IF NOT EXISTS "
    } else {
        ""
    }
}

/// Single-quoted SQL string literal
fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
