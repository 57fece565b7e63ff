//! Relational store boundary
//!
//! The pipeline only needs three things from a store: a catalog lookup by
//! relation name, execution of a parameterized statement, and per-statement
//! commit. [`SqliteStore`] provides them over a single rusqlite connection.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;

/// A value bound to a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Statement text plus its positional parameters (`?1`, `?2`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }
}

/// Store operations used by provisioning and writing.
///
/// Every successful `execute` is committed before it returns; a later
/// failure never undoes an earlier statement.
pub trait RelationStore {
    /// Case-sensitive catalog lookup of a relation by name
    fn relation_exists(&mut self, name: &str) -> Result<bool, StoreError>;

    /// Execute one statement, returning the number of affected rows
    fn execute(&mut self, statement: &Statement) -> Result<usize, StoreError>;
}

/// Quote a dynamic relation name as an SQL identifier.
///
/// Wraps in double quotes and doubles any embedded quote, so the name can
/// never terminate the identifier early.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
