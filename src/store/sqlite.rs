use crate::error::StoreError;
use crate::store::{RelationStore, SqlValue, Statement};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// SQLite-backed store running in autocommit mode
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RelationStore for SqliteStore {
    fn relation_exists(&mut self, name: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn execute(&mut self, statement: &Statement) -> Result<usize, StoreError> {
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let changed = stmt.execute(params_from_iter(statement.params.iter()))?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_exists_is_case_sensitive() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.relation_exists("orders").unwrap());

        store
            .execute(&Statement::new("CREATE TABLE \"orders\" (id BIGINT)"))
            .unwrap();

        assert!(store.relation_exists("orders").unwrap());
        assert!(!store.relation_exists("ORDERS").unwrap());
    }

    #[test]
    fn test_execute_binds_all_value_kinds() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute(&Statement::new(
                "CREATE TABLE t (a TEXT, b INT, c FLOAT8, d BOOLEAN, e TEXT)",
            ))
            .unwrap();

        let changed = store
            .execute(&Statement::with_params(
                "INSERT INTO t (a, b, c, d, e) VALUES (?1, ?2, ?3, ?4, ?5)",
                vec![
                    SqlValue::Text("x".into()),
                    SqlValue::Integer(7),
                    SqlValue::Real(1.5),
                    SqlValue::Bool(true),
                    SqlValue::Null,
                ],
            ))
            .unwrap();
        assert_eq!(changed, 1);

        let row: (String, i64, f64, bool, Option<String>) = store
            .connection()
            .query_row("SELECT a, b, c, d, e FROM t", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })
            .unwrap();
        assert_eq!(row, ("x".to_string(), 7, 1.5, true, None));
    }

    #[test]
    fn test_execute_reports_sqlite_errors() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .execute(&Statement::new("INSERT INTO missing (a) VALUES (1)"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
