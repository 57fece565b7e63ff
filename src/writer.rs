use crate::error::{IngestError, Result, StoreError};
use crate::store::{quote_identifier, RelationStore, SqlValue, Statement};
use crate::types::{FieldValue, Record};
use tracing::debug;

/// Writes flat records into relations, one committed row per call
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordWriter;

impl RecordWriter {
    /// Insert one record into `relation`.
    ///
    /// The record's fields are not checked against the relation's columns;
    /// a mismatch comes back from the store as a write error.
    pub fn insert<S: RelationStore + ?Sized>(
        &self,
        store: &mut S,
        relation: &str,
        record: &Record,
    ) -> Result<()> {
        let write_error = |source: StoreError| IngestError::Write {
            relation: relation.to_string(),
            source,
        };

        let statement = insert_statement(relation, record).map_err(write_error)?;
        store.execute(&statement).map_err(write_error)?;

        debug!(relation, fields = record.len(), "wrote row");
        Ok(())
    }
}

/// Build `INSERT INTO "<relation>" (<fields>) VALUES (?1, ...)`.
///
/// Field names are a trusted fragment taken from the record; values are
/// only ever bound as parameters.
pub fn insert_statement(relation: &str, record: &Record) -> std::result::Result<Statement, StoreError> {
    let table = quote_identifier(relation);

    if record.is_empty() {
        return Ok(Statement::new(format!("INSERT INTO {} DEFAULT VALUES", table)));
    }

    let mut names = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (name, value) in record.iter() {
        names.push(name);
        params.push(to_sql_value(name, value)?);
    }

    let placeholders = (1..=params.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders
        ),
        params,
    ))
}

/// Map a field value to its bound form; empty strings become NULL
fn to_sql_value(field: &str, value: &FieldValue) -> std::result::Result<SqlValue, StoreError> {
    Ok(match value {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Text(s) if s.is_empty() => SqlValue::Null,
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Bool(b) => SqlValue::Bool(*b),
        FieldValue::Integer(i) => SqlValue::Integer(*i),
        FieldValue::Float(f) => SqlValue::Real(*f),
        FieldValue::Nested(nested) => {
            return Err(StoreError::UnsupportedValue {
                field: field.to_string(),
                kind: if nested.is_array() { "array" } else { "object" },
            })
        }
    })
}
