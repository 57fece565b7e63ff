//! Idempotent relation provisioning
//!
//! A relation is created from its declared schema the first time it is
//! needed. An existing relation is trusted as-is: its columns are never
//! compared against the declaration and nothing is migrated.

use crate::error::{IngestError, Result, StoreError};
use crate::schema::RelationSchema;
use crate::store::{quote_identifier, RelationStore, Statement};
use tracing::debug;

/// Outcome of [`ensure_relation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Make sure `schema.name` exists in the store, creating it if absent.
pub fn ensure_relation<S: RelationStore + ?Sized>(
    store: &mut S,
    schema: &RelationSchema,
) -> Result<Provisioned> {
    let relation_error = |source: StoreError| IngestError::Relation {
        relation: schema.name.clone(),
        source,
    };

    if store.relation_exists(&schema.name).map_err(relation_error)? {
        return Ok(Provisioned::AlreadyExists);
    }

    let statement = create_statement(schema).map_err(relation_error)?;
    store.execute(&statement).map_err(relation_error)?;

    debug!(
        relation = %schema.name,
        columns = schema.columns.len(),
        "created relation"
    );
    Ok(Provisioned::Created)
}

/// Build `CREATE TABLE "<name>" (<col> <type>, ...)`.
///
/// Only the relation name is quoted. Column names and types are operator
/// declared and go into the statement verbatim.
pub fn create_statement(schema: &RelationSchema) -> std::result::Result<Statement, StoreError> {
    if schema.columns.is_empty() {
        return Err(StoreError::Backend(format!(
            "relation {} declares no columns",
            schema.name
        )));
    }

    let columns = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Statement::new(format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&schema.name),
        columns
    )))
}
