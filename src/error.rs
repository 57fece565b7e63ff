//! Error types for the ingestion pipeline.
//!
//! Every variant is fatal to a run: the orchestrator stops at the first
//! error and returns it, leaving already-committed rows in place.

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while reading, decoding, or persisting order documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The archive could not be opened or an entry could not be read.
    #[error("archive error: {message}")]
    Archive {
        /// Description of the archive failure.
        message: String,
    },

    /// An entry's body is not valid JSON.
    #[error("failed to decode {entry}: {message}")]
    Decode {
        /// Archive entry being decoded.
        entry: String,
        /// Parser error, including location when available.
        message: String,
    },

    /// The document is valid JSON but does not have the expected shape.
    #[error("unexpected document shape in {entry}: {message}")]
    SchemaMismatch {
        /// Archive entry being decoded.
        entry: String,
        /// What was expected and what was found.
        message: String,
    },

    /// The store rejected the creation of a relation.
    #[error("failed to provision relation {relation}: {source}")]
    Relation {
        /// Relation being created.
        relation: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The store rejected an insert, or a value cannot be bound.
    #[error("failed to write into {relation}: {source}")]
    Write {
        /// Target relation.
        relation: String,
        /// Underlying failure.
        #[source]
        source: StoreError,
    },

    /// A declared-schema override file is unreadable or invalid.
    #[error("invalid schema configuration: {message}")]
    SchemaConfig {
        /// Description of the problem.
        message: String,
    },
}

impl IngestError {
    /// Attach the archive entry name to decode-time errors raised without one.
    pub(crate) fn in_entry(self, name: &str) -> Self {
        match self {
            IngestError::Decode { entry, message } if entry.is_empty() => IngestError::Decode {
                entry: name.to_string(),
                message,
            },
            IngestError::SchemaMismatch { entry, message } if entry.is_empty() => {
                IngestError::SchemaMismatch {
                    entry: name.to_string(),
                    message,
                }
            }
            other => other,
        }
    }
}

/// Failures reported by a [`RelationStore`](crate::store::RelationStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected the statement.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// A field value has no relational representation.
    #[error("field {field} holds a nested {kind}, expected a scalar")]
    UnsupportedValue {
        /// Offending field name.
        field: String,
        /// `object` or `array`.
        kind: &'static str,
    },

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}
