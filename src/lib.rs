//! # order-ingest - Archived Order Loader
//!
//! Loads JSON order documents packed in a compressed archive into a
//! relational store with a fixed, declared schema.
//!
//! ## Modules
//!
//! - **archive**: read named entries out of a zip or `.tar.gz`
//! - **decoder**: parse one entry into orders, detaching their line items
//! - **provision**: create the `orders` and `items` relations once
//! - **writer**: insert one flat record as one committed row
//! - **pipeline**: drive the whole pass, stopping at the first error
//!
//! ## Quick Start
//!
//! ```rust
//! use order_ingest::{Archive, IngestConfig, Ingestor, SqliteStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut archive = Archive::from_entries([(
//!     "2024-01.json",
//!     r#"{"orders": [{"id": 1, "email": "a@b.com", "line_items": [{"id": "i1", "quantity": 2}]}]}"#,
//! )]);
//! let mut store = SqliteStore::open_in_memory()?;
//!
//! let report = Ingestor::new(IngestConfig::default()).run(&mut archive, &mut store)?;
//! assert_eq!(report.orders, 1);
//! assert_eq!(report.items, 1);
//! # Ok(())
//! # }
//! ```
//!
//! Items are stored without a reference to their order: the documents carry
//! no such link, so the `items` relation alone cannot be joined back.

use std::path::Path;

pub mod archive;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod provision;
pub mod schema;
pub mod store;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use archive::{Archive, ArchiveEntry, EntrySource};
pub use decoder::{decode_document, DocumentDecoder};
pub use error::{IngestError, Result, StoreError};
pub use pipeline::{IngestReport, Ingestor, Stage};
pub use provision::{ensure_relation, Provisioned};
pub use schema::{ColumnDef, DeclaredSchemas, RelationSchema};
pub use store::{RelationStore, SqlValue, SqliteStore, Statement};
pub use types::{FieldValue, IngestConfig, Order, Record};
pub use writer::RecordWriter;

/// Main entry point: load a zip or `.tar.gz` of order documents into `store`
pub fn ingest_archive<P, S>(path: P, store: &mut S, config: IngestConfig) -> Result<IngestReport>
where
    P: AsRef<Path>,
    S: RelationStore + ?Sized,
{
    let mut archive = Archive::open(path)?;
    Ingestor::new(config).run(&mut archive, store)
}
