//! Ingestion orchestrator
//!
//! Drives one strictly sequential pass over an archive: each entry is
//! decoded, both target relations are (re)checked, then every order is
//! written followed by its line items, all in document order. The first
//! error stops the run; rows committed before it stay in the store.
//!
//! Line items are written without any reference to their parent order.
//! The source documents carry no such link and none is invented here.

use crate::archive::EntrySource;
use crate::decoder::DocumentDecoder;
use crate::error::Result;
use crate::provision::{ensure_relation, Provisioned};
use crate::schema::DeclaredSchemas;
use crate::store::RelationStore;
use crate::types::{IngestConfig, Order};
use crate::writer::RecordWriter;
use tracing::{error, info, info_span, trace};

/// Position of the orchestrator in its single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ForEachEntry,
    Decoding,
    Provisioning,
    ForEachOrder,
    WritingOrder,
    ForEachItem,
    WritingItem,
    Done,
}

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub entries: usize,
    pub orders: usize,
    pub items: usize,
    pub relations_created: usize,
}

/// Runs the archive → store pipeline
pub struct Ingestor {
    decoder: DocumentDecoder,
    schemas: DeclaredSchemas,
    writer: RecordWriter,
    stage: Stage,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Ingestor {
            decoder: DocumentDecoder::from_config(&config),
            schemas: config.schemas,
            writer: RecordWriter,
            stage: Stage::Idle,
        }
    }

    /// Last stage reached; after a failure this is where it happened
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn schemas(&self) -> &DeclaredSchemas {
        &self.schemas
    }

    /// Ingest every entry of `source` into `store`.
    pub fn run<A, S>(&mut self, source: &mut A, store: &mut S) -> Result<IngestReport>
    where
        A: EntrySource + ?Sized,
        S: RelationStore + ?Sized,
    {
        let mut report = IngestReport::default();

        for (index, name) in source.entry_names().into_iter().enumerate() {
            self.enter(Stage::ForEachEntry);
            let span = info_span!("entry", index, name = %name);
            let _guard = span.enter();

            if let Err(e) = self.ingest_entry(source, store, index, &name, &mut report) {
                error!(stage = ?self.stage, error = %e, "ingestion stopped");
                return Err(e);
            }
            report.entries += 1;
        }

        self.enter(Stage::Done);
        info!(
            entries = report.entries,
            orders = report.orders,
            items = report.items,
            relations_created = report.relations_created,
            "ingestion finished"
        );
        Ok(report)
    }

    fn ingest_entry<A, S>(
        &mut self,
        source: &mut A,
        store: &mut S,
        index: usize,
        name: &str,
        report: &mut IngestReport,
    ) -> Result<()>
    where
        A: EntrySource + ?Sized,
        S: RelationStore + ?Sized,
    {
        self.enter(Stage::Decoding);
        let bytes = source.read_entry(index)?;
        let orders = self.decoder.decode(&bytes).map_err(|e| e.in_entry(name))?;
        info!(orders = orders.len(), "decoded entry");

        self.enter(Stage::Provisioning);
        for schema in [&self.schemas.orders, &self.schemas.items] {
            if ensure_relation(store, schema)? == Provisioned::Created {
                report.relations_created += 1;
            }
        }

        for order in orders {
            self.enter(Stage::ForEachOrder);
            self.write_order(store, order, report)?;
        }
        Ok(())
    }

    fn write_order<S: RelationStore + ?Sized>(
        &mut self,
        store: &mut S,
        order: Order,
        report: &mut IngestReport,
    ) -> Result<()> {
        let Order { fields, line_items } = order;

        self.enter(Stage::WritingOrder);
        self.writer.insert(store, &self.schemas.orders.name, &fields)?;
        report.orders += 1;

        for item in &line_items {
            self.enter(Stage::ForEachItem);
            self.enter(Stage::WritingItem);
            self.writer.insert(store, &self.schemas.items.name, item)?;
            report.items += 1;
        }
        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        trace!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }
}
