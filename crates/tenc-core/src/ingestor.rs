//! # Ingestor Module
//!
//! Drives the write path of a conversion job.
//!
//! - Validate events before any table is touched
//! - Intern keys into the four symbol tables
//! - Count entity and predicate occurrences
//! - Spool relation and attribute records
//! - On `finish`, write the shape header and indexes and seal the archive
//!
//! Only symbols, counters and attribute pairs stay in memory; relation lines
//! go straight to a temporary file.

use crate::archive::{ArchiveWriter, StreamKind};
use crate::counter::OccurrenceCounter;
use crate::formats::{ShapeHeader, write_index};
use crate::stream::RecordWriter;
use crate::symbols::SymbolTable;
use crate::{AttributeAssertion, AttributeTarget, Event, TencError, Triple};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Summary of what a session has ingested so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Distinct entities.
    pub entities: u64,
    /// Distinct predicates.
    pub predicates: u64,
    /// Relation records written.
    pub relations: u64,
    /// Distinct entity attribute keys.
    pub entity_attributes: u64,
    /// Distinct predicate attribute keys.
    pub predicate_attributes: u64,
    /// Distinct (entity, attribute) pairs.
    pub entity_attribute_pairs: u64,
    /// Distinct (predicate, attribute) pairs.
    pub predicate_attribute_pairs: u64,
}

/// State of one conversion job, from the first event to the sealed archive.
#[derive(Debug)]
pub struct ConversionSession {
    entities: SymbolTable,
    predicates: SymbolTable,
    entity_attributes: SymbolTable,
    predicate_attributes: SymbolTable,
    entity_counts: OccurrenceCounter,
    predicate_counts: OccurrenceCounter,
    records: RecordWriter,
}

impl ConversionSession {
    /// Start a session that spools into the system temporary directory.
    pub fn new() -> Result<Self, TencError> {
        Ok(Self::with_records(RecordWriter::new()?))
    }

    /// Start a session that spools into `dir`.
    pub fn new_in(dir: impl AsRef<Path>) -> Result<Self, TencError> {
        Ok(Self::with_records(RecordWriter::new_in(dir)?))
    }

    fn with_records(records: RecordWriter) -> Self {
        Self {
            entities: SymbolTable::new(),
            predicates: SymbolTable::new(),
            entity_attributes: SymbolTable::new(),
            predicate_attributes: SymbolTable::new(),
            entity_counts: OccurrenceCounter::new(),
            predicate_counts: OccurrenceCounter::new(),
            records,
        }
    }

    /// Ingest one relation triple.
    ///
    /// Interning order is subject, object, predicate. Subject and object
    /// each count as one entity occurrence, so a self-loop counts twice.
    pub fn add_relation(&mut self, triple: &Triple) -> Result<(), TencError> {
        validate_key("subject", &triple.subject)?;
        validate_key("predicate", &triple.predicate)?;
        validate_key("object", &triple.object)?;
        if !triple.weight.is_finite() {
            return Err(TencError::InvalidInput(format!(
                "weight {} of {} {} {} is not finite",
                triple.weight, triple.subject, triple.predicate, triple.object
            )));
        }

        let subject = self.entities.intern(&triple.subject);
        let object = self.entities.intern(&triple.object);
        let predicate = self.predicates.intern(&triple.predicate);

        self.entity_counts.increment(subject);
        self.entity_counts.increment(object);
        self.predicate_counts.increment(predicate);

        self.records
            .emit_relation(subject, predicate, object, triple.weight)
    }

    /// Ingest one attribute assertion.
    ///
    /// The item gets an id in its own table but no occurrence count.
    pub fn add_attribute(&mut self, assertion: &AttributeAssertion) -> Result<(), TencError> {
        validate_key("item", &assertion.item)?;
        validate_key("attribute", &assertion.attribute)?;

        let (item, attribute) = match assertion.target {
            AttributeTarget::Entity => (
                self.entities.intern(&assertion.item),
                self.entity_attributes.intern(&assertion.attribute),
            ),
            AttributeTarget::Predicate => (
                self.predicates.intern(&assertion.item),
                self.predicate_attributes.intern(&assertion.attribute),
            ),
        };
        self.records.emit_attribute(assertion.target, item, attribute);
        Ok(())
    }

    /// Ingest one event.
    pub fn add_event(&mut self, event: &Event) -> Result<(), TencError> {
        match event {
            Event::Relation(triple) => self.add_relation(triple),
            Event::Attribute(assertion) => self.add_attribute(assertion),
        }
    }

    /// Ingest every event of `events`, stopping at the first error.
    ///
    /// Returns the number of events ingested.
    pub fn ingest<I>(&mut self, events: I) -> Result<u64, TencError>
    where
        I: IntoIterator<Item = Result<Event, TencError>>,
    {
        let mut ingested = 0u64;
        for event in events {
            self.add_event(&event?)?;
            ingested += 1;
        }
        tracing::debug!("Ingested {} events", ingested);
        Ok(ingested)
    }

    /// Current table sizes and record counts.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            entities: self.entities.len() as u64,
            predicates: self.predicates.len() as u64,
            relations: self.records.relation_count(),
            entity_attributes: self.entity_attributes.len() as u64,
            predicate_attributes: self.predicate_attributes.len() as u64,
            entity_attribute_pairs: self.records.attribute_nnz(AttributeTarget::Entity),
            predicate_attribute_pairs: self.records.attribute_nnz(AttributeTarget::Predicate),
        }
    }

    /// Write all eight streams into `writer` and seal it.
    ///
    /// Consumes the session; the symbol tables and counters are dropped once
    /// the archive is sealed. Returns the archive path.
    pub fn finish(self, mut writer: ArchiveWriter) -> Result<PathBuf, TencError> {
        let stats = self.stats();
        let records = self.records.finalize()?;

        let shape = ShapeHeader {
            entity_occurrences: self.entity_counts.to_vec(self.entities.len()),
            predicate_occurrences: self.predicate_counts.to_vec(self.predicates.len()),
            entity_attribute_nnz: records.entity_attribute_nnz,
            predicate_attribute_nnz: records.predicate_attribute_nnz,
        };

        writer.append_bytes(writer.stream_name(StreamKind::Shape), shape.to_bytes()?)?;
        writer.append_file(writer.stream_name(StreamKind::Relations), records.relations)?;
        writer.append_file(
            writer.stream_name(StreamKind::EntityAttributes),
            records.entity_attributes,
        )?;
        writer.append_file(
            writer.stream_name(StreamKind::PredicateAttributes),
            records.predicate_attributes,
        )?;

        for (kind, table) in [
            (StreamKind::EntityIndex, &self.entities),
            (StreamKind::PredicateIndex, &self.predicates),
            (StreamKind::EntityAttributeIndex, &self.entity_attributes),
            (StreamKind::PredicateAttributeIndex, &self.predicate_attributes),
        ] {
            let mut buf = Vec::new();
            write_index(&mut buf, table.export_ordered())?;
            writer.append_bytes(writer.stream_name(kind), buf)?;
        }

        let path = writer.seal()?;
        tracing::info!(
            "Archived {} entities, {} predicates, {} relations into {}",
            stats.entities,
            stats.predicates,
            stats.relations,
            path.display()
        );
        Ok(path)
    }
}

/// Keys end up one per line in an index stream, so only line breaks are
/// rejected. Empty keys are valid.
fn validate_key(what: &str, key: &str) -> Result<(), TencError> {
    if key.contains(['\n', '\r']) {
        return Err(TencError::InvalidInput(format!(
            "{} {:?} contains a line break",
            what, key
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(s, p, o, 1.0)
    }

    #[test]
    fn relation_interns_subject_then_object_then_predicate() {
        let mut session = ConversionSession::new().expect("session");
        session.add_relation(&rel("a", "r", "b")).expect("add");

        assert_eq!(session.entities.get("a"), Some(0));
        assert_eq!(session.entities.get("b"), Some(1));
        assert_eq!(session.predicates.get("r"), Some(0));
        assert_eq!(session.entity_counts.get(0), 1);
        assert_eq!(session.entity_counts.get(1), 1);
        assert_eq!(session.predicate_counts.get(0), 1);
    }

    #[test]
    fn self_loop_counts_twice() {
        let mut session = ConversionSession::new().expect("session");
        session.add_relation(&rel("a", "r", "a")).expect("add");
        assert_eq!(session.entities.len(), 1);
        assert_eq!(session.entity_counts.get(0), 2);
    }

    #[test]
    fn entity_attribute_interns_item_without_counting() {
        let mut session = ConversionSession::new().expect("session");
        session
            .add_attribute(&AttributeAssertion::new("x", AttributeTarget::Entity, "type,Person"))
            .expect("add");
        session.add_relation(&rel("a", "r", "x")).expect("add");

        assert_eq!(session.entities.get("x"), Some(0));
        assert_eq!(session.entities.get("a"), Some(1));
        assert_eq!(session.entity_counts.get(0), 1);
        assert_eq!(session.entity_attributes.get("type,Person"), Some(0));

        let stats = session.stats();
        assert_eq!(stats.entity_attribute_pairs, 1);
        assert_eq!(stats.relations, 1);
    }

    #[test]
    fn predicate_attribute_uses_predicate_table() {
        let mut session = ConversionSession::new().expect("session");
        session
            .add_attribute(&AttributeAssertion::new("r", AttributeTarget::Predicate, "label"))
            .expect("add");
        assert_eq!(session.predicates.get("r"), Some(0));
        assert!(session.entities.is_empty());
        assert_eq!(session.predicate_counts.get(0), 0);
    }

    #[test]
    fn invalid_events_rejected() {
        let mut session = ConversionSession::new().expect("session");
        assert!(matches!(
            session.add_relation(&rel("a\nb", "r", "b")),
            Err(TencError::InvalidInput(_))
        ));
        assert!(matches!(
            session.add_relation(&Triple::new("a", "r", "b", f64::NAN)),
            Err(TencError::InvalidInput(_))
        ));
        assert!(session.entities.is_empty());
    }

    #[test]
    fn empty_keys_are_interned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = ConversionSession::new_in(dir.path()).expect("session");
        session.add_relation(&rel("a", "", "b")).expect("add");
        session.add_relation(&rel("", "r", "a")).expect("add");
        assert_eq!(session.predicates.get(""), Some(0));
        assert_eq!(session.entities.get(""), Some(2));

        let writer = ArchiveWriter::create(dir.path(), "g", None).expect("writer");
        let path = session.finish(writer).expect("finish");
        let reader = crate::archive::ArchiveReader::open(&path).expect("open");
        let mut stream = reader.extract(StreamKind::PredicateIndex).expect("stream");
        let keys = crate::formats::read_index(&mut stream, "predicates").expect("index");
        assert_eq!(keys, vec!["", "r"]);
    }

    #[test]
    fn ingest_stops_at_first_error() {
        let mut session = ConversionSession::new().expect("session");
        let events = vec![
            Ok(Event::Relation(rel("a", "r", "b"))),
            Err(TencError::InvalidInput("bad line".to_string())),
            Ok(Event::Relation(rel("c", "r", "d"))),
        ];
        assert!(session.ingest(events).is_err());
        assert_eq!(session.stats().relations, 1);
    }

    #[test]
    fn finish_writes_all_streams() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = ConversionSession::new_in(dir.path()).expect("session");
        session.add_relation(&rel("a", "r", "b")).expect("add");

        let writer = ArchiveWriter::create(dir.path(), "g", None).expect("writer");
        let path = session.finish(writer).expect("finish");

        let reader = crate::archive::ArchiveReader::open(&path).expect("open");
        for kind in StreamKind::ALL {
            assert!(reader.contains(&reader.stream_name(kind)), "{kind:?}");
        }
        // Only the archive remains; spool files are gone.
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 1);
    }
}
