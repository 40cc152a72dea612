//! # Relation and Attribute Streams
//!
//! Write side: relations are appended to a temporary file as they arrive;
//! attributes are folded into sorted `(item, attribute) -> count` tables and
//! written out once ingestion ends.
//!
//! Read side: lazy iterators over a decompressed archive stream that parse
//! each line and push it through the prune mappings. Records whose ids did
//! not survive are skipped. A malformed line yields one `TencError::Format`
//! and ends the iteration.

use crate::archive::reader::map_stream_error;
use crate::formats::records::{parse_attribute, parse_relation, write_attribute, write_relation};
use crate::prune::{PruneMapping, apply_to_attribute, apply_to_relation};
use crate::{AttributeRecord, AttributeTarget, RelationRecord, TencError};
use std::collections::BTreeMap;
use std::io::{BufRead, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// =============================================================================
// WRITE MODE
// =============================================================================

/// Spools relation lines and accumulates attribute counts.
#[derive(Debug)]
pub struct RecordWriter {
    spool_dir: Option<PathBuf>,
    relations: BufWriter<NamedTempFile>,
    relation_count: u64,
    entity_attributes: BTreeMap<(u64, u64), u64>,
    predicate_attributes: BTreeMap<(u64, u64), u64>,
}

/// Output of [`RecordWriter::finalize`]: three spooled streams and their sizes.
#[derive(Debug)]
pub struct FinalizedRecords {
    /// Relation lines in arrival order.
    pub relations: NamedTempFile,
    /// Entity attribute lines in `(item, attribute)` order.
    pub entity_attributes: NamedTempFile,
    /// Predicate attribute lines in `(item, attribute)` order.
    pub predicate_attributes: NamedTempFile,
    /// Number of relation lines.
    pub relation_count: u64,
    /// Distinct entity attribute pairs.
    pub entity_attribute_nnz: u64,
    /// Distinct predicate attribute pairs.
    pub predicate_attribute_nnz: u64,
}

impl RecordWriter {
    /// Spool into the system temporary directory.
    pub fn new() -> Result<Self, TencError> {
        Self::build(None)
    }

    /// Spool into `dir`, e.g. the output directory of the archive.
    pub fn new_in(dir: impl AsRef<Path>) -> Result<Self, TencError> {
        Self::build(Some(dir.as_ref().to_path_buf()))
    }

    fn build(spool_dir: Option<PathBuf>) -> Result<Self, TencError> {
        let relations = spool_file(spool_dir.as_deref())?;
        Ok(Self {
            spool_dir,
            relations: BufWriter::new(relations),
            relation_count: 0,
            entity_attributes: BTreeMap::new(),
            predicate_attributes: BTreeMap::new(),
        })
    }

    /// Append one relation line.
    pub fn emit_relation(
        &mut self,
        subject: u64,
        predicate: u64,
        object: u64,
        weight: f64,
    ) -> Result<(), TencError> {
        write_relation(
            &mut self.relations,
            &RelationRecord::new(subject, predicate, object, weight),
        )?;
        self.relation_count += 1;
        Ok(())
    }

    /// Count one occurrence of `attribute` on `item`.
    pub fn emit_attribute(&mut self, target: AttributeTarget, item: u64, attribute: u64) {
        let table = match target {
            AttributeTarget::Entity => &mut self.entity_attributes,
            AttributeTarget::Predicate => &mut self.predicate_attributes,
        };
        let count = table.entry((item, attribute)).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Number of relation lines written so far.
    #[must_use]
    pub fn relation_count(&self) -> u64 {
        self.relation_count
    }

    /// Distinct `(item, attribute)` pairs seen so far for `target`.
    #[must_use]
    pub fn attribute_nnz(&self, target: AttributeTarget) -> u64 {
        match target {
            AttributeTarget::Entity => self.entity_attributes.len() as u64,
            AttributeTarget::Predicate => self.predicate_attributes.len() as u64,
        }
    }

    /// Flush everything into temporary files.
    ///
    /// Attribute lines are written in ascending `(item, attribute)` order.
    pub fn finalize(self) -> Result<FinalizedRecords, TencError> {
        let relations = self
            .relations
            .into_inner()
            .map_err(|e| TencError::Io(e.into_error()))?;

        let entity_attribute_nnz = self.entity_attributes.len() as u64;
        let predicate_attribute_nnz = self.predicate_attributes.len() as u64;
        let entity_attributes = spool_table(self.spool_dir.as_deref(), &self.entity_attributes)?;
        let predicate_attributes =
            spool_table(self.spool_dir.as_deref(), &self.predicate_attributes)?;

        tracing::debug!(
            "Spooled {} relations, {} entity and {} predicate attribute pairs",
            self.relation_count,
            entity_attribute_nnz,
            predicate_attribute_nnz
        );

        Ok(FinalizedRecords {
            relations,
            entity_attributes,
            predicate_attributes,
            relation_count: self.relation_count,
            entity_attribute_nnz,
            predicate_attribute_nnz,
        })
    }
}

fn spool_file(dir: Option<&Path>) -> Result<NamedTempFile, TencError> {
    let file = match dir {
        Some(d) => NamedTempFile::new_in(d)?,
        None => NamedTempFile::new()?,
    };
    Ok(file)
}

fn spool_table(
    dir: Option<&Path>,
    table: &BTreeMap<(u64, u64), u64>,
) -> Result<NamedTempFile, TencError> {
    let mut out = BufWriter::new(spool_file(dir)?);
    for (&(item, attribute), &count) in table {
        write_attribute(&mut out, &AttributeRecord::new(item, attribute, count))?;
    }
    out.into_inner().map_err(|e| TencError::Io(e.into_error()))
}

// =============================================================================
// READ MODE
// =============================================================================

/// Line cursor shared by the record iterators.
#[derive(Debug)]
struct LineCursor<R> {
    input: R,
    stream: String,
    buf: String,
    line_no: u64,
    kept: u64,
    done: bool,
}

impl<R: BufRead> LineCursor<R> {
    fn new(input: R, stream: &str) -> Self {
        Self {
            input,
            stream: stream.to_string(),
            buf: String::new(),
            line_no: 0,
            kept: 0,
            done: false,
        }
    }

    /// Read the next line into `buf` and return its 1-based number, or
    /// `None` once the stream is exhausted or has failed.
    fn advance(&mut self) -> Option<Result<u64, TencError>> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.input.read_line(&mut self.buf) {
            Ok(0) => {
                self.done = true;
                tracing::debug!(
                    "{}: kept {} of {} records",
                    self.stream,
                    self.kept,
                    self.line_no
                );
                None
            }
            Ok(_) => {
                self.line_no += 1;
                Some(Ok(self.line_no))
            }
            Err(e) => {
                self.done = true;
                Some(Err(map_stream_error(&self.stream, e)))
            }
        }
    }
}

/// Pruned, reindexed relation records read from a relation stream.
#[derive(Debug)]
pub struct RelationIter<'m, R> {
    cursor: LineCursor<R>,
    entities: &'m PruneMapping,
    predicates: &'m PruneMapping,
}

impl<'m, R: BufRead> RelationIter<'m, R> {
    /// Iterate `input`, keeping relations whose subject, object and predicate
    /// all survived. `stream` names the source in errors.
    pub fn new(
        input: R,
        stream: &str,
        entities: &'m PruneMapping,
        predicates: &'m PruneMapping,
    ) -> Self {
        Self {
            cursor: LineCursor::new(input, stream),
            entities,
            predicates,
        }
    }
}

impl<R: BufRead> Iterator for RelationIter<'_, R> {
    type Item = Result<RelationRecord, TencError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line_no = match self.cursor.advance()? {
                Ok(n) => n,
                Err(e) => return Some(Err(e)),
            };
            let record = match parse_relation(&self.cursor.buf, &self.cursor.stream, line_no) {
                Ok(record) => record,
                Err(e) => {
                    self.cursor.done = true;
                    return Some(Err(e));
                }
            };
            if let Some(mapped) =
                apply_to_relation(self.entities, self.predicates, self.entities, &record)
            {
                self.cursor.kept += 1;
                return Some(Ok(mapped));
            }
        }
    }
}

/// Pruned attribute records read from an attribute stream.
#[derive(Debug)]
pub struct AttributeIter<'m, R> {
    cursor: LineCursor<R>,
    items: &'m PruneMapping,
}

impl<'m, R: BufRead> AttributeIter<'m, R> {
    /// Iterate `input`, keeping records whose item survived in `items`.
    pub fn new(input: R, stream: &str, items: &'m PruneMapping) -> Self {
        Self {
            cursor: LineCursor::new(input, stream),
            items,
        }
    }
}

impl<R: BufRead> Iterator for AttributeIter<'_, R> {
    type Item = Result<AttributeRecord, TencError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line_no = match self.cursor.advance()? {
                Ok(n) => n,
                Err(e) => return Some(Err(e)),
            };
            match parse_attribute(&self.cursor.buf, &self.cursor.stream, line_no) {
                Ok(record) => {
                    if let Some(mapped) = apply_to_attribute(self.items, &record) {
                        self.cursor.kept += 1;
                        return Some(Ok(mapped));
                    }
                }
                Err(e) => {
                    self.cursor.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
