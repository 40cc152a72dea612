//! # Export Module
//!
//! Read path of a sealed archive, with pruning applied.
//!
//! `ExportSession::open` reads only the shape header and derives the entity
//! and predicate mappings from it. Relations and attributes are streamed
//! lazily through those mappings; the archive itself is never modified.
//!
//! Output formats plug in through the [`Encoder`] trait.

use crate::TencError;
use crate::archive::{ArchiveReader, ArchiveStream, StreamKind, stream_file_name};
use crate::counter::OccurrenceCounter;
use crate::formats::{ShapeHeader, read_index, write_index};
use crate::primitives::{
    DEFAULT_MIN_COUNT, ENTITIES_ROLE, INDEX_SUFFIX, PREDICATES_ROLE, PRUNED_MARKER,
};
use crate::prune::{PruneMapping, compute_mapping_logged};
use crate::stream::{AttributeIter, RelationIter};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pruning thresholds. An id survives iff its occurrence count is strictly
/// greater than the threshold of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCounts {
    /// Threshold for entity occurrence counts.
    pub entities: i64,
    /// Threshold for predicate occurrence counts.
    pub predicates: i64,
}

impl MinCounts {
    /// Create thresholds for entities and predicates.
    #[must_use]
    pub const fn new(entities: i64, predicates: i64) -> Self {
        Self {
            entities,
            predicates,
        }
    }

    /// Thresholds that keep every id.
    #[must_use]
    pub const fn keep_all() -> Self {
        Self::new(-1, -1)
    }
}

impl Default for MinCounts {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COUNT, DEFAULT_MIN_COUNT)
    }
}

/// Restates a pruned archive in some output format.
pub trait Encoder {
    /// Short format name, e.g. `ntriples`.
    fn name(&self) -> &'static str;

    /// File extension of the output, without the dot.
    fn extension(&self) -> &'static str;

    /// Write the whole archive to `out`. Returns the number of records written.
    fn encode(&self, session: &ExportSession, out: &mut dyn Write) -> Result<u64, TencError>;
}

/// A sealed archive opened for pruned export.
#[derive(Debug)]
pub struct ExportSession {
    reader: ArchiveReader,
    shape: ShapeHeader,
    min_counts: MinCounts,
    entity_map: PruneMapping,
    predicate_map: PruneMapping,
}

impl ExportSession {
    /// Open `path` and compute the prune mappings for `min_counts`.
    pub fn open(path: impl AsRef<Path>, min_counts: MinCounts) -> Result<Self, TencError> {
        let reader = ArchiveReader::open(path)?;
        let name = reader.stream_name(StreamKind::Shape);
        let mut stream = reader.extract_stream(&name)?;
        let shape = ShapeHeader::read_from(&mut stream, &name)?;

        let entity_map =
            compute_mapping_logged(&shape.entity_occurrences, min_counts.entities, "entity");
        let predicate_map = compute_mapping_logged(
            &shape.predicate_occurrences,
            min_counts.predicates,
            "predicate",
        );

        Ok(Self {
            reader,
            shape,
            min_counts,
            entity_map,
            predicate_map,
        })
    }

    /// The underlying archive.
    #[must_use]
    pub fn archive(&self) -> &ArchiveReader {
        &self.reader
    }

    /// Shape header as stored in the archive.
    #[must_use]
    pub fn shape(&self) -> &ShapeHeader {
        &self.shape
    }

    /// Thresholds this session was opened with.
    #[must_use]
    pub fn min_counts(&self) -> MinCounts {
        self.min_counts
    }

    /// Old to new entity ids.
    #[must_use]
    pub fn entity_mapping(&self) -> &PruneMapping {
        &self.entity_map
    }

    /// Old to new predicate ids.
    #[must_use]
    pub fn predicate_mapping(&self) -> &PruneMapping {
        &self.predicate_map
    }

    /// Pruned relations as `(subject, predicate, object, weight)`.
    pub fn relations(&self) -> Result<RelationIter<'_, ArchiveStream>, TencError> {
        let (stream, name) = self.open_stream(StreamKind::Relations)?;
        Ok(RelationIter::new(
            stream,
            &name,
            &self.entity_map,
            &self.predicate_map,
        ))
    }

    /// Entity attributes of surviving entities.
    pub fn entity_attributes(&self) -> Result<AttributeIter<'_, ArchiveStream>, TencError> {
        let (stream, name) = self.open_stream(StreamKind::EntityAttributes)?;
        Ok(AttributeIter::new(stream, &name, &self.entity_map))
    }

    /// Predicate attributes of surviving predicates.
    pub fn predicate_attributes(&self) -> Result<AttributeIter<'_, ArchiveStream>, TencError> {
        let (stream, name) = self.open_stream(StreamKind::PredicateAttributes)?;
        Ok(AttributeIter::new(stream, &name, &self.predicate_map))
    }

    /// Entity keys in pruned id order.
    pub fn entity_index(&self) -> Result<Vec<String>, TencError> {
        let keys = self.read_checked_index(StreamKind::EntityIndex, self.shape.entity_count())?;
        Ok(self.entity_map.apply_to_keys(&keys))
    }

    /// Predicate keys in pruned id order.
    pub fn predicate_index(&self) -> Result<Vec<String>, TencError> {
        let keys =
            self.read_checked_index(StreamKind::PredicateIndex, self.shape.predicate_count())?;
        Ok(self.predicate_map.apply_to_keys(&keys))
    }

    /// Entity-attribute keys. Attribute ids are never pruned.
    pub fn entity_attribute_index(&self) -> Result<Vec<String>, TencError> {
        self.read_raw_index(StreamKind::EntityAttributeIndex)
    }

    /// Predicate-attribute keys. Attribute ids are never pruned.
    pub fn predicate_attribute_index(&self) -> Result<Vec<String>, TencError> {
        self.read_raw_index(StreamKind::PredicateAttributeIndex)
    }

    /// Shape header restricted to the survivors.
    ///
    /// Occurrences are recounted from the surviving relations, so relations
    /// dropped because one endpoint was pruned no longer count. The attribute
    /// nonzero counts are recounted from the attribute streams.
    pub fn pruned_shape(&self) -> Result<ShapeHeader, TencError> {
        let mut entities = OccurrenceCounter::with_len(self.entity_map.len());
        let mut predicates = OccurrenceCounter::with_len(self.predicate_map.len());
        for record in self.relations()? {
            let record = record?;
            entities.increment(record.subject);
            entities.increment(record.object);
            predicates.increment(record.predicate);
        }

        let entity_attribute_nnz = count_ok(self.entity_attributes()?)?;
        let predicate_attribute_nnz = count_ok(self.predicate_attributes()?)?;
        Ok(ShapeHeader {
            entity_occurrences: entities.to_vec(self.entity_map.len()),
            predicate_occurrences: predicates.to_vec(self.predicate_map.len()),
            entity_attribute_nnz,
            predicate_attribute_nnz,
        })
    }

    /// Write the pruned entity and predicate indexes as new files in `dir`.
    ///
    /// Files are named `[prefix-]{base}.entities_pruned.idx` and
    /// `[prefix-]{base}.predicates_pruned.idx`. Returns their paths.
    pub fn write_pruned_indexes(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, TencError> {
        let dir = dir.as_ref();
        let entity_keys = self.entity_index()?;
        let predicate_keys = self.predicate_index()?;

        let mut written = Vec::with_capacity(2);
        for (role, keys) in [(ENTITIES_ROLE, &entity_keys), (PREDICATES_ROLE, &predicate_keys)] {
            let name = stream_file_name(
                self.reader.base_name(),
                &format!("{}{}", role, PRUNED_MARKER),
                INDEX_SUFFIX,
                self.reader.prefix(),
            );
            let path = dir.join(name);
            write_index_file(&path, keys)?;
            tracing::debug!("Wrote {} keys to {}", keys.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn open_stream(&self, kind: StreamKind) -> Result<(ArchiveStream, String), TencError> {
        let name = self.reader.stream_name(kind);
        let stream = self.reader.extract_stream(&name)?;
        Ok((stream, name))
    }

    fn read_raw_index(&self, kind: StreamKind) -> Result<Vec<String>, TencError> {
        let (mut stream, name) = self.open_stream(kind)?;
        read_index(&mut stream, &name)
    }

    fn read_checked_index(
        &self,
        kind: StreamKind,
        expected: usize,
    ) -> Result<Vec<String>, TencError> {
        let keys = self.read_raw_index(kind)?;
        if keys.len() != expected {
            return Err(TencError::format(
                self.reader.stream_name(kind),
                format!(
                    "index holds {} keys but the shape header declares {}",
                    keys.len(),
                    expected
                ),
            ));
        }
        Ok(keys)
    }
}

fn count_ok<T>(iter: impl Iterator<Item = Result<T, TencError>>) -> Result<u64, TencError> {
    let mut n = 0u64;
    for item in iter {
        item?;
        n += 1;
    }
    Ok(n)
}

/// Write an index file next to an archive, replacing any previous one.
fn write_index_file(path: &Path, keys: &[String]) -> Result<(), TencError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".tenc-")
        .suffix(".partial")
        .tempfile_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write_index(&mut out, keys.iter().map(String::as_str))?;
        out.flush()?;
    }
    tmp.persist(path).map_err(|e| TencError::Io(e.error))?;
    Ok(())
}

/// BLAKE3 hex digest of the archive file at `path`.
///
/// Only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
pub fn archive_digest(path: impl AsRef<Path>) -> Result<String, TencError> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use crate::ingestor::ConversionSession;
    use crate::{AttributeAssertion, AttributeTarget, RelationRecord, Triple};

    /// `a r b`, `a r c`, `b s c` plus one entity attribute on `c`.
    fn small_archive(dir: &Path, prefix: Option<&str>) -> PathBuf {
        let mut session = ConversionSession::new_in(dir).expect("session");
        session.add_relation(&Triple::new("a", "r", "b", 1.0)).expect("add");
        session.add_relation(&Triple::new("a", "r", "c", 1.0)).expect("add");
        session.add_relation(&Triple::new("b", "s", "c", 0.5)).expect("add");
        session
            .add_attribute(&AttributeAssertion::new("c", AttributeTarget::Entity, "type,Thing"))
            .expect("add");
        let writer = ArchiveWriter::create(dir, "g", prefix).expect("writer");
        session.finish(writer).expect("finish")
    }

    #[test]
    fn keep_all_exports_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = small_archive(dir.path(), None);
        let export = ExportSession::open(archive, MinCounts::keep_all()).expect("open");

        assert_eq!(export.entity_index().expect("index"), vec!["a", "b", "c"]);
        assert_eq!(export.predicate_index().expect("index"), vec!["r", "s"]);
        assert_eq!(export.entity_attribute_index().expect("index"), vec!["type,Thing"]);
        assert!(export.predicate_attribute_index().expect("index").is_empty());

        let relations: Vec<RelationRecord> = export
            .relations()
            .expect("relations")
            .collect::<Result<_, _>>()
            .expect("iterate");
        assert_eq!(relations.len(), 3);
        assert_eq!(relations[2], RelationRecord::new(1, 1, 2, 0.5));
    }

    #[test]
    fn default_thresholds_drop_singletons() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = small_archive(dir.path(), None);
        let export = ExportSession::open(archive, MinCounts::default()).expect("open");

        // Entity counts [2, 2, 2], predicate counts [2, 1].
        assert_eq!(export.entity_index().expect("index"), vec!["a", "b", "c"]);
        assert_eq!(export.predicate_index().expect("index"), vec!["r"]);

        let relations: Vec<RelationRecord> = export
            .relations()
            .expect("relations")
            .collect::<Result<_, _>>()
            .expect("iterate");
        assert_eq!(
            relations,
            vec![
                RelationRecord::new(0, 0, 1, 1.0),
                RelationRecord::new(0, 0, 2, 1.0),
            ]
        );

        let shape = export.pruned_shape().expect("shape");
        assert_eq!(shape.entity_occurrences, vec![2, 1, 1]);
        assert_eq!(shape.predicate_occurrences, vec![2]);
        assert_eq!(shape.entity_attribute_nnz, 1);
        assert_eq!(shape.relation_count(), 2);
    }

    #[test]
    fn pruned_indexes_are_new_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = small_archive(dir.path(), Some("run"));
        let before = std::fs::read(&archive).expect("read");

        let export = ExportSession::open(&archive, MinCounts::new(2, 1)).expect("open");
        let out = tempfile::tempdir().expect("out");
        let paths = export.write_pruned_indexes(out.path()).expect("write");

        assert!(paths[0].ends_with("run-g.entities_pruned.idx"));
        assert!(paths[1].ends_with("run-g.predicates_pruned.idx"));
        assert_eq!(std::fs::read_to_string(&paths[0]).expect("read"), "length: 0\n");
        assert_eq!(std::fs::read_to_string(&paths[1]).expect("read"), "length: 1\nr\n");
        assert_eq!(std::fs::read(&archive).expect("read"), before);
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn digest_is_stable_hex() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = small_archive(dir.path(), None);
        let first = archive_digest(&archive).expect("digest");
        assert_eq!(first.len(), 64);
        assert_eq!(archive_digest(&archive).expect("digest"), first);
    }
}
