//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the archive engine is INVALID.
//!
//! ## Tiers
//! - T0: Symbol Integrity
//! - T1: Archive Lifecycle
//! - T2: End-to-End Conversion
//! - T3: Pruned Export

use std::io::Cursor;
use std::path::{Path, PathBuf};
use tenc_core::{
    ArchiveReader, ArchiveWriter, ConversionSession, ExportSession, MinCounts, RelationRecord,
    ShapeHeader, StreamKind, SymbolTable, TencError, Triple, read_index, write_index,
};

fn collect_relations(export: &ExportSession) -> Vec<RelationRecord> {
    export
        .relations()
        .expect("relations")
        .collect::<Result<_, _>>()
        .expect("iterate")
}

// =============================================================================
// TIER T0: SYMBOL INTEGRITY
// =============================================================================

mod t0_symbol_integrity {
    use super::*;

    /// T0.1: N distinct keys get ids 0..N in first-seen order.
    #[test]
    fn distinct_keys_get_dense_ids() {
        let mut table = SymbolTable::new();
        let ids: Vec<u64> = ["x", "y", "x", "z", "y"]
            .iter()
            .map(|k| table.intern(k))
            .collect();
        assert_eq!(ids, vec![0, 1, 0, 2, 1]);
        assert_eq!(table.len(), 3);
    }

    /// T0.2: Reverse lookup of an unknown id is an index error.
    #[test]
    fn unknown_id_is_index_error() {
        let mut table = SymbolTable::new();
        table.intern("only");
        assert!(matches!(
            table.reverse_lookup(1),
            Err(TencError::Index { id: 1, size: 1 })
        ));
    }

    /// T0.3: Empty and unicode keys survive an index round trip.
    #[test]
    fn index_roundtrip_with_edge_keys() {
        let mut table = SymbolTable::new();
        for key in ["", "ünïcödé", "<http://example.org/a b>", "日本"] {
            table.intern(key);
        }
        let mut bytes = Vec::new();
        write_index(&mut bytes, table.export_ordered()).expect("write");
        let decoded = read_index(&mut Cursor::new(bytes), "t0.idx").expect("read");
        assert_eq!(decoded, vec!["", "ünïcödé", "<http://example.org/a b>", "日本"]);
    }
}

// =============================================================================
// TIER T1: ARCHIVE LIFECYCLE
// =============================================================================

mod t1_archive_lifecycle {
    use super::*;

    /// T1.1: Every appended stream comes back byte-identical.
    #[test]
    fn streams_roundtrip_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let streams: Vec<(String, Vec<u8>)> = vec![
            ("one".to_string(), b"length: 2\na\nb\n".to_vec()),
            ("two".to_string(), (0u8..=255).cycle().take(70_000).collect()),
            ("three".to_string(), Vec::new()),
        ];

        let mut writer = ArchiveWriter::create(dir.path(), "rt", None).expect("create");
        for (name, bytes) in &streams {
            writer.append_bytes(name.clone(), bytes.clone()).expect("append");
        }
        let path = writer.seal().expect("seal");

        let reader = ArchiveReader::open(&path).expect("open");
        for (name, bytes) in &streams {
            assert_eq!(&reader.extract_bytes(name).expect("extract"), bytes, "{name}");
        }
    }

    /// T1.2: A sealed writer rejects further appends.
    #[test]
    fn sealed_archive_is_immutable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = ArchiveWriter::create(dir.path(), "rt", None).expect("create");
        writer.seal().expect("seal");
        assert!(matches!(
            writer.append_bytes("late", b"x".to_vec()),
            Err(TencError::State(_))
        ));
    }

    /// T1.3: Absent streams are reported as not found.
    #[test]
    fn absent_stream_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = ArchiveWriter::create(dir.path(), "rt", None).expect("create");
        let path = writer.seal().expect("seal");
        let reader = ArchiveReader::open(&path).expect("open");
        assert!(matches!(
            reader.extract(StreamKind::Relations),
            Err(TencError::NotFound { .. })
        ));
    }

    /// T1.4: A truncated archive is never mistaken for a sealed one.
    #[test]
    fn truncated_archive_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = ArchiveWriter::create(dir.path(), "rt", None).expect("create");
        writer.append_bytes("s", vec![1u8; 4096]).expect("append");
        let path = writer.seal().expect("seal");

        let bytes = std::fs::read(&path).expect("read");
        std::fs::write(&path, &bytes[..bytes.len() - 3]).expect("truncate");
        assert!(matches!(
            ArchiveReader::open(&path),
            Err(TencError::State(_))
        ));
    }
}

// =============================================================================
// TIER T2: END-TO-END CONVERSION
// =============================================================================

mod t2_end_to_end {
    use super::*;

    fn convert(dir: &Path) -> PathBuf {
        let mut session = ConversionSession::new_in(dir).expect("session");
        for (s, o) in [("a", "b"), ("a", "c"), ("b", "c")] {
            session
                .add_relation(&Triple::new(s, "r", o, 1.0))
                .expect("add");
        }
        let writer = ArchiveWriter::create(dir, "abc", None).expect("writer");
        session.finish(writer).expect("finish")
    }

    /// T2.1: Indexes, counts and relations of the three-triple graph.
    #[test]
    fn three_triples_threshold_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export = ExportSession::open(convert(dir.path()), MinCounts::new(0, 0)).expect("open");

        assert_eq!(export.entity_index().expect("entities"), vec!["a", "b", "c"]);
        assert_eq!(export.predicate_index().expect("predicates"), vec!["r"]);
        assert_eq!(export.shape().entity_occurrences, vec![2, 2, 2]);
        assert_eq!(export.shape().predicate_occurrences, vec![3]);
        assert_eq!(
            collect_relations(&export),
            vec![
                RelationRecord::new(0, 0, 1, 1.0),
                RelationRecord::new(0, 0, 2, 1.0),
                RelationRecord::new(1, 0, 2, 1.0),
            ]
        );
    }

    /// T2.2: Raw streams use the documented text encodings.
    #[test]
    fn raw_streams_match_encoding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = ArchiveReader::open(convert(dir.path())).expect("open");

        let shape = reader
            .extract_bytes(&reader.stream_name(StreamKind::Shape))
            .expect("shape");
        assert_eq!(shape, b"3\n1\n2\n2\n2\n3\n0\n0\n");

        let relations = reader
            .extract_bytes(&reader.stream_name(StreamKind::Relations))
            .expect("relations");
        assert_eq!(
            relations,
            b"0 1 0 1.000000\n0 2 0 1.000000\n1 2 0 1.000000\n"
        );

        let entities = reader
            .extract_bytes(&reader.stream_name(StreamKind::EntityIndex))
            .expect("entities");
        assert_eq!(entities, b"length: 3\na\nb\nc\n");
    }

    /// T2.3: Converting the same input twice yields identical archives.
    #[test]
    fn conversion_is_deterministic() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        let a = std::fs::read(convert(first.path())).expect("read");
        let b = std::fs::read(convert(second.path())).expect("read");
        assert_eq!(a, b);
    }
}

// =============================================================================
// TIER T3: PRUNED EXPORT
// =============================================================================

mod t3_pruned_export {
    use super::*;

    /// Five entities, two predicates; entity 2 has occurrence count 0 even
    /// though relations reference it.
    fn synthetic_archive(dir: &Path) -> PathBuf {
        let shape = ShapeHeader {
            entity_occurrences: vec![3, 2, 0, 2, 1],
            predicate_occurrences: vec![3, 2],
            entity_attribute_nnz: 0,
            predicate_attribute_nnz: 0,
        };
        let relations = "0 1 0 1.000000\n\
                         0 2 0 1.000000\n\
                         2 3 1 1.000000\n\
                         3 4 1 0.500000\n\
                         1 0 0 2.000000\n";

        let mut writer = ArchiveWriter::create(dir, "syn", None).expect("create");
        writer
            .append_bytes(
                writer.stream_name(StreamKind::Shape),
                shape.to_bytes().expect("shape"),
            )
            .expect("append");
        writer
            .append_bytes(
                writer.stream_name(StreamKind::Relations),
                relations.as_bytes().to_vec(),
            )
            .expect("append");
        for kind in [StreamKind::EntityAttributes, StreamKind::PredicateAttributes] {
            writer
                .append_bytes(writer.stream_name(kind), Vec::new())
                .expect("append");
        }
        for (kind, keys) in [
            (StreamKind::EntityIndex, vec!["e0", "e1", "e2", "e3", "e4"]),
            (StreamKind::PredicateIndex, vec!["p0", "p1"]),
            (StreamKind::EntityAttributeIndex, vec![]),
            (StreamKind::PredicateAttributeIndex, vec![]),
        ] {
            let mut bytes = Vec::new();
            write_index(&mut bytes, keys).expect("index");
            writer
                .append_bytes(writer.stream_name(kind), bytes)
                .expect("append");
        }
        writer.seal().expect("seal")
    }

    /// T3.1: Entity 2 and every relation touching it disappear.
    #[test]
    fn zero_count_entity_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export =
            ExportSession::open(synthetic_archive(dir.path()), MinCounts::new(0, 0)).expect("open");

        assert_eq!(
            export.entity_index().expect("entities"),
            vec!["e0", "e1", "e3", "e4"]
        );
        assert_eq!(export.predicate_index().expect("predicates"), vec!["p0", "p1"]);
        assert_eq!(
            collect_relations(&export),
            vec![
                RelationRecord::new(0, 0, 1, 1.0),
                RelationRecord::new(2, 1, 3, 0.5),
                RelationRecord::new(1, 0, 0, 2.0),
            ]
        );
    }

    /// T3.2: A predicate below the threshold removes its relations.
    #[test]
    fn pruned_predicate_drops_relations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export =
            ExportSession::open(synthetic_archive(dir.path()), MinCounts::new(0, 2)).expect("open");

        assert_eq!(export.predicate_index().expect("predicates"), vec!["p0"]);
        assert!(collect_relations(&export).iter().all(|r| r.predicate == 0));
        assert_eq!(collect_relations(&export).len(), 2);
    }

    /// T3.3: A threshold at the maximum count empties the export.
    #[test]
    fn threshold_at_max_exports_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export =
            ExportSession::open(synthetic_archive(dir.path()), MinCounts::new(3, 3)).expect("open");

        assert!(export.entity_index().expect("entities").is_empty());
        assert!(collect_relations(&export).is_empty());
        assert_eq!(export.pruned_shape().expect("shape").relation_count(), 0);
    }

    /// T3.4: Pruning leaves the archive file untouched.
    #[test]
    fn archive_unchanged_by_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = synthetic_archive(dir.path());
        let before = std::fs::read(&path).expect("read");

        let export = ExportSession::open(&path, MinCounts::new(1, 1)).expect("open");
        export.write_pruned_indexes(dir.path()).expect("write");
        let _ = collect_relations(&export);

        assert_eq!(std::fs::read(&path).expect("read"), before);
        assert!(dir.path().join("syn.entities_pruned.idx").exists());
    }

    /// T3.5: The pruned shape counts only relations that survived.
    #[test]
    fn pruned_shape_matches_surviving_relations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export =
            ExportSession::open(synthetic_archive(dir.path()), MinCounts::new(0, 0)).expect("open");
        let shape = export.pruned_shape().expect("shape");

        assert_eq!(shape.relation_count(), collect_relations(&export).len() as u64);
        assert_eq!(shape.relation_count(), 3);
        assert_eq!(shape.entity_occurrences, vec![2, 2, 1, 1]);
        assert_eq!(shape.predicate_occurrences, vec![2, 1]);
    }
}
