//! # Archive Container
//!
//! A sealed bundle of named byte streams. One archive holds one conversion
//! job: the shape header, the relation subscripts, two attribute streams and
//! four index streams.
//!
//! ## Lifecycle
//!
//! ```text
//! ArchiveWriter::create ──append_*──▶ seal() ──▶ <dir>/[prefix-]<base>.tz
//!                                                       │
//!                              ArchiveReader::open ◀────┘ (read-only)
//! ```
//!
//! A sealed archive is never modified. Pruning writes new index files next
//! to it instead.
//!
//! ## Naming
//!
//! Streams are named `{base}.{role}.{suffix}`, or
//! `{prefix}-{base}.{role}.{suffix}` when a prefix is given.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{ArchiveManifest, ManifestEntry};
pub use reader::{ArchiveReader, ArchiveStream};
pub use writer::ArchiveWriter;

use crate::primitives::{
    ARCHIVE_SUFFIX, ATTRIBUTE_SUFFIX, ENTITIES_ROLE, ENTITY_ATTRIBUTES_ROLE, INDEX_SUFFIX,
    PREDICATE_ATTRIBUTES_ROLE, PREDICATES_ROLE, SHAPE_SUFFIX, SUBSCRIPT_SUFFIX, TENSOR_ROLE,
};

/// The eight streams every archive written by the engine contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    /// Shape header (`tensor.size`).
    Shape,
    /// Relation subscripts (`tensor.ten`).
    Relations,
    /// Entity attribute subscripts (`entities.attr`).
    EntityAttributes,
    /// Predicate attribute subscripts (`predicates.attr`).
    PredicateAttributes,
    /// Entity index (`entities.idx`).
    EntityIndex,
    /// Predicate index (`predicates.idx`).
    PredicateIndex,
    /// Entity-attribute index (`entities_attr.idx`).
    EntityAttributeIndex,
    /// Predicate-attribute index (`predicates_attr.idx`).
    PredicateAttributeIndex,
}

impl StreamKind {
    /// All kinds, in the order the ingestor appends them.
    pub const ALL: [StreamKind; 8] = [
        StreamKind::Shape,
        StreamKind::Relations,
        StreamKind::EntityAttributes,
        StreamKind::PredicateAttributes,
        StreamKind::EntityIndex,
        StreamKind::PredicateIndex,
        StreamKind::EntityAttributeIndex,
        StreamKind::PredicateAttributeIndex,
    ];

    /// Role token of this stream.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Shape | Self::Relations => TENSOR_ROLE,
            Self::EntityAttributes | Self::EntityIndex => ENTITIES_ROLE,
            Self::PredicateAttributes | Self::PredicateIndex => PREDICATES_ROLE,
            Self::EntityAttributeIndex => ENTITY_ATTRIBUTES_ROLE,
            Self::PredicateAttributeIndex => PREDICATE_ATTRIBUTES_ROLE,
        }
    }

    /// Fixed suffix of this stream.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Shape => SHAPE_SUFFIX,
            Self::Relations => SUBSCRIPT_SUFFIX,
            Self::EntityAttributes | Self::PredicateAttributes => ATTRIBUTE_SUFFIX,
            Self::EntityIndex
            | Self::PredicateIndex
            | Self::EntityAttributeIndex
            | Self::PredicateAttributeIndex => INDEX_SUFFIX,
        }
    }

    /// Canonical stream name inside an archive.
    #[must_use]
    pub fn file_name(self, base_name: &str, prefix: Option<&str>) -> String {
        stream_file_name(base_name, self.role(), self.suffix(), prefix)
    }
}

/// Join a stem and suffix, with an optional `prefix-` in front.
#[must_use]
pub fn join_name(stem: &str, suffix: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{}-{}.{}", p, stem, suffix),
        None => format!("{}.{}", stem, suffix),
    }
}

/// Canonical name `{base}.{role}.{suffix}` (or `{prefix}-...`).
#[must_use]
pub fn stream_file_name(base_name: &str, role: &str, suffix: &str, prefix: Option<&str>) -> String {
    join_name(&format!("{}.{}", base_name, role), suffix, prefix)
}

/// File name of the archive itself.
#[must_use]
pub fn archive_file_name(base_name: &str, prefix: Option<&str>) -> String {
    join_name(base_name, ARCHIVE_SUFFIX, prefix)
}
