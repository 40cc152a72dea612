//! # Archive Primitives
//!
//! Hardcoded constants of the tensor archive format.
//!
//! The names and suffixes below are part of the on-disk contract: downstream
//! encoders and older archives rely on them, so they are never derived from
//! runtime input.

// =============================================================================
// STREAM ROLES & SUFFIXES
// =============================================================================

/// Role token for the relation subscripts and the shape header.
pub const TENSOR_ROLE: &str = "tensor";

/// Role token for entity streams (index, attributes).
pub const ENTITIES_ROLE: &str = "entities";

/// Role token for predicate streams (index, attributes).
pub const PREDICATES_ROLE: &str = "predicates";

/// Role token for the entity-attribute index.
pub const ENTITY_ATTRIBUTES_ROLE: &str = "entities_attr";

/// Role token for the predicate-attribute index.
pub const PREDICATE_ATTRIBUTES_ROLE: &str = "predicates_attr";

/// Suffix for relation subscripts.
pub const SUBSCRIPT_SUFFIX: &str = "ten";

/// Suffix for attribute subscripts.
pub const ATTRIBUTE_SUFFIX: &str = "attr";

/// Suffix for the shape header.
pub const SHAPE_SUFFIX: &str = "size";

/// Suffix for index (id-map) streams.
pub const INDEX_SUFFIX: &str = "idx";

/// Suffix of the archive file itself.
pub const ARCHIVE_SUFFIX: &str = "tz";

/// Appended to a role token for index files written after pruning.
pub const PRUNED_MARKER: &str = "_pruned";

// =============================================================================
// CONTAINER FORMAT
// =============================================================================

/// Magic bytes at the start of every archive.
///
/// - File Header = Magic Bytes ("TENZ") + Version (u8).
pub const MAGIC_BYTES: &[u8; 4] = b"TENZ";

/// Current container format version.
///
/// Increment this when making breaking changes to the container layout.
pub const FORMAT_VERSION: u8 = 1;

/// Marker written as the very last bytes of a sealed archive.
///
/// An archive without it was never sealed and must be discarded.
pub const SEAL_MARKER: &[u8; 4] = b"TZOK";

/// Maximum accepted size of the serialized manifest.
///
/// Validated BEFORE the manifest is read to prevent allocation-based DoS
/// from corrupted trailers.
pub const MAX_MANIFEST_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// RECORD FORMAT
// =============================================================================

/// Number of decimals written for relation weights.
pub const WEIGHT_PRECISION: usize = 6;

/// Prefix of the header line of an index stream.
pub const INDEX_HEADER_PREFIX: &str = "length: ";

/// Default min-count for both entities and predicates.
pub const DEFAULT_MIN_COUNT: i64 = 1;
