//! # tenc-core
//!
//! The tensor archive engine for tenc - THE LOGIC.
//!
//! Turns a stream of weighted subject-predicate-object triples and side
//! attributes into a sealed archive of integer subscripts, index tables and
//! occurrence statistics, and reads it back with min-count pruning applied.
//!
//! ## Pipeline
//!
//! ```text
//! Event ──▶ ConversionSession ──finish──▶ <base>.tz
//!            (SymbolTable, OccurrenceCounter, RecordWriter)
//!
//! <base>.tz ──▶ ExportSession (ShapeHeader ─▶ PruneMapping)
//!                 └─▶ RelationIter / AttributeIter ──▶ Encoder
//! ```
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - Deterministic: ids in first-seen order, `BTreeMap` only
//! - Relation data is streamed; only symbols and counts live in memory
//! - Archives are write-once; pruning never touches a sealed archive

// =============================================================================
// MODULES
// =============================================================================

pub mod archive;
pub mod counter;
pub mod export;
pub mod formats;
pub mod ingestor;
pub mod primitives;
pub mod prune;
pub mod stream;
pub mod symbols;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttributeAssertion, AttributeRecord, AttributeTarget, Event, RelationRecord, TencError, Triple,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use archive::{ArchiveReader, ArchiveStream, ArchiveWriter, StreamKind};
pub use counter::OccurrenceCounter;
pub use export::{Encoder, ExportSession, MinCounts};
pub use ingestor::{ConversionSession, SessionStats};
pub use prune::{PruneMapping, apply_to_attribute, apply_to_relation, compute_mapping};
pub use stream::{AttributeIter, RecordWriter, RelationIter};
pub use symbols::SymbolTable;

#[cfg(feature = "crypto-hash")]
pub use export::archive_digest;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{ShapeHeader, read_index, write_index};
