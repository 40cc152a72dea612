//! # Core Type Definitions
//!
//! This module contains the shared types of the tensor archive engine:
//! - Canonical input events (`Triple`, `AttributeAssertion`, `Event`)
//! - Persisted records (`RelationRecord`, `AttributeRecord`)
//! - Error types (`TencError`)
//!
//! ## Identifier Model
//!
//! All identifiers are dense `u64` indices assigned in first-seen order.
//! Entities, predicates, entity attributes and predicate attributes each
//! have their own id space.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// INPUT EVENTS
// =============================================================================

/// A relation triple as produced by an external reader.
///
/// The weight is carried through unchanged into the relation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// Subject entity key.
    pub subject: String,
    /// Predicate key.
    pub predicate: String,
    /// Object entity key.
    pub object: String,
    /// Relation weight; must be finite.
    pub weight: f64,
}

impl Triple {
    /// Create a new triple.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            weight,
        }
    }
}

/// Which id space an attribute assertion is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeTarget {
    /// The item is an entity.
    Entity,
    /// The item is a predicate.
    Predicate,
}

/// An attribute observed on an entity or predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAssertion {
    /// The entity or predicate carrying the attribute.
    pub item: String,
    /// The id space of `item`.
    pub target: AttributeTarget,
    /// The attribute key.
    pub attribute: String,
}

impl AttributeAssertion {
    /// Create a new attribute assertion.
    #[must_use]
    pub fn new(
        item: impl Into<String>,
        target: AttributeTarget,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            target,
            attribute: attribute.into(),
        }
    }
}

/// A canonical event consumed by the conversion session.
///
/// Whether a predicate denotes a relation or an attribute is decided by the
/// caller before the event is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A weighted relation between two entities.
    Relation(Triple),
    /// An attribute of an entity or predicate.
    Attribute(AttributeAssertion),
}

// =============================================================================
// PERSISTED RECORDS
// =============================================================================

/// One relation of the tensor: `(subject, predicate, object, weight)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Subject entity id.
    pub subject: u64,
    /// Predicate id.
    pub predicate: u64,
    /// Object entity id.
    pub object: u64,
    /// Relation weight.
    pub weight: f64,
}

impl RelationRecord {
    /// Create a new relation record.
    #[must_use]
    pub const fn new(subject: u64, predicate: u64, object: u64, weight: f64) -> Self {
        Self {
            subject,
            predicate,
            object,
            weight,
        }
    }
}

/// Multiplicity of one attribute on one item. Absent pairs have count 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Entity or predicate id.
    pub item: u64,
    /// Attribute id; never pruned.
    pub attribute: u64,
    /// Number of times the attribute was seen on the item.
    pub count: u64,
}

impl AttributeRecord {
    /// Create a new attribute record.
    #[must_use]
    pub const fn new(item: u64, attribute: u64, count: u64) -> Self {
        Self {
            item,
            attribute,
            count,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the tensor archive engine.
///
/// - No silent failures and no retries
/// - Use `Result<T, TencError>` for fallible operations
/// - Errors carry the archive and stream names needed to tell corruption
///   apart from misuse
#[derive(Debug, Error)]
pub enum TencError {
    /// A stream of the archive could not be parsed.
    #[error("Format error in {stream}: {message}")]
    Format { stream: String, message: String },

    /// The operation is not allowed in the current lifecycle state.
    #[error("State error: {0}")]
    State(String),

    /// The requested stream does not exist in the archive.
    #[error("Stream not found: {name} (archive {archive})")]
    NotFound { archive: String, name: String },

    /// A reverse lookup was attempted for an id that was never interned.
    #[error("Id {id} out of range for table of size {size}")]
    Index { id: u64, size: u64 },

    /// An input event or argument was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TencError {
    /// Build a format error for the given stream.
    pub fn format(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Build a format error pointing at a 1-based line of a stream.
    pub fn format_at(stream: &str, line: u64, message: impl std::fmt::Display) -> Self {
        Self::Format {
            stream: stream.to_string(),
            message: format!("line {}: {}", line, message),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
