//! # Shape Header
//!
//! Size of the tensor and the occurrence statistics that drive pruning.
//!
//! Wire format: one decimal integer per line, positional, no field names.
//!
//! ```text
//! line 1:        N (number of entities)
//! line 2:        K (number of predicates)
//! next N lines:  occurrences of entity 0..N-1
//! next K lines:  occurrences of predicate 0..K-1
//! next line:     entity-attribute nonzero count
//! last line:     predicate-attribute nonzero count
//! ```

use crate::TencError;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Entity/predicate counts of an archive plus per-id occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeHeader {
    /// Occurrences per entity id (length N).
    pub entity_occurrences: Vec<u64>,
    /// Occurrences per predicate id (length K).
    pub predicate_occurrences: Vec<u64>,
    /// Distinct (entity, attribute) pairs.
    pub entity_attribute_nnz: u64,
    /// Distinct (predicate, attribute) pairs.
    pub predicate_attribute_nnz: u64,
}

impl ShapeHeader {
    /// Number of entities (N).
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_occurrences.len()
    }

    /// Number of predicates (K).
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.predicate_occurrences.len()
    }

    /// Number of relation records; every relation counts once for its predicate.
    #[must_use]
    pub fn relation_count(&self) -> u64 {
        self.predicate_occurrences
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// Encode the header.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), TencError> {
        writeln!(out, "{}", self.entity_count())?;
        writeln!(out, "{}", self.predicate_count())?;
        for count in self.entity_occurrences.iter().chain(&self.predicate_occurrences) {
            writeln!(out, "{}", count)?;
        }
        writeln!(out, "{}", self.entity_attribute_nnz)?;
        writeln!(out, "{}", self.predicate_attribute_nnz)?;
        Ok(())
    }

    /// Encode the header into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TencError> {
        let mut out = Vec::with_capacity(16 + 4 * (self.entity_count() + self.predicate_count()));
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Decode a header. `stream` names the source for error messages.
    pub fn read_from<R: BufRead>(input: &mut R, stream: &str) -> Result<Self, TencError> {
        let mut reader = IntReader {
            input,
            stream,
            line_no: 0,
            buf: String::new(),
        };

        let n = reader.next("entity count")?;
        let k = reader.next("predicate count")?;

        let mut entity_occurrences = Vec::with_capacity(n.min(1 << 20) as usize);
        for _ in 0..n {
            entity_occurrences.push(reader.next("entity occurrence")?);
        }
        let mut predicate_occurrences = Vec::with_capacity(k.min(1 << 20) as usize);
        for _ in 0..k {
            predicate_occurrences.push(reader.next("predicate occurrence")?);
        }

        let entity_attribute_nnz = reader.next("entity attribute count")?;
        let predicate_attribute_nnz = reader.next("predicate attribute count")?;

        Ok(Self {
            entity_occurrences,
            predicate_occurrences,
            entity_attribute_nnz,
            predicate_attribute_nnz,
        })
    }
}

/// Reads one integer per line, tracking the line number for errors.
struct IntReader<'a, R> {
    input: &'a mut R,
    stream: &'a str,
    line_no: u64,
    buf: String,
}

impl<R: BufRead> IntReader<'_, R> {
    fn next(&mut self, field: &str) -> Result<u64, TencError> {
        self.buf.clear();
        self.line_no += 1;
        let n = self.input.read_line(&mut self.buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                TencError::format_at(self.stream, self.line_no, "invalid UTF-8")
            } else {
                TencError::Io(e)
            }
        })?;
        if n == 0 {
            return Err(TencError::format_at(
                self.stream,
                self.line_no,
                format!("missing {}", field),
            ));
        }
        self.buf.trim().parse::<u64>().map_err(|_| {
            TencError::format_at(
                self.stream,
                self.line_no,
                format!("expected {} but found {:?}", field, self.buf.trim()),
            )
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
