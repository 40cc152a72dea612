//! # Occurrence Counters
//!
//! Per-id incidence counts accumulated during ingestion. The caller decides
//! what an occurrence is (endpoint appearance for entities, triple use for
//! predicates).

/// Dense id -> count mapping. Ids never incremented read as 0.
///
/// Uses saturating arithmetic, so counts never wrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceCounter {
    counts: Vec<u64>,
}

impl OccurrenceCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter for a category of `len` ids, all zero.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Add one occurrence for `id`.
    pub fn increment(&mut self, id: u64) {
        let idx = id as usize;
        if idx >= self.counts.len() {
            self.counts.resize(idx + 1, 0);
        }
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    /// Current count for `id`.
    #[must_use]
    pub fn get(&self, id: u64) -> u64 {
        self.counts.get(id as usize).copied().unwrap_or(0)
    }

    /// Dense vector of the first `len` counts, zero-padded.
    #[must_use]
    pub fn to_vec(&self, len: usize) -> Vec<u64> {
        let mut out: Vec<u64> = self.counts.iter().copied().take(len).collect();
        out.resize(len, 0);
        out
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }
}
