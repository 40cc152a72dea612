//! # Symbol Tables
//!
//! First-seen-order interning of string keys into dense `u64` ids.
//!
//! One table exists per id space (entities, predicates, entity attributes,
//! predicate attributes). Ids are assigned 0, 1, 2, ... and never change; the
//! table is the inverse of the index stream written into the archive.

use crate::TencError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered, injective mapping from string key to dense id.
///
/// Keys are stored once and shared between the id-ordered vector and the
/// lookup index.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Keys in id order. Position == id.
    keys: Vec<Arc<str>>,
    /// Key -> id lookup.
    index: BTreeMap<Arc<str>, u64>,
}

impl SymbolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `key`, allocating the next id on first sight.
    pub fn intern(&mut self, key: &str) -> u64 {
        if let Some(&id) = self.index.get(key) {
            return id;
        }
        let id = self.keys.len() as u64;
        let shared: Arc<str> = Arc::from(key);
        self.keys.push(Arc::clone(&shared));
        self.index.insert(shared, id);
        id
    }

    /// Look up the id of a key without interning it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).copied()
    }

    /// Return the key interned under `id`.
    ///
    /// Returns `TencError::Index` if the id was never allocated.
    pub fn reverse_lookup(&self, id: u64) -> Result<&str, TencError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.keys.get(i))
            .map(|k| &**k)
            .ok_or(TencError::Index {
                id,
                size: self.keys.len() as u64,
            })
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if nothing was interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in id order, without gaps.
    pub fn export_ordered(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.keys.iter().map(|k| &**k)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_assigns_sequential_ids() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("a"), 0);
        assert_eq!(table.intern("b"), 1);
        assert_eq!(table.intern("c"), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn intern_is_stable() {
        let mut table = SymbolTable::new();
        let first = table.intern("x");
        table.intern("y");
        assert_eq!(table.intern("x"), first);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reverse_lookup_out_of_range() {
        let mut table = SymbolTable::new();
        table.intern("only");

        assert_eq!(table.reverse_lookup(0).expect("lookup"), "only");
        let err = table.reverse_lookup(1).expect_err("out of range");
        assert!(matches!(err, TencError::Index { id: 1, size: 1 }));
    }

    #[test]
    fn export_ordered_follows_ids() {
        let mut table = SymbolTable::new();
        for key in ["e1", "e0", "e1", "e2"] {
            table.intern(key);
        }
        let keys: Vec<&str> = table.export_ordered().collect();
        assert_eq!(keys, vec!["e1", "e0", "e2"]);
    }

    #[test]
    fn empty_key_is_a_key() {
        let mut table = SymbolTable::new();
        assert!(table.is_empty());
        assert_eq!(table.intern(""), 0);
        assert_eq!(table.get(""), Some(0));
        assert_eq!(table.get("missing"), None);
    }
}
