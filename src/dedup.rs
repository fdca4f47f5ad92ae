//! Insertion-ordered deduplication for token collections.

use std::collections::HashSet;

use serde::Serialize;

/// Stable key for a style record: its JSON serialization.
///
/// Struct fields serialize in declaration order, so two records with equal
/// fields always produce the same key.
pub fn canonical_key<T: Serialize>(record: &T) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

/// Collects values, keeping the first occurrence of each key in order.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    seen: HashSet<String>,
    items: Vec<T>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }
}

impl<T> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under an explicit key. Returns false for a repeat.
    pub fn insert_keyed(&mut self, key: String, item: T) -> bool {
        if !self.seen.insert(key) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl OrderedSet<String> {
    pub fn insert(&mut self, value: String) -> bool {
        self.insert_keyed(value.clone(), value)
    }
}

impl<T: Serialize> OrderedSet<T> {
    /// Insert a structured record, deduplicated by full-field equality.
    pub fn insert_record(&mut self, record: T) -> bool {
        let key = canonical_key(&record);
        self.insert_keyed(key, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Swatch {
        fill: &'static str,
        ink: &'static str,
    }

    #[test]
    fn keeps_first_seen_order() {
        let mut set = OrderedSet::new();
        for v in ["#111", "#222", "#111", "#333", "#222"] {
            set.insert(v.to_string());
        }
        assert_eq!(set.into_vec(), vec!["#111", "#222", "#333"]);
    }

    #[test]
    fn records_collapse_on_full_equality() {
        let mut set = OrderedSet::new();
        assert!(set.insert_record(Swatch { fill: "#111", ink: "#fff" }));
        assert!(!set.insert_record(Swatch { fill: "#111", ink: "#fff" }));
        assert!(set.insert_record(Swatch { fill: "#111", ink: "#000" }));
        assert_eq!(set.len(), 2);
    }
}
