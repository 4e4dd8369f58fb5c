use serde::Serialize;
use std::collections::HashMap;

/// Table of shared strings referenced by index from string cells.
///
/// Index assignment follows insertion order. [`StringPool::insert`] returns
/// the existing index for text already in the pool; [`StringPool::push`]
/// always appends.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StringPool {
    strings: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            strings: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Intern `text`, reusing its index when already present
    pub fn insert(&mut self, text: &str) -> usize {
        if let Some(&idx) = self.index.get(text) {
            return idx;
        }
        self.push(text)
    }

    /// Append `text` as a new entry even if it is already pooled
    pub fn push(&mut self, text: &str) -> usize {
        let idx = self.strings.len();
        self.strings.push(text.to_string());
        // First occurrence wins so lookups stay on the lowest index
        self.index.entry(text.to_string()).or_insert(idx);
        idx
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn index_of(&self, text: &str) -> Option<usize> {
        self.index.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates() {
        let mut pool = StringPool::new();
        assert_eq!(pool.insert("a"), 0);
        assert_eq!(pool.insert("b"), 1);
        assert_eq!(pool.insert("a"), 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_push_appends() {
        let mut pool = StringPool::new();
        assert_eq!(pool.push("a"), 0);
        assert_eq!(pool.push("a"), 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.index_of("a"), Some(0));
        assert_eq!(pool.get(1), Some("a"));
    }

    #[test]
    fn test_serializes_as_list() {
        let mut pool = StringPool::new();
        pool.insert("x");
        pool.insert("y");
        assert_eq!(serde_json::to_string(&pool).unwrap(), r#"["x","y"]"#);
    }
}
