use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Shared-string table (`xl/sharedStrings.xml`).
///
/// Interns text content into small integer indices, deduplicating by
/// content. Growth is append-only: interning never moves or reuses an
/// existing index, which keeps stored shared-string cell values stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedStringTable {
    items: Vec<String>,
    #[serde(skip)]
    index_by_content: HashMap<String, u32>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning its index. Identical content always maps to
    /// the same index.
    pub fn intern(&mut self, text: &str) -> u32 {
        if let Some(&idx) = self.index_by_content.get(text) {
            return idx;
        }
        let idx = self.items.len() as u32;
        self.items.push(text.to_string());
        self.index_by_content.insert(text.to_string(), idx);
        idx
    }

    /// Resolve an index back to its content.
    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.items.get(index as usize).map(String::as_str)
    }

    /// Number of unique strings (the `uniqueCount` header attribute).
    pub fn unique_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate the interned strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Rebuild the dedup index after deserialization (serde skips it).
    pub fn rebuild_index(&mut self) {
        self.index_by_content = self
            .items
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
    }
}
