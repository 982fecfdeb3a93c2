use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellRange, Coordinate};

/// One shared-formula group: a base formula authored at `base` applied to
/// one or more rectangular regions.
///
/// Groups only exist between load and the next structural edit; any
/// operation that can move cells flattens every group into independent
/// per-cell formulas first (see the engine's flattening pass).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedFormulaGroup {
    /// The `si` attribute of the owning `<f t="shared">` element.
    pub shared_index: u32,
    /// The cell where the formula was originally authored.
    pub base: Coordinate,
    /// The cell range(s) the formula applies to.
    pub regions: Vec<CellRange>,
    /// Formula text relative to `base`, without the leading `=`.
    pub text: String,
}

/// Shared-formula groups for one worksheet, keyed by shared index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFormulas {
    groups: BTreeMap<u32, SharedFormulaGroup>,
}

impl SharedFormulas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group under its shared index.
    pub fn insert(&mut self, group: SharedFormulaGroup) {
        self.groups.insert(group.shared_index, group);
    }

    pub fn get(&self, shared_index: u32) -> Option<&SharedFormulaGroup> {
        self.groups.get(&shared_index)
    }

    /// Iterate groups in shared-index order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &SharedFormulaGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop every group. Flattening calls this after converting all group
    /// members to independent formulas.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_keyed_and_ordered_by_shared_index() {
        let mut table = SharedFormulas::new();
        table.insert(SharedFormulaGroup {
            shared_index: 2,
            base: Coordinate::new(1, 1),
            regions: vec![CellRange::new(1, 1, 3, 1)],
            text: "B1*2".to_string(),
        });
        table.insert(SharedFormulaGroup {
            shared_index: 0,
            base: Coordinate::new(5, 5),
            regions: vec![CellRange::new(5, 5, 5, 9)],
            text: "A5".to_string(),
        });

        let order: Vec<u32> = table.iter().map(|g| g.shared_index).collect();
        assert_eq!(order, vec![0, 2]);

        table.clear();
        assert!(table.is_empty());
    }
}
