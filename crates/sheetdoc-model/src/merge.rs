use serde::{Deserialize, Serialize};

use crate::CellRange;

/// Errors raised when inserting a merge region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("merge region overlaps an existing merge region")]
    OverlapsMerge,
    #[error("merge region overlaps a table region")]
    OverlapsTable,
    #[error("merge region is out of sheet bounds")]
    OutOfBounds,
}

/// The merged regions of one worksheet.
///
/// Regions never overlap each other; insertion is validated and rejected
/// without partial mutation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedRegions {
    regions: Vec<CellRange>,
}

impl MergedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `range` overlaps any existing merge region.
    pub fn overlaps_any(&self, range: &CellRange) -> bool {
        self.regions.iter().any(|r| r.overlaps(range))
    }

    /// Insert a merge region after validating it against the existing
    /// regions. The caller is responsible for table-overlap validation.
    pub fn insert(&mut self, range: CellRange) -> Result<(), MergeError> {
        if !range.in_bounds() {
            return Err(MergeError::OutOfBounds);
        }
        if self.overlaps_any(&range) {
            return Err(MergeError::OverlapsMerge);
        }
        self.regions.push(range);
        Ok(())
    }

    /// Remove a merge region by exact match. Returns true if removed.
    pub fn remove(&mut self, range: &CellRange) -> bool {
        let Some(idx) = self.regions.iter().position(|r| r == range) else {
            return false;
        };
        self.regions.remove(idx);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRange> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_insert_is_rejected_without_mutation() {
        let mut merges = MergedRegions::new();
        merges.insert(CellRange::new(1, 1, 2, 2)).unwrap();

        let err = merges.insert(CellRange::new(2, 2, 3, 3)).unwrap_err();
        assert_eq!(err, MergeError::OverlapsMerge);
        assert_eq!(merges.len(), 1);
        assert_eq!(merges.iter().next(), Some(&CellRange::new(1, 1, 2, 2)));
    }

    #[test]
    fn disjoint_regions_coexist() {
        let mut merges = MergedRegions::new();
        merges.insert(CellRange::new(1, 1, 2, 2)).unwrap();
        merges.insert(CellRange::new(3, 3, 4, 4)).unwrap();
        assert_eq!(merges.len(), 2);
    }

    #[test]
    fn remove_requires_exact_match() {
        let mut merges = MergedRegions::new();
        merges.insert(CellRange::new(1, 1, 2, 2)).unwrap();
        assert!(!merges.remove(&CellRange::new(1, 1, 2, 3)));
        assert!(merges.remove(&CellRange::new(1, 1, 2, 2)));
        assert!(merges.is_empty());
    }
}
