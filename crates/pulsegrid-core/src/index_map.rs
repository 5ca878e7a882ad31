//! Column index map: which spectrum region feeds which column.

use crate::config::ShuffleStyle;
use rand::Rng;

/// A permutation of `[0..N)` mapping grid columns onto spectrum-bin slots.
///
/// Invariant: the map is always a bijection on `[0..N)`, after any number of
/// remaps. Consumers must tolerate instantaneous remapping; there is no
/// continuity guarantee across a shuffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndexMap {
    slots: Vec<usize>,
}

impl ColumnIndexMap {
    /// Identity map over `len` columns.
    pub fn identity(len: usize) -> Self {
        Self {
            slots: (0..len).collect(),
        }
    }

    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the map covers no columns.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot currently assigned to `column`.
    pub fn slot(&self, column: usize) -> usize {
        self.slots[column]
    }

    /// Produce a new permutation from the current one.
    pub fn remap<R: Rng>(&mut self, style: ShuffleStyle, rng: &mut R) {
        match style {
            ShuffleStyle::Rotate => self.slots.rotate_right(1),
            ShuffleStyle::Random => {
                // Fisher-Yates
                for i in (1..self.slots.len()).rev() {
                    let j = rng.random_range(0..=i);
                    self.slots.swap(i, j);
                }
            }
        }
    }

    /// Check the bijection invariant. Used by tests; a failure here means
    /// state corruption.
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.slots.len()];
        for &slot in &self.slots {
            if slot >= self.slots.len() || seen[slot] {
                return false;
            }
            seen[slot] = true;
        }
        true
    }
}
