//! Fixed-size set of matrix positions.

use crate::layout::{Col, KeyIndex, Row, COLS, ROWS};

const ROW_MASK: u16 = (1 << COLS) - 1;

/// One bit per matrix position, stored as one word per row with bit `n`
/// standing for column `n`.
///
/// Used both for raw samples (switch closed during this scan) and for the
/// debounced state (key considered pressed).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySet {
    rows: [u16; ROWS],
}

impl KeySet {
    pub const fn empty() -> Self {
        Self { rows: [0; ROWS] }
    }

    /// Build from per-row column bitmasks. Bits above `COLS` are dropped.
    pub const fn from_rows(rows: [u16; ROWS]) -> Self {
        let mut masked = [0; ROWS];
        let mut i = 0;
        while i < ROWS {
            masked[i] = rows[i] & ROW_MASK;
            i += 1;
        }
        Self { rows: masked }
    }

    pub const fn rows(&self) -> [u16; ROWS] {
        self.rows
    }

    /// Column bits of a single row.
    pub const fn row_bits(&self, row: Row) -> u16 {
        self.rows[row.index()]
    }

    pub const fn contains(&self, key: KeyIndex) -> bool {
        self.rows[key.row().index()] & (1 << key.col().index()) != 0
    }

    pub fn insert(&mut self, key: KeyIndex) {
        self.rows[key.row().index()] |= 1 << key.col().index();
    }

    pub fn remove(&mut self, key: KeyIndex) {
        self.rows[key.row().index()] &= !(1 << key.col().index());
    }

    pub fn set(&mut self, key: KeyIndex, pressed: bool) {
        if pressed {
            self.insert(key);
        } else {
            self.remove(key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|&r| r == 0)
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|r| r.count_ones() as usize).sum()
    }

    pub fn is_superset(&self, other: &KeySet) -> bool {
        self.rows
            .iter()
            .zip(other.rows.iter())
            .all(|(&mine, &theirs)| mine & theirs == theirs)
    }

    /// Members in scan order: row 0 left to right, then row 1, and so on.
    pub fn iter(&self) -> impl Iterator<Item = KeyIndex> + '_ {
        Row::all().flat_map(move |row| {
            let bits = self.rows[row.index()];
            Col::all()
                .filter(move |col| bits & (1 << col.index()) != 0)
                .map(move |col| KeyIndex::new(row, col))
        })
    }
}

impl FromIterator<KeyIndex> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyIndex>>(iter: I) -> Self {
        let mut set = KeySet::empty();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn iterates_row_major() {
        let set: KeySet = [
            KeyIndex::at(3, 0),
            KeyIndex::at(0, 13),
            KeyIndex::at(0, 2),
            KeyIndex::at(1, 0),
        ]
        .into_iter()
        .collect();
        let order: Vec<usize> = set.iter().map(|k| k.index()).collect();
        assert_eq!(order, vec![2, 13, 14, 42]);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn from_rows_drops_out_of_range_bits() {
        let set = KeySet::from_rows([0xFFFF, 0, 0, 0, 0]);
        assert_eq!(set.len(), COLS);
        assert_eq!(set.row_bits(Row::new(0).unwrap()), ROW_MASK);
    }

    #[test]
    fn insert_remove() {
        let mut set = KeySet::empty();
        let k = KeyIndex::at(4, 10);
        set.set(k, true);
        assert!(set.contains(k));
        assert!(!set.is_empty());
        set.set(k, false);
        assert!(set.is_empty());
    }

    #[test]
    fn superset() {
        let a: KeySet = [KeyIndex::at(0, 1), KeyIndex::at(2, 2)].into_iter().collect();
        let b: KeySet = [KeyIndex::at(2, 2)].into_iter().collect();
        assert!(a.is_superset(&b));
        assert!(!b.is_superset(&a));
        assert!(a.is_superset(&KeySet::empty()));
    }
}
