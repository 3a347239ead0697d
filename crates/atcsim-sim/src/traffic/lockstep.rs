//! Lockstep resize contract for per-aircraft arrays.

use std::ops::Range;

/// Any structure holding one entry per register row.
///
/// `Traffic` broadcasts every create and delete to all registered
/// implementors so row `i` means the same aircraft everywhere.
pub trait LockstepArrays {
    /// Append `n` default rows and return the new row range.
    fn on_create(&mut self, n: usize) -> Range<usize>;

    /// Remove `rows`, which are sorted descending and deduplicated.
    fn on_delete(&mut self, rows: &[usize]);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove `rows` (sorted descending) from `column`.
pub fn remove_rows<T>(column: &mut Vec<T>, rows: &[usize]) {
    for &row in rows {
        if row < column.len() {
            column.remove(row);
        }
    }
}

/// Normalize a deletion request: sort descending, drop duplicates and rows
/// at or past `len`.
pub fn descending_rows(rows: &[usize], len: usize) -> Vec<usize> {
    let mut rows: Vec<usize> = rows.iter().copied().filter(|&r| r < len).collect();
    rows.sort_unstable_by(|a, b| b.cmp(a));
    rows.dedup();
    rows
}
