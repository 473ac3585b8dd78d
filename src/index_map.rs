//! Wraparound mapping from the unbounded tiling plane onto the finite catalog.

use std::fmt;

/// A (row, col) coordinate in the infinite tiling plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VirtualCell {
    pub row: i64,
    pub col: i64,
}

impl VirtualCell {
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for VirtualCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Catalog index shown at `cell`, flattening row-major and reducing with floor modulo.
///
/// Callers must guard `catalog_len > 0`; an empty catalog maps everything to 0.
pub fn index(cell: VirtualCell, columns: usize, catalog_len: usize) -> usize {
    if catalog_len == 0 {
        return 0;
    }
    let cols = columns.max(1) as i128;
    let flat = cell.row as i128 * cols + cell.col as i128;
    flat.rem_euclid(catalog_len as i128) as usize
}

/// Column in `row` nearest to `near_col` whose cell maps to `target_index`.
pub fn nearest_col_for_index(
    row: i64,
    near_col: i64,
    columns: usize,
    catalog_len: usize,
    target_index: usize,
) -> i64 {
    if catalog_len == 0 {
        return near_col;
    }
    let n = catalog_len as i64;
    let current = index(VirtualCell::new(row, near_col), columns, catalog_len) as i64;
    let forward = (target_index as i64 - current).rem_euclid(n);
    let backward = forward - n;
    if forward <= -backward {
        near_col + forward
    } else {
        near_col + backward
    }
}
