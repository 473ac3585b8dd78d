use std::fmt;

use crate::camera::InteractionState;
use crate::catalog::ItemId;
use crate::index_map::VirtualCell;

/// Identity of one tile on the plane: the item it shows plus where it sits.
///
/// The same item repeats across the plane, so the cell is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub item: ItemId,
    pub cell: VirtualCell,
}

impl TileKey {
    pub fn new(item: ItemId, cell: VirtualCell) -> Self {
        Self { item, cell }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.item, self.cell.row, self.cell.col)
    }
}

/// The last settled, centered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRecord {
    pub cell: VirtualCell,
    pub key: TileKey,
    pub item: ItemId,
}

impl FocusRecord {
    pub fn new(cell: VirtualCell, item: ItemId) -> Self {
        Self {
            cell,
            key: TileKey::new(item, cell),
            item,
        }
    }
}

/// Holds the focus record and answers "is this tile focused right now".
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    record: Option<FocusRecord>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&FocusRecord> {
        self.record.as_ref()
    }

    /// Store a new focus. Returns true if the focused item identity changed.
    pub fn commit(&mut self, cell: VirtualCell, item: ItemId) -> bool {
        let changed = self.record.map(|r| r.item) != Some(item);
        self.record = Some(FocusRecord::new(cell, item));
        changed
    }

    /// Focus only exists while the camera is at rest.
    pub fn is_focused(&self, key: &TileKey, state: InteractionState) -> bool {
        state == InteractionState::Idle && self.record.map(|r| r.key == *key).unwrap_or(false)
    }
}
