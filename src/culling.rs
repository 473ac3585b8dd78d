use glam::Vec2;

use crate::index_map::VirtualCell;
use crate::layout::LayoutConfig;

/// Inclusive rectangle of virtual cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_row: i64,
    pub max_row: i64,
    pub min_col: i64,
    pub max_col: i64,
}

impl CellRange {
    pub fn contains(&self, cell: VirtualCell) -> bool {
        (self.min_row..=self.max_row).contains(&cell.row)
            && (self.min_col..=self.max_col).contains(&cell.col)
    }

    pub fn rows(&self) -> usize {
        (self.max_row - self.min_row + 1).max(0) as usize
    }

    pub fn cols(&self) -> usize {
        (self.max_col - self.min_col + 1).max(0) as usize
    }

    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow the range so it covers `cell`.
    pub fn include(&mut self, cell: VirtualCell) {
        self.min_row = self.min_row.min(cell.row);
        self.max_row = self.max_row.max(cell.row);
        self.min_col = self.min_col.min(cell.col);
        self.max_col = self.max_col.max(cell.col);
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = VirtualCell> + '_ {
        (self.min_row..=self.max_row)
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| VirtualCell::new(row, col)))
    }
}

/// Decides which virtual cells need a tile this frame.
pub struct ViewportCuller;

impl ViewportCuller {
    /// Viewport center expressed in tiling-plane coordinates.
    pub fn center_in_plane(camera: Vec2, viewport: Vec2) -> Vec2 {
        viewport * 0.5 - camera
    }

    /// Cell whose tile center is nearest the viewport center.
    pub fn nearest_to_center(camera: Vec2, layout: &LayoutConfig, viewport: Vec2) -> Option<VirtualCell> {
        layout.nearest_cell(Self::center_in_plane(camera, viewport))
    }

    /// Inclusive range of cells intersecting the viewport grown by `buffer_factor` on every side.
    ///
    /// Always contains the cell nearest the viewport center. `None` for degenerate layouts.
    pub fn visible_range(
        camera: Vec2,
        layout: &LayoutConfig,
        viewport: Vec2,
        buffer_factor: f32,
    ) -> Option<CellRange> {
        if !layout.is_valid() || !camera.is_finite() || !viewport.is_finite() {
            return None;
        }
        let viewport = viewport.max(Vec2::ZERO);
        let buffer = viewport * buffer_factor.max(0.0);

        let mut range = CellRange {
            min_col: ((-camera.x - buffer.x) / layout.stride_x).floor() as i64,
            max_col: ((-camera.x + viewport.x + buffer.x) / layout.stride_x).ceil() as i64,
            min_row: ((-camera.y - buffer.y) / layout.stride_y).floor() as i64,
            max_row: ((-camera.y + viewport.y + buffer.y) / layout.stride_y).ceil() as i64,
        };

        if let Some(nearest) = Self::nearest_to_center(camera, layout, viewport) {
            range.include(nearest);
        }
        Some(range)
    }

    pub fn visible_cells(
        camera: Vec2,
        layout: &LayoutConfig,
        viewport: Vec2,
        buffer_factor: f32,
    ) -> Vec<VirtualCell> {
        Self::visible_range(camera, layout, viewport, buffer_factor)
            .map(|range| range.iter().collect())
            .unwrap_or_default()
    }
}
