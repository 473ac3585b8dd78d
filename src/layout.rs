use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::index_map::VirtualCell;

/// Device class derived from the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    VerySmall,
    Small,
    Desktop,
}

impl DeviceClass {
    pub fn is_mobile(&self) -> bool {
        !matches!(self, DeviceClass::Desktop)
    }
}

/// Acceptable tile and spacing range for a group of device classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBand {
    pub min_spacing: f32,
    pub max_spacing: f32,
    pub min_tile_width: f32,
    pub max_tile_width: f32,
    pub max_columns: usize,
    /// Absolute lower bound on the final tile width.
    pub tile_width_floor: f32,
}

/// Desktop target column count for viewports narrower than `below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStep {
    pub below: f32,
    pub columns: usize,
}

/// Breakpoint table driving the layout computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub very_small_below: f32,
    pub small_below: f32,
    pub very_small_columns: usize,
    pub small_columns: usize,
    /// Checked in order; the first step whose `below` exceeds the width wins.
    pub desktop_steps: Vec<ColumnStep>,
    pub wide_desktop_columns: usize,
    pub mobile: SizeBand,
    pub desktop: SizeBand,
    /// Tile width divided by tile height.
    pub aspect_ratio: f32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            very_small_below: 480.0,
            small_below: 768.0,
            very_small_columns: 3,
            small_columns: 4,
            desktop_steps: vec![
                ColumnStep { below: 1024.0, columns: 5 },
                ColumnStep { below: 1440.0, columns: 6 },
            ],
            wide_desktop_columns: 7,
            mobile: SizeBand {
                min_spacing: 15.0,
                max_spacing: 25.0,
                min_tile_width: 60.0,
                max_tile_width: 100.0,
                max_columns: 6,
                tile_width_floor: 50.0,
            },
            desktop: SizeBand {
                min_spacing: 30.0,
                max_spacing: 70.0,
                min_tile_width: 120.0,
                max_tile_width: 250.0,
                max_columns: 10,
                tile_width_floor: 100.0,
            },
            aspect_ratio: 3.0 / 4.0,
        }
    }
}

impl Breakpoints {
    pub fn classify(&self, viewport_width: f32) -> DeviceClass {
        if viewport_width < self.very_small_below {
            DeviceClass::VerySmall
        } else if viewport_width < self.small_below {
            DeviceClass::Small
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn band(&self, class: DeviceClass) -> &SizeBand {
        if class.is_mobile() {
            &self.mobile
        } else {
            &self.desktop
        }
    }

    pub fn target_columns(&self, class: DeviceClass, viewport_width: f32) -> usize {
        let cols = match class {
            DeviceClass::VerySmall => self.very_small_columns,
            DeviceClass::Small => self.small_columns,
            DeviceClass::Desktop => self
                .desktop_steps
                .iter()
                .find(|step| viewport_width < step.below)
                .map(|step| step.columns)
                .unwrap_or(self.wide_desktop_columns),
        };
        cols.max(1)
    }
}

/// Tile geometry for one viewport width. All zero means "not laid out yet".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutConfig {
    pub tile_width: f32,
    pub tile_height: f32,
    pub spacing: f32,
    pub columns: usize,
    pub stride_x: f32,
    pub stride_y: f32,
}

impl LayoutConfig {
    pub fn unmeasured() -> Self {
        Self::default()
    }

    /// Build a layout directly from a tile width, bypassing breakpoints.
    pub fn from_tile(tile_width: f32, spacing: f32, columns: usize, aspect_ratio: f32) -> Self {
        let tile_height = tile_width / aspect_ratio;
        Self {
            tile_width,
            tile_height,
            spacing,
            columns: columns.max(1),
            stride_x: tile_width + spacing,
            stride_y: tile_height + spacing,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.tile_width > 0.0 && self.tile_height > 0.0 && self.stride_x > 0.0 && self.stride_y > 0.0
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    /// Top-left corner of a cell in the tiling plane.
    pub fn tile_origin(&self, cell: VirtualCell) -> Vec2 {
        Vec2::new(cell.col as f32 * self.stride_x, cell.row as f32 * self.stride_y)
    }

    pub fn tile_center(&self, cell: VirtualCell) -> Vec2 {
        self.tile_origin(cell) + self.tile_size() * 0.5
    }

    /// Cell whose tile center is closest to `point` in plane coordinates.
    pub fn nearest_cell(&self, point: Vec2) -> Option<VirtualCell> {
        if !self.is_valid() {
            return None;
        }
        let col = ((point.x - self.tile_width * 0.5) / self.stride_x).round();
        let row = ((point.y - self.tile_height * 0.5) / self.stride_y).round();
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        Some(VirtualCell::new(row as i64, col as i64))
    }
}

/// Breakpoint-driven tile sizing
pub struct LayoutEngine;

impl LayoutEngine {
    /// Compute the layout for a viewport width. Pure and deterministic.
    pub fn compute(viewport_width: f32, breakpoints: &Breakpoints) -> LayoutConfig {
        if !viewport_width.is_finite() || viewport_width <= 0.0 {
            return LayoutConfig::unmeasured();
        }

        let class = breakpoints.classify(viewport_width);
        let band = breakpoints.band(class);
        let width_for = |cols: usize, spacing: f32| {
            (viewport_width - (cols as f32 + 1.0) * spacing) / cols as f32
        };

        let mut cols = breakpoints.target_columns(class, viewport_width);
        let mut tile_width = width_for(cols, band.min_spacing);

        while tile_width < band.min_tile_width && cols > 1 {
            cols -= 1;
            tile_width = width_for(cols, band.min_spacing);
        }
        while tile_width > band.max_tile_width && cols < band.max_columns {
            cols += 1;
            tile_width = width_for(cols, band.min_spacing);
        }

        tile_width = tile_width.max(band.tile_width_floor);

        // Spread the leftover width into the gaps, then keep the gaps in band.
        let spacing = ((viewport_width - cols as f32 * tile_width) / (cols as f32 + 1.0))
            .clamp(band.min_spacing, band.max_spacing);

        let tile_width = width_for(cols, spacing).max(band.tile_width_floor);

        LayoutConfig::from_tile(tile_width, spacing, cols, breakpoints.aspect_ratio)
    }

    /// Like [`LayoutEngine::compute`], but reports "not laid out" without a catalog.
    pub fn compute_for_catalog(
        viewport_width: f32,
        catalog_len: usize,
        breakpoints: &Breakpoints,
    ) -> LayoutConfig {
        if catalog_len == 0 {
            return LayoutConfig::unmeasured();
        }
        Self::compute(viewport_width, breakpoints)
    }
}
