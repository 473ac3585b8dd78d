//! Per-frame tile assembly: cull → map → focus → style.

use glam::Vec2;

use crate::camera::{CameraController, CanvasStatus};
use crate::catalog::CatalogItem;
use crate::focus::TileKey;
use crate::index_map::{self, VirtualCell};
use crate::styling::{TileDistanceStyler, TileStyle};

/// Axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Same center, scaled extent.
    pub fn scaled(&self, factor: f32) -> Rect {
        let center = self.center();
        let size = self.size() * factor;
        Rect::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }
}

/// One renderable tile.
#[derive(Debug, Clone)]
pub struct Tile<'a> {
    pub cell: VirtualCell,
    pub index: usize,
    pub item: &'a CatalogItem,
    pub key: TileKey,
    /// Unscaled tile rectangle in screen space.
    pub rect: Rect,
    pub is_focused: bool,
    pub distance_factor: f32,
    pub style: TileStyle,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub status: CanvasStatus,
    pub tiles: Vec<Tile<'a>>,
}

impl<'a> Frame<'a> {
    pub fn build(camera: &'a CameraController) -> Self {
        let status = camera.status();
        if status != CanvasStatus::Ready {
            return Self { status, tiles: Vec::new() };
        }

        let catalog = camera.catalog();
        let layout = camera.layout();
        let offset = camera.offset();
        let state = camera.state();
        let styler = TileDistanceStyler::new(camera.viewport(), camera.config().falloff);
        let interacting = !state.is_idle();

        let tiles = camera
            .visible_cells()
            .into_iter()
            .filter_map(|cell| {
                let index = index_map::index(cell, layout.columns, catalog.len());
                let item = catalog.get(index)?;
                let key = TileKey::new(item.id, cell);
                let origin = offset + layout.tile_origin(cell);
                let rect = Rect::new(origin.x, origin.y, layout.tile_width, layout.tile_height);
                let is_focused = camera.focus().is_focused(&key, state);
                let distance_factor = styler.distance_factor(rect.center());
                Some(Tile {
                    cell,
                    index,
                    item,
                    key,
                    rect,
                    is_focused,
                    distance_factor,
                    style: styler.style(distance_factor, is_focused, interacting),
                })
            })
            .collect();

        Self { status, tiles }
    }

    pub fn focused(&self) -> Option<&Tile<'a>> {
        self.tiles.iter().find(|tile| tile.is_focused)
    }

    /// Topmost tile under `point`, drawn scale included.
    pub fn hit_test(&self, point: Vec2) -> Option<&Tile<'a>> {
        let hit = |tile: &&Tile<'a>| tile.rect.scaled(tile.style.scale).contains(point);
        self.focused()
            .filter(hit)
            .or_else(|| self.tiles.iter().rev().find(hit))
    }

    /// Tiles ordered so the focused tile is drawn last.
    pub fn paint_order(&self) -> impl Iterator<Item = &Tile<'a>> {
        self.tiles
            .iter()
            .filter(|tile| !tile.is_focused)
            .chain(self.tiles.iter().filter(|tile| tile.is_focused))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn camera() -> CameraController {
        let mut camera = CameraController::default();
        camera.set_catalog(
            Catalog::new(
                (1..=6)
                    .map(|i| CatalogItem::new(i, format!("{}.jpg", i), format!("Item {}", i)))
                    .collect(),
            )
            .unwrap(),
        );
        camera.set_viewport(Vec2::new(300.0, 600.0));
        camera
    }

    #[test]
    fn test_not_ready_has_no_tiles() {
        let camera = CameraController::default();
        let frame = Frame::build(&camera);
        assert_eq!(frame.status, CanvasStatus::Empty);
        assert!(frame.tiles.is_empty());
    }

    #[test]
    fn test_exactly_one_focused_when_idle() {
        let camera = camera();
        let frame = Frame::build(&camera);
        assert_eq!(frame.tiles.iter().filter(|t| t.is_focused).count(), 1);
        let focused = frame.focused().unwrap();
        assert_eq!(focused.cell, VirtualCell::new(1, 1));
        assert_eq!(focused.style.scale, crate::styling::FOCUSED_SCALE);
        assert!(focused.distance_factor < 1e-4);
    }

    #[test]
    fn test_no_focus_while_dragging() {
        let mut camera = camera();
        camera.drag_start();
        let frame = Frame::build(&camera);
        assert!(frame.focused().is_none());
        assert!(frame.tiles.iter().all(|t| !t.style.show_overlay));
    }

    #[test]
    fn test_tiles_repeat_catalog() {
        let camera = camera();
        let frame = Frame::build(&camera);
        assert!(frame.tiles.len() > 6);
        for tile in &frame.tiles {
            assert_eq!(tile.index, index_map::index(tile.cell, 3, 6));
            assert_eq!(tile.key.item, tile.item.id);
        }
    }

    #[test]
    fn test_hit_test_center() {
        let camera = camera();
        let frame = Frame::build(&camera);
        let hit = frame.hit_test(camera.viewport() * 0.5).unwrap();
        assert!(hit.is_focused);
        assert_eq!(frame.paint_order().last().map(|t| t.cell), Some(hit.cell));
    }

    #[test]
    fn test_rect_scaled_keeps_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        let scaled = rect.scaled(1.5);
        assert_eq!(scaled.center(), rect.center());
        assert_eq!(scaled.size(), Vec2::new(150.0, 75.0));
    }
}
