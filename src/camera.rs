//! Camera ownership and the drag → snap → settle state machine.
//!
//! [`CameraController`] is the only writer of the camera offset. Everything
//! else (culling, styling, tile assembly) reads a copy of it. Observable
//! changes are queued as [`CanvasEvent`]s and drained by the host with
//! [`CameraController::take_events`].

use glam::Vec2;

use crate::catalog::{Catalog, CatalogItem};
use crate::config::EngineConfig;
use crate::culling::ViewportCuller;
use crate::focus::FocusTracker;
use crate::index_map::{self, VirtualCell};
use crate::layout::{LayoutConfig, LayoutEngine};
use crate::spring::{Axis, SnapAnimation, SnapProgress};

/// Viewport changes smaller than this are treated as noise.
const VIEWPORT_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Camera still; one tile may be focused.
    Idle,
    /// Camera follows the pointer 1:1.
    Dragging,
    /// Camera springs toward the tile nearest the center.
    Snapping,
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

/// Whether the canvas has anything to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasStatus {
    /// No catalog items; show the "no matching products" placeholder.
    Empty,
    /// Viewport not measured yet; show the loading placeholder.
    Loading,
    Ready,
}

/// What a drag release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Snapping(VirtualCell),
    /// Nothing to snap to; the camera stayed where it was.
    NoVisibleTile,
    /// No drag was in progress.
    Ignored,
}

/// Notifications for collaborators outside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    FocusedItemChanged(CatalogItem),
    SettledStateChanged(bool),
    InteractingChanged(bool),
}

impl CanvasEvent {
    pub fn dispatch(&self, observer: &mut dyn CanvasObserver) {
        match self {
            CanvasEvent::FocusedItemChanged(item) => observer.on_focused_item_changed(item),
            CanvasEvent::SettledStateChanged(settled) => observer.on_settled_state_changed(*settled),
            CanvasEvent::InteractingChanged(interacting) => observer.on_interacting_changed(*interacting),
        }
    }
}

/// Callback view of [`CanvasEvent`].
pub trait CanvasObserver {
    fn on_focused_item_changed(&mut self, _item: &CatalogItem) {}
    fn on_settled_state_changed(&mut self, _settled: bool) {}
    fn on_interacting_changed(&mut self, _interacting: bool) {}
}

pub struct CameraController {
    config: EngineConfig,
    catalog: Catalog,
    viewport: Vec2,
    layout: LayoutConfig,
    offset: Vec2,
    state: InteractionState,
    snap: Option<SnapAnimation>,
    /// Bumped on every cancellation; a snap from an older generation is dead.
    generation: u64,
    focus: FocusTracker,
    events: Vec<CanvasEvent>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CameraController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            catalog: Catalog::empty(),
            viewport: Vec2::ZERO,
            layout: LayoutConfig::unmeasured(),
            offset: Vec2::ZERO,
            state: InteractionState::Idle,
            snap: None,
            generation: 0,
            focus: FocusTracker::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    pub fn is_animating(&self) -> bool {
        self.snap.is_some()
    }

    pub fn status(&self) -> CanvasStatus {
        if self.catalog.is_empty() {
            CanvasStatus::Empty
        } else if !self.layout.is_valid() || self.viewport.y <= 0.0 {
            CanvasStatus::Loading
        } else {
            CanvasStatus::Ready
        }
    }

    fn is_ready(&self) -> bool {
        self.status() == CanvasStatus::Ready
    }

    /// Catalog item shown in the focused tile, if any.
    pub fn focused_item(&self) -> Option<&CatalogItem> {
        let record = self.focus.record()?;
        self.catalog.get(self.catalog.position(record.item)?)
    }

    pub fn item_at(&self, cell: VirtualCell) -> Option<&CatalogItem> {
        if self.catalog.is_empty() {
            return None;
        }
        self.catalog
            .get(index_map::index(cell, self.layout.columns, self.catalog.len()))
    }

    pub fn visible_cells(&self) -> Vec<VirtualCell> {
        ViewportCuller::visible_cells(self.offset, &self.layout, self.viewport, self.config.buffer_factor)
    }

    /// Drain queued notifications in emission order.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed a measured viewport size. Re-lays out and recenters when it changed.
    pub fn set_viewport(&mut self, size: Vec2) {
        let size = if size.is_finite() { size.max(Vec2::ZERO) } else { Vec2::ZERO };
        if (size - self.viewport).abs().max_element() < VIEWPORT_EPSILON {
            return;
        }
        self.viewport = size;
        self.relayout();
    }

    /// Replace the catalog wholesale.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.relayout();
    }

    /// Recenter on `cell` without animation. Returns false if nothing is laid out.
    pub fn center_on(&mut self, cell: VirtualCell) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.cancel_gesture();
        self.settle_instantly(cell);
        true
    }

    pub fn drag_start(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        if self.state == InteractionState::Snapping {
            self.cancel_snap();
        }
        self.set_state(InteractionState::Dragging);
        true
    }

    pub fn drag_move(&mut self, delta: Vec2) {
        if self.state == InteractionState::Dragging && (self.offset + delta).is_finite() {
            self.offset += delta;
        }
    }

    /// End the drag and spring toward the visible tile nearest the center.
    pub fn drag_end(&mut self, release_velocity: Vec2) -> ReleaseOutcome {
        if self.state != InteractionState::Dragging {
            return ReleaseOutcome::Ignored;
        }

        let Some((cell, tile_center)) = self.nearest_visible_tile() else {
            log::warn!("No visible tile at drag release; leaving camera in place");
            self.set_state(InteractionState::Idle);
            return ReleaseOutcome::NoVisibleTile;
        };

        let target = self.viewport * 0.5 - tile_center;
        let velocity = if release_velocity.is_finite() {
            release_velocity * self.config.release_velocity_scale
        } else {
            Vec2::ZERO
        };

        self.generation += 1;
        self.snap = Some(SnapAnimation::new(
            self.generation,
            cell,
            self.offset,
            velocity,
            target,
            self.config.snap_spring,
            self.config.settle_tolerance(),
            self.config.max_snap_duration_secs,
        ));
        self.set_state(InteractionState::Snapping);
        log::debug!("Snapping to {} (target offset {:?})", cell, target);
        ReleaseOutcome::Snapping(cell)
    }

    /// Advance the snap on both axes by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.tick_axis(Axis::X, dt);
        self.tick_axis(Axis::Y, dt);
    }

    /// Advance one axis of the snap. Settling fires only once both axes are at rest.
    pub fn tick_axis(&mut self, axis: Axis, dt: f32) {
        let Some(snap) = self.snap.as_mut() else {
            return;
        };
        if snap.generation() != self.generation || self.state != InteractionState::Snapping {
            log::debug!("Discarding stale snap from generation {}", snap.generation());
            self.snap = None;
            return;
        }

        let progress = snap.tick_axis(axis, dt);
        self.offset = snap.position();
        if progress == SnapProgress::Settled {
            let cell = snap.cell();
            self.offset = snap.target();
            self.snap = None;
            self.commit_focus(cell, true);
            self.set_state(InteractionState::Idle);
        }
    }

    fn nearest_visible_tile(&self) -> Option<(VirtualCell, Vec2)> {
        let center = self.viewport * 0.5;
        self.visible_cells()
            .into_iter()
            .map(|cell| (cell, self.offset + self.layout.tile_center(cell)))
            .fold(None, |best: Option<(VirtualCell, Vec2, f32)>, (cell, screen)| {
                let dist = screen.distance_squared(center);
                match best {
                    Some((_, _, best_dist)) if best_dist <= dist => best,
                    _ => Some((cell, screen, dist)),
                }
            })
            .map(|(cell, screen, _)| (cell, screen - self.offset))
    }

    fn relayout(&mut self) {
        self.cancel_gesture();
        self.layout =
            LayoutEngine::compute_for_catalog(self.viewport.x, self.catalog.len(), &self.config.breakpoints);
        if !self.is_ready() {
            return;
        }

        let cell = match self.focus.record().copied() {
            Some(record) => match self.catalog.position(record.item) {
                Some(index) => VirtualCell::new(
                    record.cell.row,
                    index_map::nearest_col_for_index(
                        record.cell.row,
                        record.cell.col,
                        self.layout.columns,
                        self.catalog.len(),
                        index,
                    ),
                ),
                None => {
                    log::info!("Focused item {} left the catalog; using default cell", record.item);
                    self.default_cell()
                }
            },
            None => self.default_cell(),
        };
        self.settle_instantly(cell);
    }

    /// Deterministic starting cell, roughly in the middle of the catalog pattern.
    pub fn default_cell(&self) -> VirtualCell {
        let cols = self.layout.columns.max(1);
        let row = self.catalog.len() / (cols * 2);
        VirtualCell::new(row as i64, (cols / 2) as i64)
    }

    fn settle_instantly(&mut self, cell: VirtualCell) {
        self.offset = self.viewport * 0.5 - self.layout.tile_center(cell);
        self.commit_focus(cell, false);
        self.set_state(InteractionState::Idle);
    }

    fn commit_focus(&mut self, cell: VirtualCell, always_notify: bool) {
        let Some(item) = self.item_at(cell).cloned() else {
            return;
        };
        let changed = self.focus.commit(cell, item.id);
        if changed || always_notify {
            self.events.push(CanvasEvent::FocusedItemChanged(item));
        }
    }

    fn cancel_snap(&mut self) {
        self.generation += 1;
        if let Some(snap) = self.snap.take() {
            log::debug!("Snap toward {} interrupted", snap.cell());
        }
    }

    fn cancel_gesture(&mut self) {
        if self.state.is_idle() {
            return;
        }
        self.cancel_snap();
        self.set_state(InteractionState::Idle);
    }

    fn set_state(&mut self, next: InteractionState) {
        let prev = self.state;
        self.state = next;
        if prev.is_idle() != next.is_idle() {
            self.events.push(CanvasEvent::SettledStateChanged(next.is_idle()));
            self.events.push(CanvasEvent::InteractingChanged(!next.is_idle()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: u64) -> Catalog {
        Catalog::new(
            (1..=n)
                .map(|i| CatalogItem::new(i, format!("img/{}.png", i), format!("Item {}", i)))
                .collect(),
        )
        .unwrap()
    }

    fn ready_camera() -> CameraController {
        let mut camera = CameraController::default();
        camera.set_catalog(catalog(6));
        camera.set_viewport(Vec2::new(300.0, 600.0));
        camera.take_events();
        camera
    }

    fn settle(camera: &mut CameraController) {
        for _ in 0..600 {
            if !camera.is_animating() {
                break;
            }
            camera.tick(1.0 / 60.0);
        }
    }

    #[test]
    fn test_status_progression() {
        let mut camera = CameraController::default();
        assert_eq!(camera.status(), CanvasStatus::Empty);
        camera.set_catalog(catalog(6));
        assert_eq!(camera.status(), CanvasStatus::Loading);
        camera.set_viewport(Vec2::new(300.0, 600.0));
        assert_eq!(camera.status(), CanvasStatus::Ready);
    }

    #[test]
    fn test_initial_layout_focuses_default_cell() {
        let mut camera = CameraController::default();
        camera.set_catalog(catalog(6));
        camera.set_viewport(Vec2::new(300.0, 600.0));

        assert_eq!(camera.layout().columns, 3);
        // 6 / (3 * 2) = 1, 3 / 2 = 1
        assert_eq!(camera.focus().record().unwrap().cell, VirtualCell::new(1, 1));
        let events = camera.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CanvasEvent::FocusedItemChanged(item) if item.id.0 == 5));
    }

    #[test]
    fn test_drag_moves_camera_one_to_one() {
        let mut camera = ready_camera();
        let start = camera.offset();
        assert!(camera.drag_start());
        camera.drag_move(Vec2::new(-30.0, 12.5));
        camera.drag_move(Vec2::new(-5.0, 0.5));
        assert_eq!(camera.offset(), start + Vec2::new(-35.0, 13.0));
        assert_eq!(camera.state(), InteractionState::Dragging);
    }

    #[test]
    fn test_drag_emits_settled_transitions() {
        let mut camera = ready_camera();
        camera.drag_start();
        assert_eq!(
            camera.take_events(),
            vec![CanvasEvent::SettledStateChanged(false), CanvasEvent::InteractingChanged(true)]
        );

        camera.drag_move(Vec2::new(-200.0, -300.0));
        assert!(matches!(camera.drag_end(Vec2::ZERO), ReleaseOutcome::Snapping(_)));
        // Dragging -> Snapping stays non-idle.
        assert!(camera.take_events().is_empty());

        settle(&mut camera);
        let events = camera.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], CanvasEvent::FocusedItemChanged(_)));
        assert_eq!(events[1], CanvasEvent::SettledStateChanged(true));
        assert_eq!(events[2], CanvasEvent::InteractingChanged(false));
    }

    #[test]
    fn test_snap_centers_nearest_tile() {
        let mut camera = ready_camera();
        let layout = *camera.layout();
        camera.drag_start();
        // Move roughly one stride right and a little down.
        camera.drag_move(Vec2::new(-(layout.stride_x * 0.9), layout.stride_y * 0.2));
        let ReleaseOutcome::Snapping(cell) = camera.drag_end(Vec2::ZERO) else {
            panic!("expected snap");
        };
        assert_eq!(cell, VirtualCell::new(1, 2));

        settle(&mut camera);
        assert_eq!(camera.state(), InteractionState::Idle);
        let expected = camera.viewport() * 0.5 - layout.tile_center(cell);
        assert!((camera.offset() - expected).length() < 1e-3);
        assert_eq!(camera.focus().record().unwrap().cell, cell);
    }

    #[test]
    fn test_huge_frame_time_settles_once() {
        let mut camera = ready_camera();
        camera.drag_start();
        camera.drag_move(Vec2::new(-130.0, 70.0));
        assert!(matches!(camera.drag_end(Vec2::new(-900.0, 300.0)), ReleaseOutcome::Snapping(_)));
        camera.take_events();

        camera.tick(1.0e6);
        assert_eq!(camera.state(), InteractionState::Idle);
        assert!(!camera.is_animating());
        let focus_events = camera
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, CanvasEvent::FocusedItemChanged(_)))
            .count();
        assert_eq!(focus_events, 1);
    }

    #[test]
    fn test_overflowing_drag_is_rejected() {
        let mut camera = ready_camera();
        let start = camera.offset();
        camera.drag_start();
        camera.drag_move(Vec2::new(f32::MAX, 0.0));
        camera.drag_move(Vec2::new(f32::MAX, 0.0));
        camera.drag_move(Vec2::new(f32::NAN, 1.0));
        assert!(camera.offset().is_finite());
        assert_eq!(camera.offset(), start + Vec2::new(f32::MAX, 0.0));

        // Still a tile to snap to, so release never reports an empty view.
        assert!(matches!(camera.drag_end(Vec2::ZERO), ReleaseOutcome::Snapping(_)));
    }

    #[test]
    fn test_drag_start_cancels_snap() {
        let mut camera = ready_camera();
        camera.drag_start();
        camera.drag_move(Vec2::new(-150.0, 0.0));
        camera.drag_end(Vec2::new(-800.0, 0.0));
        camera.tick(1.0 / 60.0);
        assert!(camera.is_animating());
        let before = camera.focus().record().copied();

        assert!(camera.drag_start());
        assert!(!camera.is_animating());
        camera.take_events();
        for _ in 0..600 {
            camera.tick(1.0 / 60.0);
        }
        assert!(camera.take_events().is_empty());
        assert_eq!(camera.focus().record().copied(), before);
        assert_eq!(camera.state(), InteractionState::Dragging);
    }

    #[test]
    fn test_events_ignored_when_not_ready() {
        let mut camera = CameraController::default();
        assert!(!camera.drag_start());
        camera.drag_move(Vec2::new(10.0, 10.0));
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert_eq!(camera.drag_end(Vec2::ZERO), ReleaseOutcome::Ignored);
        assert!(camera.take_events().is_empty());
    }

    #[test]
    fn test_resize_keeps_focused_item() {
        let mut camera = ready_camera();
        let item = camera.focused_item().unwrap().id;
        camera.set_viewport(Vec2::new(1500.0, 900.0));
        assert_eq!(camera.layout().columns, 7);
        assert_eq!(camera.focused_item().unwrap().id, item);
        // Same item, so no focus notification.
        assert!(camera.take_events().is_empty());
        let cell = camera.focus().record().unwrap().cell;
        let expected = camera.viewport() * 0.5 - camera.layout().tile_center(cell);
        assert!((camera.offset() - expected).length() < 1e-3);
    }

    #[test]
    fn test_lost_focus_target_falls_back_to_default() {
        let mut camera = ready_camera();
        let focused = camera.focused_item().unwrap().id;
        let remaining: Vec<_> = camera
            .catalog()
            .iter()
            .filter(|item| item.id != focused)
            .cloned()
            .collect();
        camera.set_catalog(Catalog::new(remaining).unwrap());

        assert_eq!(camera.focus().record().unwrap().cell, camera.default_cell());
        let events = camera.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CanvasEvent::FocusedItemChanged(item) if item.id != focused));
    }

    #[test]
    fn test_center_on_is_instant() {
        let mut camera = ready_camera();
        assert!(camera.center_on(VirtualCell::new(-4, 7)));
        assert_eq!(camera.state(), InteractionState::Idle);
        assert!(!camera.is_animating());
        assert_eq!(camera.focus().record().unwrap().cell, VirtualCell::new(-4, 7));
    }

    #[test]
    fn test_axis_ticks_interleave() {
        let mut camera = ready_camera();
        camera.drag_start();
        camera.drag_move(Vec2::new(-90.0, -140.0));
        camera.drag_end(Vec2::ZERO);
        camera.take_events();

        for _ in 0..600 {
            camera.tick_axis(Axis::X, 1.0 / 60.0);
        }
        assert_eq!(camera.state(), InteractionState::Snapping);
        assert!(camera.take_events().is_empty());

        for _ in 0..600 {
            camera.tick_axis(Axis::Y, 1.0 / 60.0);
        }
        assert_eq!(camera.state(), InteractionState::Idle);
        let focus_events = camera
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, CanvasEvent::FocusedItemChanged(_)))
            .count();
        assert_eq!(focus_events, 1);
    }

    #[derive(Default)]
    struct Recorder {
        focused: Vec<u64>,
        settled: Vec<bool>,
        interacting: Vec<bool>,
    }

    impl CanvasObserver for Recorder {
        fn on_focused_item_changed(&mut self, item: &CatalogItem) {
            self.focused.push(item.id.0);
        }
        fn on_settled_state_changed(&mut self, settled: bool) {
            self.settled.push(settled);
        }
        fn on_interacting_changed(&mut self, interacting: bool) {
            self.interacting.push(interacting);
        }
    }

    #[test]
    fn test_dispatch_to_observer() {
        let mut camera = ready_camera();
        camera.drag_start();
        camera.drag_end(Vec2::ZERO);
        settle(&mut camera);

        let mut recorder = Recorder::default();
        for event in camera.take_events() {
            event.dispatch(&mut recorder);
        }
        assert_eq!(recorder.settled, vec![false, true]);
        assert_eq!(recorder.interacting, vec![true, false]);
        assert_eq!(recorder.focused.len(), 1);
    }
}
