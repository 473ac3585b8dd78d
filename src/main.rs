use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;

use tilecanvas::prefetch::ImagePrefetcher;
use tilecanvas::{
    CameraController, CanvasObserver, CanvasStatus, Catalog, CatalogItem, CatalogSource, CatalogWatcher,
    EngineConfig, Frame, TagCategory,
};

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let source = args.next().map(CatalogSource::from_path);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => EngineConfig::from_path(&path).unwrap_or_else(|e| {
            log::warn!("{}; using default config", e);
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("TileCanvas"),
        ..Default::default()
    };

    eframe::run_native(
        "TileCanvas",
        options,
        Box::new(move |cc| {
            configure_custom_style(&cc.egui_ctx);
            Box::new(TileCanvasApp::new(config, source))
        }),
    )
}

fn configure_custom_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = egui::Color32::from_rgb(15, 23, 42);
    visuals.window_stroke = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(255, 255, 255, 26));
    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.window_shadow = egui::epaint::Shadow::NONE;
    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(12.0, 8.0);
    ctx.set_style(style);
}

/// What the surrounding page would track from the canvas notifications.
#[derive(Default)]
struct PageState {
    focused: Option<CatalogItem>,
    settled: bool,
    interacting: bool,
}

impl CanvasObserver for PageState {
    fn on_focused_item_changed(&mut self, item: &CatalogItem) {
        self.focused = Some(item.clone());
    }

    fn on_settled_state_changed(&mut self, settled: bool) {
        self.settled = settled;
    }

    fn on_interacting_changed(&mut self, interacting: bool) {
        self.interacting = interacting;
    }
}

struct TileCanvasApp {
    camera: CameraController,
    source: Option<CatalogSource>,
    watcher: Option<CatalogWatcher>,
    prefetcher: ImagePrefetcher,
    page: PageState,
    load_error: Option<String>,
}

impl TileCanvasApp {
    fn new(config: EngineConfig, source: Option<CatalogSource>) -> Self {
        let watcher = source.as_ref().and_then(|source| {
            CatalogWatcher::watch(source)
                .map_err(|e| log::warn!("Not watching {}: {}", source.path().display(), e))
                .ok()
        });

        let mut app = Self {
            camera: CameraController::new(config),
            source,
            watcher,
            prefetcher: ImagePrefetcher::default(),
            page: PageState {
                settled: true,
                ..Default::default()
            },
            load_error: None,
        };
        app.reload();
        app
    }

    fn reload(&mut self) {
        let Some(source) = &self.source else {
            self.load_error = Some("Usage: tilecanvas <catalog.json | image dir> [config.json]".to_string());
            return;
        };
        match source.load() {
            Ok(catalog) => {
                self.load_error = None;
                self.prefetcher.clear();
                let started = self.prefetcher.prefetch(&catalog);
                log::debug!("Started {} prefetches", started);
                self.camera.set_catalog(catalog);
            }
            Err(e) => {
                log::warn!("Catalog reload failed: {}", e);
                if self.camera.catalog().is_empty() {
                    self.load_error = Some(e.to_string());
                }
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.camera.take_events() {
            event.dispatch(&mut self.page);
        }
    }

    fn tag_summary(catalog: &Catalog) -> String {
        catalog
            .tag_options()
            .iter()
            .map(|(category, values)| format!("{}: {}", category.display_name(), values.len()))
            .collect::<Vec<_>>()
            .join("  ·  ")
    }

    /// Stable card color per item, picked from a small palette.
    fn tile_color(item: &CatalogItem, opacity: f32) -> egui::Color32 {
        const PALETTE: [(u8, u8, u8); 6] = [
            (59, 130, 246),
            (139, 92, 246),
            (245, 158, 11),
            (239, 68, 68),
            (16, 185, 129),
            (236, 72, 153),
        ];
        let (r, g, b) = PALETTE[(item.id.0 % PALETTE.len() as u64) as usize];
        egui::Color32::from_rgb(r, g, b).gamma_multiply(opacity.clamp(0.0, 1.0))
    }

    fn paint_frame(painter: &egui::Painter, origin: egui::Pos2, frame: &Frame<'_>) {
        for tile in frame.paint_order() {
            let rect = tile.rect.scaled(tile.style.scale);
            let egui_rect = egui::Rect::from_min_size(
                origin + egui::vec2(rect.x, rect.y),
                egui::vec2(rect.width, rect.height),
            );
            let corner_radius = (rect.width.min(rect.height) * 0.08).min(12.0);

            painter.rect(
                egui_rect.translate(egui::vec2(0.0, 3.0)),
                corner_radius,
                egui::Color32::from_rgba_unmultiplied(0, 0, 0, (40.0 * tile.style.opacity) as u8),
                egui::Stroke::NONE,
            );
            painter.rect_filled(egui_rect, corner_radius, Self::tile_color(tile.item, tile.style.opacity));

            if tile.is_focused {
                painter.rect_stroke(egui_rect, corner_radius, egui::Stroke::new(2.0, egui::Color32::WHITE));
            }

            if tile.style.show_overlay {
                let alpha = (255.0 * tile.style.overlay_opacity) as u8;
                painter.text(
                    egui::pos2(egui_rect.center().x, egui_rect.bottom() - 22.0),
                    egui::Align2::CENTER_CENTER,
                    tile.item.label(),
                    egui::FontId::proportional(12.0),
                    egui::Color32::from_rgba_unmultiplied(255, 255, 255, alpha),
                );
                if let Some(price) = &tile.item.price {
                    painter.text(
                        egui::pos2(egui_rect.center().x, egui_rect.bottom() - 8.0),
                        egui::Align2::CENTER_CENTER,
                        price,
                        egui::FontId::proportional(10.0),
                        egui::Color32::from_rgba_unmultiplied(255, 255, 255, alpha / 2),
                    );
                }
            }
        }
    }
}

fn to_glam(v: egui::Vec2) -> glam::Vec2 {
    glam::Vec2::new(v.x, v.y)
}

impl eframe::App for TileCanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.watcher.as_ref().map(|w| w.poll_changed()).unwrap_or(false) {
            log::info!("Catalog source changed; reloading");
            self.reload();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("TileCanvas");
                ui.separator();
                if let Some(source) = &self.source {
                    ui.label(format!("{}", source.path().display()));
                }
                ui.label(format!("Items: {}", self.camera.catalog().len()));
                ui.label(Self::tag_summary(self.camera.catalog()));
            });
        });

        egui::TopBottomPanel::bottom("info_bar").show(ctx, |ui| {
            ui.horizontal(|ui| match (&self.page.focused, self.page.settled) {
                (Some(item), true) => {
                    ui.strong(item.label());
                    if let Some(price) = &item.price {
                        ui.label(price);
                    }
                    for category in TagCategory::ALL {
                        if let Some(value) = item.tags.get(category) {
                            ui.label(format!("{}: {}", category.display_name(), value));
                        }
                    }
                }
                _ => {
                    ui.weak(if self.page.interacting { "Browsing…" } else { "" });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size_before_wrap(), egui::Sense::click_and_drag());
            let canvas = response.rect;
            self.camera.set_viewport(to_glam(canvas.size()));

            if response.drag_started() {
                self.camera.drag_start();
            }
            if response.dragged() {
                self.camera.drag_move(to_glam(response.drag_delta()));
            }
            if response.drag_released() {
                let velocity = ctx.input(|i| i.pointer.velocity());
                self.camera.drag_end(to_glam(velocity));
            }

            let dt = ctx.input(|i| i.stable_dt);
            self.camera.tick(dt);
            self.drain_events();

            let mut clicked_cell = None;
            {
                let frame = Frame::build(&self.camera);
                match frame.status {
                    CanvasStatus::Empty => {
                        let text = self.load_error.as_deref().unwrap_or("No matching products");
                        painter.text(
                            canvas.center(),
                            egui::Align2::CENTER_CENTER,
                            text,
                            egui::FontId::proportional(16.0),
                            egui::Color32::GRAY,
                        );
                    }
                    CanvasStatus::Loading => {
                        painter.text(
                            canvas.center(),
                            egui::Align2::CENTER_CENTER,
                            "Loading…",
                            egui::FontId::proportional(16.0),
                            egui::Color32::GRAY,
                        );
                    }
                    CanvasStatus::Ready => {
                        Self::paint_frame(&painter, canvas.min, &frame);
                        if response.clicked() {
                            clicked_cell = response
                                .interact_pointer_pos()
                                .and_then(|pos| frame.hit_test(to_glam(pos - canvas.min)))
                                .map(|tile| tile.cell);
                        }
                    }
                }
            }

            if let Some(cell) = clicked_cell {
                self.camera.center_on(cell);
                self.drain_events();
            }

            if self.camera.is_animating() {
                ctx.request_repaint();
            } else if self.watcher.is_some() {
                ctx.request_repaint_after(Duration::from_millis(500));
            }
        });
    }
}
