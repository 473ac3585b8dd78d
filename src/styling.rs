use glam::Vec2;

/// Focused tile is drawn enlarged and fully opaque.
pub const FOCUSED_SCALE: f32 = 1.35;
const SCALE_FALLOFF: f32 = 0.45;
const OPACITY_FALLOFF: f32 = 0.4;
/// Inline name/price overlay only shows this close to the center.
const OVERLAY_THRESHOLD: f32 = 0.3;

/// Visual treatment for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStyle {
    pub scale: f32,
    pub opacity: f32,
    pub show_overlay: bool,
    pub overlay_opacity: f32,
}

/// Center-distance falloff for tiles
#[derive(Debug, Clone, Copy)]
pub struct TileDistanceStyler {
    center: Vec2,
    radius: f32,
}

impl TileDistanceStyler {
    pub fn new(viewport: Vec2, falloff: f32) -> Self {
        let half = viewport.max(Vec2::ZERO) * 0.5;
        Self {
            center: half,
            radius: half.length() * falloff,
        }
    }

    /// Normalized distance of a screen point from the viewport center, clamped to [0, 1].
    pub fn distance_factor(&self, screen_center: Vec2) -> f32 {
        let distance = (screen_center - self.center).length();
        let factor = distance / (self.radius + 1e-6);
        if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn style(&self, distance_factor: f32, is_focused: bool, is_interacting: bool) -> TileStyle {
        if is_focused {
            return TileStyle {
                scale: FOCUSED_SCALE,
                opacity: 1.0,
                show_overlay: false,
                overlay_opacity: 0.0,
            };
        }
        let show_overlay = distance_factor < OVERLAY_THRESHOLD && !is_interacting;
        TileStyle {
            scale: 1.0 - SCALE_FALLOFF * distance_factor,
            opacity: 1.0 - OPACITY_FALLOFF * distance_factor,
            show_overlay,
            overlay_opacity: if show_overlay {
                (1.0 - 2.0 * distance_factor).clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}
