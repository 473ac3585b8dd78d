//! Navigation core for an infinite, wrap-around tiled canvas of catalog items.
//!
//! The host feeds viewport sizes, drag gestures and frame time into a
//! [`CameraController`], then draws the [`Frame`] it derives each tick.

pub mod camera;
pub mod catalog;
pub mod config;
pub mod culling;
pub mod error;
pub mod focus;
pub mod frame;
pub mod index_map;
pub mod layout;
pub mod prefetch;
pub mod spring;
pub mod styling;

pub use camera::{CameraController, CanvasEvent, CanvasObserver, CanvasStatus, InteractionState, ReleaseOutcome};
pub use catalog::{Catalog, CatalogItem, CatalogSource, CatalogWatcher, ItemId, TagCategory, Tags};
pub use config::EngineConfig;
pub use error::{CatalogError, ConfigError, PrefetchError};
pub use frame::{Frame, Rect, Tile};
pub use index_map::VirtualCell;
pub use layout::{LayoutConfig, LayoutEngine};
