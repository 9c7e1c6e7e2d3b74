//! Rendering core for the language-area map: texture synthesis, polygon
//! projection with world wrap, selection filtering and the controller that
//! owns them on the presentation thread.

pub mod controller;
pub mod geometry;
pub mod layer;
pub mod modes;
pub mod noise;
pub mod raster;
pub mod render_loop;
pub mod renderer;
pub mod selection;
pub mod texture;
pub mod tiles;
pub mod viewport;

pub use controller::{
    ControllerConfig, ControllerError, DataStatus, DetailChannel, MapController, PointerButton,
    PointerEvent, PointerOutcome, RegionSummary,
};
pub use layer::{RegionLayer, build_layers};
pub use modes::{SelectionMode, UndefinedModeError, ViewMode};
pub use raster::Raster;
pub use renderer::FrameStats;
pub use selection::Criterion;
pub use texture::TextureSynthesizer;
pub use tiles::TileKey;
