use mappa_shared::{Catalog, RegionDetail, RegionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::geometry::ScreenPoint;
use crate::layer::RegionLayer;
use crate::modes::{SelectionMode, ViewMode};
use crate::raster::Raster;
use crate::render_loop::FrameScheduler;
use crate::renderer::{FrameInputs, FrameStats, SeamlessRenderer, sync_shape};
use crate::selection::{Criterion, SelectionEngine};
use crate::tiles::{DEFAULT_TILE_CACHE_CAPACITY, TileCache, TileKey, plan_tiles};
use crate::viewport::{DEFAULT_TILE_SIZE, Viewport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("unknown selection criterion {0:?}")]
    UnknownCriterion(Criterion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    /// Base-map tiles kept in memory.
    pub tile_cache_capacity: usize,
    pub view_mode: ViewMode,
    pub selection_mode: SelectionMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            tile_size: DEFAULT_TILE_SIZE,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
            view_mode: ViewMode::default(),
            selection_mode: SelectionMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum DataStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailChannel {
    Left,
    Right,
}

/// Pointer input in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Move { x: i32, y: i32 },
    Enter { x: i32, y: i32 },
    Exit,
    Click {
        x: i32,
        y: i32,
        button: PointerButton,
        #[serde(default = "single_click")]
        count: u8,
    },
    Drag { dx: i32, dy: i32 },
    /// Wheel notches; negative zooms in.
    Scroll { x: i32, y: i32, delta: i32 },
}

fn single_click() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerOutcome {
    None,
    Hover {
        region: Option<RegionId>,
        name: Option<String>,
    },
    Detail {
        channel: DetailChannel,
        detail: RegionDetail,
    },
    Zoomed { zoom: u8 },
    Panned,
}

/// Row in the region list handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub id: RegionId,
    pub name: String,
    pub colour: String,
    pub visible: bool,
    pub drawable: bool,
}

/// Presentation-thread state: viewport, selection, highlight and the
/// region layers, plus the surface frames are painted onto.
pub struct MapController {
    viewport: Viewport,
    selection: SelectionEngine,
    layers: Vec<RegionLayer>,
    catalog: Catalog,
    view_mode: ViewMode,
    simple_render: bool,
    hovered: Option<RegionId>,
    status: DataStatus,
    renderer: SeamlessRenderer,
    surface: Raster,
    scheduler: FrameScheduler,
    tiles: TileCache,
    last_stats: FrameStats,
}

impl MapController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            viewport: Viewport::new(config.width, config.height, config.tile_size),
            selection: SelectionEngine::new(config.selection_mode),
            layers: Vec::new(),
            catalog: Catalog::default(),
            view_mode: config.view_mode,
            simple_render: true,
            hovered: None,
            status: DataStatus::Loading,
            renderer: SeamlessRenderer::default(),
            surface: Raster::new(config.width, config.height),
            scheduler: FrameScheduler::new(),
            tiles: TileCache::with_capacity(config.tile_size, config.tile_cache_capacity),
            last_stats: FrameStats::default(),
        }
    }

    /// Take over freshly built layers from the loader.
    pub fn load(&mut self, catalog: Catalog, layers: Vec<RegionLayer>) {
        info!(
            regions = layers.len(),
            families = catalog.families().len(),
            features = catalog.features().len(),
            "Region data loaded"
        );
        self.catalog = catalog;
        self.layers = layers;
        self.hovered = None;
        self.selection.clear();
        self.status = DataStatus::Ready;
        self.scheduler.mark_dirty();
    }

    /// Enter the degraded state: base map only, no regions.
    pub fn load_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        error!(reason = %reason, "Region data unavailable, showing base map only");
        self.layers.clear();
        self.catalog = Catalog::default();
        self.hovered = None;
        self.selection.clear();
        self.status = DataStatus::Failed(reason);
        self.scheduler.mark_dirty();
    }

    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn simple_render(&self) -> bool {
        self.simple_render
    }

    pub fn hovered(&self) -> Option<RegionId> {
        self.hovered
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles the current view needs that nobody has asked for yet. Each
    /// key is handed out once; answer it with `insert_tile` or
    /// `tile_unavailable`.
    pub fn wanted_tiles(&mut self) -> Vec<TileKey> {
        let placements = plan_tiles(&self.viewport);
        self.tiles.request_missing(&placements)
    }

    pub fn insert_tile(&mut self, key: TileKey, raster: Raster) -> bool {
        let inserted = self.tiles.insert(key, raster);
        if inserted {
            self.scheduler.mark_dirty();
        } else {
            warn!(?key, "Dropping tile with unexpected size");
        }
        inserted
    }

    /// The tile source has nothing for `key`; the cell stays background.
    pub fn tile_unavailable(&mut self, key: TileKey) {
        self.tiles.mark_unavailable(key);
    }

    /// Paint a frame if anything changed since the last one, and return
    /// the current surface.
    pub fn render(&mut self) -> (&Raster, FrameStats) {
        if self.scheduler.begin_frame() {
            let inputs = FrameInputs {
                viewport: &self.viewport,
                view_mode: self.view_mode,
                simple_render: self.simple_render,
                highlighted: self.hovered,
                data_failed: matches!(self.status, DataStatus::Failed(_)),
            };
            let selection = &self.selection;
            self.last_stats = self.renderer.render_frame(
                &mut self.surface,
                &self.tiles,
                &mut self.layers,
                |id| selection.is_visible(id),
                inputs,
            );
        }
        (&self.surface, self.last_stats)
    }

    /// Topmost visible region under `point`. The hovered region is drawn
    /// last, so it wins over anything it overlaps.
    pub fn hit_test(&mut self, point: ScreenPoint) -> Option<RegionId> {
        let hovered = self.hovered;
        let mut hit = None;
        for layer in &mut self.layers {
            if !self.selection.is_visible(layer.id()) {
                continue;
            }
            if let Err(e) = sync_shape(&mut layer.shape, &layer.region.rings, &self.viewport) {
                warn!(region = %layer.id(), error = %e, "Region skipped in hit test");
                continue;
            }
            if layer.shape.contains(point) {
                if hovered == Some(layer.id()) {
                    return hovered;
                }
                hit = Some(layer.id());
            }
        }
        hit
    }

    pub fn pointer(&mut self, event: PointerEvent) -> PointerOutcome {
        match event {
            PointerEvent::Move { x, y } | PointerEvent::Enter { x, y } => {
                self.viewport.rewrap();
                let hit = self.hit_test(ScreenPoint::new(x, y));
                self.set_hovered(hit);
                self.hover_outcome()
            }
            PointerEvent::Exit => {
                self.set_hovered(None);
                self.hover_outcome()
            }
            PointerEvent::Click { x, y, count, .. } if count >= 2 => {
                if self.viewport.zoom_in_at(x, y) {
                    self.scheduler.mark_dirty();
                }
                PointerOutcome::Zoomed {
                    zoom: self.viewport.zoom(),
                }
            }
            PointerEvent::Click { x, y, button, .. } => {
                let channel = match button {
                    PointerButton::Left => DetailChannel::Left,
                    PointerButton::Right => DetailChannel::Right,
                    PointerButton::Middle => return PointerOutcome::None,
                };
                if self.status != DataStatus::Ready {
                    return PointerOutcome::None;
                }
                let target = match self.hovered {
                    Some(id) => Some(id),
                    None => self.hit_test(ScreenPoint::new(x, y)),
                };
                match target.and_then(|id| self.detail(id)) {
                    Some(detail) => PointerOutcome::Detail { channel, detail },
                    None => PointerOutcome::None,
                }
            }
            PointerEvent::Drag { dx, dy } => {
                self.viewport.pan(dx, dy);
                self.viewport.rewrap();
                self.scheduler.mark_dirty();
                PointerOutcome::Panned
            }
            PointerEvent::Scroll { x, y, delta } => {
                let changed = match delta.signum() {
                    -1 => self.viewport.zoom_in_at(x, y),
                    1 => self.viewport.zoom_out_at(x, y),
                    _ => false,
                };
                if changed {
                    self.scheduler.mark_dirty();
                }
                PointerOutcome::Zoomed {
                    zoom: self.viewport.zoom(),
                }
            }
        }
    }

    fn set_hovered(&mut self, region: Option<RegionId>) {
        if self.hovered != region {
            debug!(from = ?self.hovered, to = ?region, "Hover changed");
            self.hovered = region;
            self.scheduler.mark_dirty();
        }
    }

    fn hover_outcome(&self) -> PointerOutcome {
        let name = self
            .hovered
            .and_then(|id| self.layer(id))
            .map(|l| l.region.label());
        PointerOutcome::Hover {
            region: self.hovered,
            name,
        }
    }

    /// Drop the hover if the hovered region was just filtered out.
    fn revalidate_hover(&mut self) {
        if let Some(id) = self.hovered {
            if !self.selection.is_visible(id) {
                self.set_hovered(None);
            }
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        if self.view_mode == mode {
            return false;
        }
        self.view_mode = mode;
        self.scheduler.mark_dirty();
        true
    }

    pub fn set_simple_render(&mut self, simple: bool) -> bool {
        if self.simple_render == simple {
            return false;
        }
        self.simple_render = simple;
        self.scheduler.mark_dirty();
        true
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> bool {
        let changed = self
            .selection
            .set_mode(mode, self.layers.iter().map(|l| &l.region));
        if changed {
            self.revalidate_hover();
            self.scheduler.mark_dirty();
        }
        changed
    }

    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<bool, ControllerError> {
        self.check_criterion(criterion)?;
        let changed = self
            .selection
            .add_criterion(criterion, self.layers.iter().map(|l| &l.region));
        self.revalidate_hover();
        self.scheduler.mark_dirty();
        Ok(changed)
    }

    pub fn remove_criterion(&mut self, criterion: Criterion) -> Result<bool, ControllerError> {
        self.check_criterion(criterion)?;
        let changed = self
            .selection
            .remove_criterion(criterion, self.layers.iter().map(|l| &l.region));
        self.revalidate_hover();
        self.scheduler.mark_dirty();
        Ok(changed)
    }

    fn check_criterion(&self, criterion: Criterion) -> Result<(), ControllerError> {
        let known = match criterion {
            Criterion::Family(id) => self.catalog.family(id).is_some(),
            Criterion::Feature(id) => self.catalog.feature(id).is_some(),
            Criterion::Location(id) => self.layer(id).is_some(),
        };
        if known {
            Ok(())
        } else {
            Err(ControllerError::UnknownCriterion(criterion))
        }
    }

    /// Centre on a coordinate, keeping the zoom.
    pub fn relocate(&mut self, latitude: f64, longitude: f64) {
        self.viewport.relocate(latitude, longitude);
        self.viewport.rewrap();
        self.scheduler.mark_dirty();
    }

    pub fn set_display_position(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        self.viewport.set_display_position(latitude, longitude, zoom);
        self.viewport.rewrap();
        self.scheduler.mark_dirty();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.viewport.width(), self.viewport.height()) {
            return;
        }
        self.viewport.resize(width, height);
        self.scheduler.mark_dirty();
    }

    fn layer(&self, id: RegionId) -> Option<&RegionLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn regions(&self) -> Vec<RegionSummary> {
        self.layers
            .iter()
            .map(|l| RegionSummary {
                id: l.id(),
                name: l.region.label(),
                colour: l.region.colour.to_hex(),
                visible: self.selection.is_visible(l.id()),
                drawable: l.region.has_geometry(),
            })
            .collect()
    }

    pub fn detail(&self, id: RegionId) -> Option<RegionDetail> {
        self.layer(id)
            .map(|l| RegionDetail::from_region(&l.region, &self.catalog))
    }
}
