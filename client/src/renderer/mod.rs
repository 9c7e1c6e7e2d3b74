use mappa_shared::{Colour, RegionId, Ring};
use serde::Serialize;
use tracing::{debug, warn};

use crate::geometry::{GeoPolygon, GeometryError, ScreenPolygon};
use crate::layer::RegionLayer;
use crate::modes::ViewMode;
use crate::raster::{Paint, Raster};
use crate::tiles::{TileSource, plan_tiles};
use crate::viewport::Viewport;

/// Fill for screen areas with no tile loaded.
pub const BACKGROUND: Colour = Colour::rgba(170, 211, 223, 255);

/// Immutable, frame-local render inputs.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    pub viewport: &'a Viewport,
    pub view_mode: ViewMode,
    /// Flat colour fills instead of textures.
    pub simple_render: bool,
    pub highlighted: Option<RegionId>,
    /// The data source failed to load; only the base map is painted.
    pub data_failed: bool,
}

/// Per-frame counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub tiles_drawn: u32,
    pub tiles_missing: u32,
    pub regions_painted: u32,
    pub polygons_painted: u32,
    pub copies_painted: u32,
    pub geometry_errors: u32,
    pub pixels_filled: u64,
}

/// Horizontally shifted copies of `polygon` needed so that it appears in
/// every world copy overlapping `[0, screen_width)`. The polygon itself is
/// not included.
pub fn wrap_copies(polygon: &ScreenPolygon, map_width: i64, screen_width: i32) -> Vec<ScreenPolygon> {
    let mut copies = Vec::new();
    let step = match i32::try_from(map_width) {
        Ok(step) if step > 0 => step,
        _ => return copies,
    };

    let mut copy = polygon.translated(-step, 0);
    while copy.bounds().max_x > 0 {
        let next = copy.translated(-step, 0);
        copies.push(copy);
        copy = next;
    }

    let mut copy = polygon.translated(step, 0);
    while copy.bounds().min_x < screen_width {
        let next = copy.translated(step, 0);
        copies.push(copy);
        copy = next;
    }

    copies
}

/// Bring a shape up to date with the viewport: reproject if the view
/// changed, then rebuild its wrap copies.
pub fn sync_shape(
    shape: &mut GeoPolygon,
    rings: &[Ring],
    viewport: &Viewport,
) -> Result<(), GeometryError> {
    shape.refresh(rings, viewport)?;
    let copies = shape
        .polygons()
        .iter()
        .flat_map(|p| wrap_copies(p, viewport.map_width(), viewport.width() as i32))
        .collect();
    shape.set_copies(copies);
    Ok(())
}

/// Paints base tiles and region overlays onto a surface.
#[derive(Debug, Clone)]
pub struct SeamlessRenderer {
    background: Colour,
}

impl Default for SeamlessRenderer {
    fn default() -> Self {
        Self {
            background: BACKGROUND,
        }
    }
}

impl SeamlessRenderer {
    pub fn new(background: Colour) -> Self {
        Self { background }
    }

    /// Paint one frame. `visible` decides which layers are drawn; the
    /// highlighted layer, if visible, is painted last.
    pub fn render_frame(
        &self,
        surface: &mut Raster,
        tiles: &dyn TileSource,
        layers: &mut [RegionLayer],
        visible: impl Fn(RegionId) -> bool,
        inputs: FrameInputs<'_>,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let viewport = inputs.viewport;
        if surface.width() != viewport.width() || surface.height() != viewport.height() {
            surface.resize(viewport.width(), viewport.height());
        }
        surface.clear(self.background);

        for placement in plan_tiles(viewport) {
            match tiles.get_tile(placement.key) {
                Some(tile) => {
                    surface.blit(&tile, placement.x, placement.y);
                    stats.tiles_drawn += 1;
                }
                None => stats.tiles_missing += 1,
            }
        }

        if inputs.data_failed {
            return stats;
        }

        let mut last = None;
        for (index, layer) in layers.iter_mut().enumerate() {
            let shown = visible(layer.id());
            let highlighted = shown && inputs.highlighted == Some(layer.id());
            layer.set_highlighted(inputs.view_mode, highlighted);
            if !shown {
                continue;
            }
            if highlighted {
                last = Some(index);
                continue;
            }
            paint_layer(surface, layer, &inputs, &mut stats);
        }
        if let Some(index) = last {
            paint_layer(surface, &mut layers[index], &inputs, &mut stats);
        }

        debug!(
            tiles = stats.tiles_drawn,
            missing = stats.tiles_missing,
            regions = stats.regions_painted,
            copies = stats.copies_painted,
            "Rendered frame"
        );
        stats
    }
}

fn paint_layer(
    surface: &mut Raster,
    layer: &mut RegionLayer,
    inputs: &FrameInputs<'_>,
    stats: &mut FrameStats,
) {
    if let Err(e) = sync_shape(&mut layer.shape, &layer.region.rings, inputs.viewport) {
        warn!(region = %layer.id(), error = %e, "Skipping region this frame");
        stats.geometry_errors += 1;
        return;
    }
    if !layer.shape.is_drawable() {
        return;
    }

    let texture = if inputs.simple_render {
        None
    } else {
        match &layer.textures {
            Some(pair) => Some(pair.active(inputs.view_mode).raster()),
            // Texture not built; leave the region out this frame.
            None => return,
        }
    };
    let colour = layer.fill_colour(inputs.view_mode);
    let paint_for = |polygon: &ScreenPolygon| match texture {
        Some(tile) => {
            let b = polygon.bounds();
            Paint::Texture {
                tile,
                anchor: (b.min_x, b.min_y),
            }
        }
        None => Paint::Solid(colour),
    };

    for polygon in layer.shape.polygons() {
        stats.pixels_filled += surface.fill_polygon(polygon, paint_for(polygon)) as u64;
        stats.polygons_painted += 1;
    }
    for copy in layer.shape.copies() {
        stats.pixels_filled += surface.fill_polygon(copy, paint_for(copy)) as u64;
        stats.copies_painted += 1;
    }
    stats.regions_painted += 1;
}
