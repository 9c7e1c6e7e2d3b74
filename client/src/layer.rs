use mappa_shared::{Colour, Region, RegionId};

use crate::geometry::GeoPolygon;
use crate::modes::ViewMode;
use crate::texture::{TexturePair, TextureSynthesizer};

/// Flat fill colours for every view mode and highlight state, computed once
/// per region so frames don't redo the colour arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedFills {
    pub mosaic: Colour,
    pub mosaic_highlighted: Colour,
    pub family: Colour,
    pub family_highlighted: Colour,
}

impl CachedFills {
    pub fn from_colours(own: Colour, group: Colour) -> Self {
        Self {
            mosaic: own,
            mosaic_highlighted: own.lighten(),
            family: group,
            family_highlighted: group.lighten(),
        }
    }

    pub fn get(&self, mode: ViewMode, highlighted: bool) -> Colour {
        match (mode, highlighted) {
            (ViewMode::Mosaic, false) => self.mosaic,
            (ViewMode::Mosaic, true) => self.mosaic_highlighted,
            (ViewMode::Families, false) => self.family,
            (ViewMode::Families, true) => self.family_highlighted,
        }
    }
}

/// Render-side state for one region: its screen shape, textures and fills.
#[derive(Debug, Clone)]
pub struct RegionLayer {
    pub region: Region,
    pub shape: GeoPolygon,
    /// `None` for regions with nothing to draw.
    pub textures: Option<TexturePair>,
    pub fills: CachedFills,
    highlighted: bool,
}

impl RegionLayer {
    pub fn from_region(region: Region, synth: &TextureSynthesizer) -> Self {
        let textures = region
            .has_geometry()
            .then(|| synth.synthesize(region.colour, region.group_colour));
        let fills = CachedFills::from_colours(region.colour, region.group_colour);
        Self {
            region,
            shape: GeoPolygon::new(),
            textures,
            fills,
            highlighted: false,
        }
    }

    pub fn id(&self) -> RegionId {
        self.region.id
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn fill_colour(&self, mode: ViewMode) -> Colour {
        self.fills.get(mode, self.highlighted)
    }

    /// Set the highlight state, brightening or restoring the texture the
    /// view mode shows. Returns whether anything changed.
    pub fn set_highlighted(&mut self, mode: ViewMode, highlighted: bool) -> bool {
        let texture_changed = self
            .textures
            .as_mut()
            .is_some_and(|t| t.set_highlighted(mode, highlighted));
        let changed = self.highlighted != highlighted || texture_changed;
        self.highlighted = highlighted;
        changed
    }
}

/// Build layers for a freshly loaded region list.
pub fn build_layers(regions: Vec<Region>, synth: &TextureSynthesizer) -> Vec<RegionLayer> {
    regions
        .into_iter()
        .map(|r| RegionLayer::from_region(r, synth))
        .collect()
}
