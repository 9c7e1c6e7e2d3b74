use mappa_shared::Colour;
use mappa_shared::colors::{TRANSPARENCY, lighten_channel};

use crate::modes::ViewMode;
use crate::noise::NoiseField;
use crate::raster::Raster;

pub const TEXTURE_WIDTH: u32 = 32;
pub const TEXTURE_HEIGHT: u32 = 32;
/// Base sampling frequency in lattice units per pixel.
pub const FREQUENCY: f64 = 1.0 / 16.0;
pub const OCTAVES: u32 = 3;

/// One tileable texture image plus its highlight state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureTile {
    raster: Raster,
    brightened: bool,
}

impl TextureTile {
    pub fn new(raster: Raster) -> Self {
        Self {
            raster,
            brightened: false,
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn is_brightened(&self) -> bool {
        self.brightened
    }

    /// Lighten every channel 50% toward white, or undo a previous
    /// lightening. Alpha is left alone.
    pub fn toggle_brightness(&mut self) {
        let brightened = self.brightened;
        for px in self.raster.pixels_mut() {
            for c in &mut px[..3] {
                *c = if brightened {
                    unlighten_channel(*c)
                } else {
                    lighten_channel(*c)
                };
            }
        }
        self.brightened = !brightened;
    }
}

/// Inverse of `lighten_channel`, exact up to the rounding lost there.
fn unlighten_channel(c: u8) -> u8 {
    (c as i16 * 2 - 255).clamp(0, 255) as u8
}

/// The two textures every drawable region owns: its own colour and its
/// group colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturePair {
    pub mosaic: TextureTile,
    pub family: TextureTile,
}

impl TexturePair {
    pub fn active(&self, mode: ViewMode) -> &TextureTile {
        match mode {
            ViewMode::Mosaic => &self.mosaic,
            ViewMode::Families => &self.family,
        }
    }

    fn active_mut(&mut self, mode: ViewMode) -> &mut TextureTile {
        match mode {
            ViewMode::Mosaic => &mut self.mosaic,
            ViewMode::Families => &mut self.family,
        }
    }

    fn inactive_mut(&mut self, mode: ViewMode) -> &mut TextureTile {
        match mode {
            ViewMode::Mosaic => &mut self.family,
            ViewMode::Families => &mut self.mosaic,
        }
    }

    /// Flip the brightness of the tile the view mode currently shows.
    pub fn update(&mut self, mode: ViewMode) {
        self.active_mut(mode).toggle_brightness();
    }

    /// Bring the active tile to `highlighted` and the other tile back to
    /// normal. Returns whether any pixels changed.
    pub fn set_highlighted(&mut self, mode: ViewMode, highlighted: bool) -> bool {
        let mut changed = false;
        let inactive = self.inactive_mut(mode);
        if inactive.is_brightened() {
            inactive.toggle_brightness();
            changed = true;
        }
        let active = self.active_mut(mode);
        if active.is_brightened() != highlighted {
            active.toggle_brightness();
            changed = true;
        }
        changed
    }
}

/// Builds two-tone tileable textures from fractional Brownian motion.
#[derive(Debug, Clone)]
pub struct TextureSynthesizer {
    noise: NoiseField,
}

impl TextureSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    /// Sum of `octaves` noise samples at doubling frequency and halving
    /// amplitude. The lattice period doubles with the frequency so every
    /// octave tiles at the same pixel width.
    pub fn fbm(&self, x: f64, y: f64, period: i64, octaves: u32) -> f64 {
        (1..=octaves)
            .map(|i| {
                let scale = f64::from(1u32 << i);
                0.5f64.powi(i as i32) * self.noise.sample_periodic(x * scale, y * scale, period << i)
            })
            .sum()
    }

    /// Noise in `[0, 1]` for pixel `(x, y)` of a texture tile.
    pub fn intensity(&self, x: u32, y: u32) -> f64 {
        let base_period = (f64::from(TEXTURE_WIDTH) * FREQUENCY) as i64;
        let n = self.fbm(
            f64::from(x) * FREQUENCY,
            f64::from(y) * FREQUENCY,
            base_period,
            OCTAVES,
        );
        ((n + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// Build the mosaic texture from `primary` and the family texture from
    /// `secondary`. Both share one noise mask.
    pub fn synthesize(&self, primary: Colour, secondary: Colour) -> TexturePair {
        let mut mosaic = Raster::new(TEXTURE_WIDTH, TEXTURE_HEIGHT);
        let mut family = Raster::new(TEXTURE_WIDTH, TEXTURE_HEIGHT);
        let (fg, bg) = (primary.lighten(), primary);
        let (family_fg, family_bg) = (secondary.lighten(), secondary);

        for y in 0..TEXTURE_HEIGHT {
            for x in 0..TEXTURE_WIDTH {
                let raised = self.intensity(x, y) >= 0.5;
                let (m, f) = if raised {
                    (fg, family_fg)
                } else {
                    (bg, family_bg)
                };
                mosaic.set(x, y, m.with_alpha(TRANSPARENCY).to_rgba());
                family.set(x, y, f.with_alpha(TRANSPARENCY).to_rgba());
            }
        }

        TexturePair {
            mosaic: TextureTile::new(mosaic),
            family: TextureTile::new(family),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TexturePair {
        TextureSynthesizer::new(11).synthesize(Colour::rgb(200, 50, 50), Colour::rgb(30, 90, 160))
    }

    #[test]
    fn textures_use_only_two_tones() {
        let p = pair();
        let bg = Colour::rgb(200, 50, 50).to_rgba();
        let fg = Colour::rgb(200, 50, 50).lighten().to_rgba();
        for px in p.mosaic.raster().pixels() {
            assert!(*px == bg || *px == fg, "unexpected pixel {px:?}");
            assert_eq!(px[3], TRANSPARENCY);
        }
    }

    #[test]
    fn mosaic_and_family_share_one_mask() {
        let p = pair();
        let bg = Colour::rgb(200, 50, 50).to_rgba();
        let family_bg = Colour::rgb(30, 90, 160).to_rgba();
        for (m, f) in p.mosaic.raster().pixels().iter().zip(p.family.raster().pixels()) {
            assert_eq!(*m == bg, *f == family_bg);
        }
    }

    #[test]
    fn double_toggle_restores_within_one() {
        let original = pair();
        let mut p = original.clone();
        p.update(ViewMode::Mosaic);
        assert!(p.mosaic.is_brightened());
        assert_ne!(p.mosaic, original.mosaic);
        p.update(ViewMode::Mosaic);
        assert!(!p.mosaic.is_brightened());

        for (a, b) in original.mosaic.raster().pixels().iter().zip(p.mosaic.raster().pixels()) {
            for ch in 0..4 {
                assert!((a[ch] as i16 - b[ch] as i16).abs() <= 1, "{a:?} vs {b:?}");
            }
        }
        assert_eq!(p.family, original.family);
    }

    #[test]
    fn set_highlighted_is_idempotent_and_resets_other_tile() {
        let mut p = pair();
        assert!(p.set_highlighted(ViewMode::Families, true));
        assert!(!p.set_highlighted(ViewMode::Families, true));
        assert!(p.family.is_brightened());

        assert!(p.set_highlighted(ViewMode::Mosaic, true));
        assert!(p.mosaic.is_brightened());
        assert!(!p.family.is_brightened());

        assert!(p.set_highlighted(ViewMode::Mosaic, false));
        assert!(!p.mosaic.is_brightened());
    }

    #[test]
    fn texture_tiles_seamlessly() {
        let synth = TextureSynthesizer::new(23);
        for i in 0..TEXTURE_HEIGHT {
            let a = synth.fbm(0.0, f64::from(i) * FREQUENCY, 2, OCTAVES);
            let b = synth.fbm(
                f64::from(TEXTURE_WIDTH) * FREQUENCY,
                f64::from(i) * FREQUENCY,
                2,
                OCTAVES,
            );
            assert!((a - b).abs() < 1e-9, "row {i}: {a} vs {b}");
        }
    }

    #[test]
    fn same_seed_same_texture() {
        let a = TextureSynthesizer::new(8).synthesize(Colour::WHITE, Colour::BLACK);
        let b = TextureSynthesizer::new(8).synthesize(Colour::WHITE, Colour::BLACK);
        assert_eq!(a, b);
    }

    #[test]
    fn unlighten_inverts_lighten() {
        for c in 0..=255u8 {
            let back = unlighten_channel(lighten_channel(c));
            assert!((back as i16 - c as i16).abs() <= 1);
        }
    }
}
