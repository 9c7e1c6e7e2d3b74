use mappa_shared::Colour;

use crate::geometry::ScreenPolygon;

/// Row-major RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
        }
    }

    /// Wrap raw RGBA8 bytes. `None` if the length doesn't match the size.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }
        let pixels = bytemuck::cast_slice::<u8, [u8; 4]>(bytes).to_vec();
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            self.pixels[y as usize * self.width as usize + x as usize] = rgba;
        }
    }

    /// Pixel at `(x, y)` with both coordinates wrapped into the image.
    pub fn sample_wrapped(&self, x: i64, y: i64) -> [u8; 4] {
        if self.pixels.is_empty() {
            return [0, 0, 0, 0];
        }
        let wx = x.rem_euclid(self.width as i64) as usize;
        let wy = y.rem_euclid(self.height as i64) as usize;
        self.pixels[wy * self.width as usize + wx]
    }

    pub fn clear(&mut self, colour: Colour) {
        self.pixels.fill(colour.to_rgba());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![[0, 0, 0, 0]; width as usize * height as usize];
    }

    /// Copy `src` with its top-left at `(x, y)`, clipped to this image.
    pub fn blit(&mut self, src: &Raster, x: i32, y: i32) {
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + src.width as i64).min(self.width as i64);
        let y1 = (y as i64 + src.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = self.width as usize;
        let src_stride = src.width as usize;
        let run = (x1 - x0) as usize;
        for dy in y0..y1 {
            let sy = (dy - y as i64) as usize;
            let sx = (x0 - x as i64) as usize;
            let dst_start = dy as usize * stride + x0 as usize;
            let src_start = sy * src_stride + sx;
            self.pixels[dst_start..dst_start + run]
                .copy_from_slice(&src.pixels[src_start..src_start + run]);
        }
    }

    /// Scanline fill with the even-odd rule; pixel centres sit at +0.5.
    /// Returns the number of pixels written.
    pub fn fill_polygon(&mut self, polygon: &ScreenPolygon, paint: Paint<'_>) -> usize {
        let bounds = polygon.bounds();
        if !bounds.intersects_rect(self.width as i32, self.height as i32) {
            return 0;
        }
        let row_start = bounds.min_y.max(0);
        let row_end = bounds.max_y.min(self.height as i32 - 1);
        let points = polygon.points();
        let mut crossings: Vec<f64> = Vec::with_capacity(points.len());
        let mut written = 0;

        for row in row_start..=row_end {
            let scan_y = row as f64 + 0.5;
            crossings.clear();
            let mut j = points.len() - 1;
            for i in 0..points.len() {
                let (xi, yi) = (points[i].x as f64, points[i].y as f64);
                let (xj, yj) = (points[j].x as f64, points[j].y as f64);
                if (yi > scan_y) != (yj > scan_y) {
                    crossings.push(xi + (scan_y - yi) * (xj - xi) / (yj - yi));
                }
                j = i;
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                let first = (span[0] - 0.5).ceil().max(0.0) as i64;
                let last = ((span[1] - 0.5).ceil() as i64 - 1).min(self.width as i64 - 1);
                for col in first..=last {
                    let idx = row as usize * self.width as usize + col as usize;
                    let src = paint.colour_at(col, row as i64);
                    self.pixels[idx] = blend(self.pixels[idx], src);
                    written += 1;
                }
            }
        }
        written
    }
}

/// What a polygon is filled with.
#[derive(Debug, Clone, Copy)]
pub enum Paint<'a> {
    Solid(Colour),
    /// Tiled image whose origin sits at `anchor`.
    Texture {
        tile: &'a Raster,
        anchor: (i32, i32),
    },
}

impl Paint<'_> {
    fn colour_at(&self, x: i64, y: i64) -> [u8; 4] {
        match self {
            Paint::Solid(c) => c.to_rgba(),
            Paint::Texture { tile, anchor } => {
                tile.sample_wrapped(x - anchor.0 as i64, y - anchor.1 as i64)
            }
        }
    }
}

/// Source-over compositing of `src` onto `dst`.
pub fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let a = src[3] as u32;
    if a == 255 {
        return src;
    }
    if a == 0 {
        return dst;
    }
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
    let out_a = a + (dst[3] as u32 * inv + 127) / 255;
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_a.min(255) as u8,
    ]
}
