use std::f64::consts::PI;

use crate::geometry::{Projection, ScreenPoint, ViewKey};

pub const MIN_LATITUDE: f64 = -85.051_128_78;
pub const MAX_LATITUDE: f64 = 85.051_128_78;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

pub const DEFAULT_LATITUDE: f64 = 54.0;
pub const DEFAULT_LONGITUDE: f64 = -130.0;
pub const DEFAULT_ZOOM: u8 = 4;
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 18;
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Web Mercator view onto a horizontally repeating world.
///
/// The centre is kept in world pixels at the current zoom, so panning is
/// integer arithmetic and projection is `world - origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center_x: i64,
    center_y: i64,
    zoom: u8,
    width: u32,
    height: u32,
    tile_size: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let mut viewport = Self {
            center_x: 0,
            center_y: 0,
            zoom: DEFAULT_ZOOM,
            width,
            height,
            tile_size: tile_size.max(1),
        };
        viewport.set_display_position(DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_ZOOM);
        viewport
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn center(&self) -> (i64, i64) {
        (self.center_x, self.center_y)
    }

    /// Width of one full world copy in pixels: `tile_size << zoom`.
    pub fn map_width(&self) -> i64 {
        (self.tile_size as i64) << self.zoom
    }

    /// World pixel under the screen's top-left corner.
    pub fn origin(&self) -> (i64, i64) {
        (
            self.center_x - (self.width / 2) as i64,
            self.center_y - (self.height / 2) as i64,
        )
    }

    /// Screen position of the world's top-left corner.
    pub fn top_left(&self) -> (i64, i64) {
        let (ox, oy) = self.origin();
        (-ox, -oy)
    }

    pub fn world_x(&self, longitude: f64) -> f64 {
        (longitude + 180.0) / 360.0 * self.map_width() as f64
    }

    pub fn world_y(&self, latitude: f64) -> f64 {
        let phi = latitude.clamp(MIN_LATITUDE, MAX_LATITUDE).to_radians();
        let merc = (phi.tan() + 1.0 / phi.cos()).ln();
        (1.0 - merc / PI) / 2.0 * self.map_width() as f64
    }

    pub fn longitude_at(&self, world_x: f64) -> f64 {
        world_x / self.map_width() as f64 * 360.0 - 180.0
    }

    pub fn latitude_at(&self, world_y: f64) -> f64 {
        let n = PI * (1.0 - 2.0 * world_y / self.map_width() as f64);
        n.sinh().atan().to_degrees()
    }

    /// Geographic position under a screen point, without wrapping.
    pub fn position(&self, x: i32, y: i32) -> (f64, f64) {
        let (ox, oy) = self.origin();
        (
            self.latitude_at((oy + y as i64) as f64),
            self.longitude_at((ox + x as i64) as f64),
        )
    }

    /// Geographic position under a screen point, wrapped into the valid
    /// latitude and longitude ranges.
    pub fn adjusted_position(&self, x: i32, y: i32) -> (f64, f64) {
        let (lat, lon) = self.position(x, y);
        (
            wrap_into(lat, MIN_LATITUDE, MAX_LATITUDE),
            wrap_into(lon, MIN_LONGITUDE, MAX_LONGITUDE),
        )
    }

    pub fn set_display_position(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_x = self.world_x(longitude).floor() as i64;
        self.center_y = self.world_y(latitude).floor() as i64;
    }

    /// Centre on a coordinate, keeping the zoom.
    pub fn relocate(&mut self, latitude: f64, longitude: f64) {
        self.set_display_position(latitude, longitude, self.zoom);
    }

    /// Move the map content by a pointer delta.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.center_x -= dx as i64;
        self.center_y -= dy as i64;
    }

    /// Zoom to `zoom`, keeping the world point under `(x, y)` fixed.
    /// Returns whether the zoom changed.
    pub fn set_zoom_at(&mut self, zoom: u8, x: i32, y: i32) -> bool {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == self.zoom {
            return false;
        }
        let (ox, oy) = self.origin();
        let factor = 2f64.powi(zoom as i32 - self.zoom as i32);
        let anchor_x = (ox + x as i64) as f64 * factor;
        let anchor_y = (oy + y as i64) as f64 * factor;
        self.zoom = zoom;
        self.center_x = anchor_x.round() as i64 - (x as i64 - (self.width / 2) as i64);
        self.center_y = anchor_y.round() as i64 - (y as i64 - (self.height / 2) as i64);
        true
    }

    pub fn zoom_in_at(&mut self, x: i32, y: i32) -> bool {
        self.set_zoom_at(self.zoom.saturating_add(1), x, y)
    }

    pub fn zoom_out_at(&mut self, x: i32, y: i32) -> bool {
        self.set_zoom_at(self.zoom.saturating_sub(1), x, y)
    }

    /// Bring the horizontal centre back into the first world copy. The view
    /// looks identical before and after.
    pub fn rewrap(&mut self) -> bool {
        let w = self.map_width();
        let wrapped = self.center_x.rem_euclid(w);
        let moved = wrapped != self.center_x;
        self.center_x = wrapped;
        moved
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Projection for Viewport {
    fn project(&self, latitude: f64, longitude: f64) -> ScreenPoint {
        let (ox, oy) = self.origin();
        let x = self.world_x(longitude).floor() as i64 - ox;
        let y = self.world_y(latitude).floor() as i64 - oy;
        ScreenPoint::new(saturate(x), saturate(y))
    }

    fn view_key(&self) -> ViewKey {
        let (origin_x, origin_y) = self.origin();
        ViewKey {
            zoom: self.zoom,
            origin_x,
            origin_y,
        }
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn wrap_into(value: f64, min: f64, max: f64) -> f64 {
    if (min..=max).contains(&value) {
        value
    } else {
        min + (value - min).rem_euclid(max - min)
    }
}
