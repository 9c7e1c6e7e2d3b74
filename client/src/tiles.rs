use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::raster::Raster;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

/// Slippy-map column for a longitude, clamped to the valid range.
pub fn lon_to_tile_x(longitude: f64, zoom: u8) -> u32 {
    let n = (1u64 << zoom) as f64;
    let x = ((longitude + 180.0) / 360.0 * n).floor();
    x.clamp(0.0, n - 1.0) as u32
}

/// Slippy-map row for a latitude, clamped to `[0, 2^zoom - 1]`.
pub fn lat_to_tile_y(latitude: f64, zoom: u8) -> u32 {
    let n = (1u64 << zoom) as f64;
    let phi = latitude.to_radians();
    let y = ((1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / PI) / 2.0 * n).floor();
    if y.is_nan() {
        return 0;
    }
    y.clamp(0.0, n - 1.0) as u32
}

/// Tiles kept in memory by default. At 256 px this is 32 MiB of RGBA.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 128;

/// Supplies square base-map tiles. `None` means not loaded yet; the
/// renderer skips the cell and tries again next frame.
pub trait TileSource {
    fn tile_size(&self) -> u32;
    fn get_tile(&self, key: TileKey) -> Option<Arc<Raster>>;
}

#[derive(Debug, Clone)]
struct CachedTile {
    /// `None` records that the tile does not exist, so it is not asked for again.
    raster: Option<Arc<Raster>>,
    last_used: u64,
}

/// Bounded in-memory tile store filled on demand.
///
/// `request_missing` is called with each frame's plan: it stamps the planned
/// tiles as used and returns the keys that still have to be fetched. Keys
/// stay pending until `insert` or `mark_unavailable` resolves them. When the
/// store grows past its capacity the least recently planned entries go first;
/// entries planned in the current pass are never evicted.
#[derive(Debug, Clone)]
pub struct TileCache {
    tile_size: u32,
    capacity: usize,
    tiles: HashMap<TileKey, CachedTile>,
    pending: HashSet<TileKey>,
    clock: u64,
}

impl TileCache {
    pub fn new(tile_size: u32) -> Self {
        Self::with_capacity(tile_size, DEFAULT_TILE_CACHE_CAPACITY)
    }

    pub fn with_capacity(tile_size: u32, capacity: usize) -> Self {
        Self {
            tile_size,
            capacity: capacity.max(1),
            tiles: HashMap::new(),
            pending: HashSet::new(),
            clock: 0,
        }
    }

    /// Keys in `placements` that are neither cached nor already requested.
    /// Each key is returned once and then counts as pending.
    pub fn request_missing(&mut self, placements: &[TilePlacement]) -> Vec<TileKey> {
        self.clock += 1;
        let mut wanted = Vec::new();
        for placement in placements {
            let key = placement.key;
            if let Some(entry) = self.tiles.get_mut(&key) {
                entry.last_used = self.clock;
            } else if self.pending.insert(key) {
                wanted.push(key);
            }
        }
        wanted
    }

    /// Store a tile. Tiles of the wrong size are refused and the key is
    /// recorded as unavailable.
    pub fn insert(&mut self, key: TileKey, raster: Raster) -> bool {
        if raster.width() != self.tile_size || raster.height() != self.tile_size {
            self.mark_unavailable(key);
            return false;
        }
        self.store(key, Some(Arc::new(raster)));
        true
    }

    /// Record that `key` has no tile.
    pub fn mark_unavailable(&mut self, key: TileKey) {
        self.store(key, None);
    }

    fn store(&mut self, key: TileKey, raster: Option<Arc<Raster>>) {
        self.pending.remove(&key);
        self.tiles.insert(
            key,
            CachedTile {
                raster,
                last_used: self.clock,
            },
        );
        self.evict();
    }

    fn evict(&mut self) {
        while self.tiles.len() > self.capacity {
            let oldest = self
                .tiles
                .iter()
                .filter(|(_, entry)| entry.last_used < self.clock)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    self.tiles.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Tiles held in memory, not counting known-absent keys.
    pub fn len(&self) -> usize {
        self.tiles.values().filter(|e| e.raster.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl TileSource for TileCache {
    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn get_tile(&self, key: TileKey) -> Option<Arc<Raster>> {
        self.tiles.get(&key).and_then(|e| e.raster.clone())
    }
}

/// One tile to draw with its top-left at `(x, y)` on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub key: TileKey,
    pub x: i32,
    pub y: i32,
}

/// Every tile placement needed to cover the viewport: the primary world
/// copy, then extra columns walked westward from its left edge and
/// eastward from its right edge. Rows never wrap.
pub fn plan_tiles(viewport: &Viewport) -> Vec<TilePlacement> {
    let tile = viewport.tile_size() as i64;
    let width = viewport.width() as i64;
    let height = viewport.height() as i64;
    let map_width = viewport.map_width();
    let (top_left_x, top_left_y) = viewport.top_left();

    let rows = visible_range(top_left_y, map_width, tile, height);
    if rows.is_empty() {
        return Vec::new();
    }

    let mut columns = Vec::new();

    let main = visible_range(top_left_x, map_width, tile, width);
    columns.extend(main.map(|c| top_left_x + c * tile));

    // West: columns ending at the world's left edge, walking left.
    let mut x = top_left_x;
    if x > width {
        x -= (x - width) / tile * tile;
    }
    while x > 0 {
        columns.push(x - tile);
        x -= tile;
    }

    // East: columns starting at the world's right edge, walking right.
    let mut x = top_left_x + map_width;
    if x < -tile {
        x += (-tile - x) / tile * tile;
    }
    while x < width {
        if x + tile > 0 {
            columns.push(x);
        }
        x += tile;
    }

    let mut placements = Vec::with_capacity(columns.len() * rows.clone().count());
    for &col in &columns {
        if col >= width || col + tile <= 0 {
            continue;
        }
        for row in rows.clone() {
            let y = top_left_y + row * tile;
            placements.push(TilePlacement {
                key: tile_at(viewport, col, y),
                x: col as i32,
                y: y as i32,
            });
        }
    }
    placements
}

/// Indices of the `tile`-sized cells of a `span`-long strip starting at
/// screen coordinate `start` that overlap `[0, extent)`.
fn visible_range(start: i64, span: i64, tile: i64, extent: i64) -> std::ops::Range<i64> {
    let count = span / tile;
    let first = (-start).div_euclid(tile).max(0);
    let last = (extent - 1 - start).div_euclid(tile).min(count - 1);
    if last < first {
        return 0..0;
    }
    first..last + 1
}

/// Key of the tile whose top-left pixel is at screen `(x, y)`, found by
/// sampling one pixel inside it.
fn tile_at(viewport: &Viewport, x: i64, y: i64) -> TileKey {
    let (lat, lon) = viewport.adjusted_position((x + 1) as i32, (y + 1) as i32);
    TileKey {
        x: lon_to_tile_x(lon, viewport.zoom()),
        y: lat_to_tile_y(lat, viewport.zoom()),
        zoom: viewport.zoom(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slippy_formulas_match_reference_points() {
        assert_eq!(lon_to_tile_x(-180.0, 4), 0);
        assert_eq!(lon_to_tile_x(0.0, 4), 8);
        assert_eq!(lon_to_tile_x(179.99, 4), 15);
        assert_eq!(lon_to_tile_x(180.0, 4), 15);
        assert_eq!(lat_to_tile_y(0.0, 4), 8);
        assert_eq!(lat_to_tile_y(85.0, 4), 0);
        assert_eq!(lat_to_tile_y(-85.0, 4), 15);
    }

    #[test]
    fn tile_y_is_clamped_at_the_poles() {
        assert_eq!(lat_to_tile_y(89.9, 3), 0);
        assert_eq!(lat_to_tile_y(-89.9, 3), 7);
        assert_eq!(lat_to_tile_y(90.0, 3), 0);
    }

    fn placement(x: u32, y: u32, zoom: u8) -> TilePlacement {
        TilePlacement {
            key: TileKey { x, y, zoom },
            x: 0,
            y: 0,
        }
    }

    #[test]
    fn cache_refuses_wrong_size() {
        let mut cache = TileCache::new(4);
        let key = TileKey { x: 0, y: 0, zoom: 0 };
        assert!(!cache.insert(key, Raster::new(3, 4)));
        assert!(cache.get_tile(key).is_none());
        assert!(cache.insert(key, Raster::new(4, 4)));
        assert!(cache.get_tile(key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_keys_are_requested_once() {
        let mut cache = TileCache::new(4);
        let plan = [placement(0, 0, 1), placement(1, 0, 1), placement(0, 0, 1)];
        let wanted = cache.request_missing(&plan);
        assert_eq!(wanted, vec![plan[0].key, plan[1].key]);
        assert_eq!(cache.pending(), 2);
        assert!(cache.request_missing(&plan).is_empty());

        cache.insert(plan[0].key, Raster::new(4, 4));
        cache.mark_unavailable(plan[1].key);
        assert_eq!(cache.pending(), 0);
        assert!(cache.request_missing(&plan).is_empty());
        assert_eq!(cache.len(), 1);
        assert!(cache.get_tile(plan[1].key).is_none());
    }

    #[test]
    fn deep_zoom_keys_are_requested() {
        let mut v = Viewport::new(512, 512, 256);
        v.set_display_position(10.0, 10.0, 15);
        let mut cache = TileCache::new(256);
        let wanted = cache.request_missing(&plan_tiles(&v));
        assert!(!wanted.is_empty());
        assert!(wanted.iter().all(|k| k.zoom == 15));
    }

    #[test]
    fn least_recently_planned_tiles_are_evicted() {
        let mut cache = TileCache::with_capacity(4, 2);
        let a = placement(0, 0, 2);
        let b = placement(1, 0, 2);
        let c = placement(2, 0, 2);

        cache.request_missing(&[a, b]);
        cache.insert(a.key, Raster::new(4, 4));
        cache.insert(b.key, Raster::new(4, 4));

        cache.request_missing(&[b, c]);
        cache.insert(c.key, Raster::new(4, 4));
        assert_eq!(cache.len(), 2);
        assert!(cache.get_tile(a.key).is_none());
        assert!(cache.get_tile(b.key).is_some());
        assert!(cache.get_tile(c.key).is_some());
    }

    #[test]
    fn tiles_in_the_current_plan_survive_over_capacity() {
        let mut cache = TileCache::with_capacity(4, 1);
        let plan = [placement(0, 0, 1), placement(1, 0, 1)];
        for key in cache.request_missing(&plan) {
            cache.insert(key, Raster::new(4, 4));
        }
        assert_eq!(cache.len(), 2);
    }

    fn assert_covers(viewport: &Viewport, placements: &[TilePlacement]) {
        let tile = viewport.tile_size() as i32;
        for sx in (0..viewport.width() as i32).step_by(7) {
            for sy in (0..viewport.height() as i32).step_by(7) {
                let (_, top_left_y) = viewport.top_left();
                let map_bottom = top_left_y as i32 + viewport.map_width() as i32;
                if sy < top_left_y as i32 || sy >= map_bottom {
                    continue;
                }
                let hits = placements
                    .iter()
                    .filter(|p| sx >= p.x && sx < p.x + tile && sy >= p.y && sy < p.y + tile)
                    .count();
                assert_eq!(hits, 1, "pixel ({sx}, {sy}) covered {hits} times");
            }
        }
    }

    #[test]
    fn small_world_is_repeated_across_the_screen() {
        let mut v = Viewport::new(1000, 300, 256);
        v.set_display_position(0.0, 0.0, 1);
        let placements = plan_tiles(&v);
        assert_covers(&v, &placements);

        let columns: HashSet<u32> = placements.iter().map(|p| p.key.x).collect();
        assert_eq!(columns, HashSet::from([0, 1]));
    }

    #[test]
    fn keys_follow_the_world_column_under_each_placement() {
        let mut v = Viewport::new(800, 600, 256);
        v.set_display_position(0.0, 170.0, 2);
        let placements = plan_tiles(&v);
        assert_covers(&v, &placements);

        let (top_left_x, top_left_y) = v.top_left();
        for p in &placements {
            let world_col = (p.x as i64 - top_left_x).div_euclid(256).rem_euclid(4) as u32;
            let world_row = (p.y as i64 - top_left_y).div_euclid(256) as u32;
            assert_eq!(p.key.x, world_col, "placement at x={}", p.x);
            assert_eq!(p.key.y, world_row, "placement at y={}", p.y);
            assert_eq!(p.key.zoom, 2);
        }
        assert!(placements.iter().any(|p| p.x as i64 >= top_left_x + v.map_width()));
    }

    #[test]
    fn western_columns_are_planned_when_map_starts_on_screen() {
        let mut v = Viewport::new(800, 600, 256);
        v.set_display_position(0.0, -175.0, 3);
        let placements = plan_tiles(&v);
        assert_covers(&v, &placements);
        let (top_left_x, _) = v.top_left();
        assert!(top_left_x > 0);
        assert!(placements.iter().any(|p| (p.x as i64) < top_left_x && p.key.x == 7));
    }

    #[test]
    fn deep_zoom_plans_only_visible_tiles() {
        let mut v = Viewport::new(512, 512, 256);
        v.set_display_position(10.0, 10.0, 12);
        let placements = plan_tiles(&v);
        assert!(placements.len() <= 9, "{} placements", placements.len());
        assert_covers(&v, &placements);
    }
}
