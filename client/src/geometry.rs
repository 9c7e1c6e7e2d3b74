use mappa_shared::Ring;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("projected ring has {xs} x-coordinates but {ys} y-coordinates")]
    LengthMismatch { xs: usize, ys: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects_rect(&self, width: i32, height: i32) -> bool {
        self.max_x >= 0 && self.min_x < width && self.max_y >= 0 && self.min_y < height
    }
}

/// A closed polygon in screen pixels. Always has at least three vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenPolygon {
    points: Vec<ScreenPoint>,
    bounds: Bounds,
}

impl ScreenPolygon {
    /// Build from parallel x/y arrays. Fewer than three vertices is not a
    /// polygon and yields `Ok(None)`.
    pub fn from_parallel(xs: &[i32], ys: &[i32]) -> Result<Option<Self>, GeometryError> {
        if xs.len() != ys.len() {
            return Err(GeometryError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        let points = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| ScreenPoint { x, y })
            .collect();
        Ok(Self::from_points(points))
    }

    pub fn from_points(points: Vec<ScreenPoint>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let bounds = bounds_of(&points);
        Some(Self { points, bounds })
    }

    pub fn points(&self) -> &[ScreenPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| ScreenPoint {
                x: p.x.saturating_add(dx),
                y: p.y.saturating_add(dy),
            })
            .collect();
        let b = self.bounds;
        Self {
            points,
            bounds: Bounds {
                min_x: b.min_x.saturating_add(dx),
                min_y: b.min_y.saturating_add(dy),
                max_x: b.max_x.saturating_add(dx),
                max_y: b.max_y.saturating_add(dy),
            },
        }
    }

    /// Even-odd point-in-polygon test.
    pub fn contains(&self, p: ScreenPoint) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        let (px, py) = (p.x as f64, p.y as f64);
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (xi, yi) = (self.points[i].x as f64, self.points[i].y as f64);
            let (xj, yj) = (self.points[j].x as f64, self.points[j].y as f64);
            if (yi > py) != (yj > py) {
                let cross_x = (xj - xi) * (py - yi) / (yj - yi) + xi;
                if px < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn bounds_of(points: &[ScreenPoint]) -> Bounds {
    let mut b = Bounds {
        min_x: i32::MAX,
        min_y: i32::MAX,
        max_x: i32::MIN,
        max_y: i32::MIN,
    };
    for p in points {
        b.min_x = b.min_x.min(p.x);
        b.min_y = b.min_y.min(p.y);
        b.max_x = b.max_x.max(p.x);
        b.max_y = b.max_y.max(p.y);
    }
    b
}

/// Identifies the projection state a cached shape was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub zoom: u8,
    pub origin_x: i64,
    pub origin_y: i64,
}

/// Maps geographic coordinates to screen pixels. Must return a point for
/// every input, including coordinates outside the visible area.
pub trait Projection {
    fn project(&self, latitude: f64, longitude: f64) -> ScreenPoint;
    fn view_key(&self) -> ViewKey;
}

/// Project one ring. `Ok(None)` when it has fewer than three vertices.
pub fn project_ring(
    ring: &Ring,
    projection: &impl Projection,
) -> Result<Option<ScreenPolygon>, GeometryError> {
    if ring.longitudes.len() != ring.latitudes.len() {
        return Err(GeometryError::LengthMismatch {
            xs: ring.longitudes.len(),
            ys: ring.latitudes.len(),
        });
    }
    let mut xs = Vec::with_capacity(ring.len());
    let mut ys = Vec::with_capacity(ring.len());
    for (lon, lat) in ring.vertices() {
        let p = projection.project(lat, lon);
        xs.push(p.x);
        ys.push(p.y);
    }
    ScreenPolygon::from_parallel(&xs, &ys)
}

/// Project every ring of a region. A single degenerate ring makes the
/// whole region absent for this view.
pub fn project_region(
    rings: &[Ring],
    projection: &impl Projection,
) -> Result<Option<Vec<ScreenPolygon>>, GeometryError> {
    let mut polygons = Vec::with_capacity(rings.len());
    for ring in rings {
        match project_ring(ring, projection)? {
            Some(polygon) => polygons.push(polygon),
            None => return Ok(None),
        }
    }
    Ok(Some(polygons))
}

/// A region's screen-space shape: projected polygons for the current view
/// plus the wrap-around copies painted in the last frame.
#[derive(Debug, Clone, Default)]
pub struct GeoPolygon {
    polygons: Option<Vec<ScreenPolygon>>,
    copies: Vec<ScreenPolygon>,
    key: Option<ViewKey>,
}

impl GeoPolygon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproject if the view changed since the last call. Returns whether a
    /// reprojection happened. On error the shape is absent for this view.
    pub fn refresh(
        &mut self,
        rings: &[Ring],
        projection: &impl Projection,
    ) -> Result<bool, GeometryError> {
        let key = projection.view_key();
        if self.key == Some(key) {
            return Ok(false);
        }
        self.key = Some(key);
        self.copies.clear();
        match project_region(rings, projection) {
            Ok(polygons) => {
                self.polygons = polygons;
                Ok(true)
            }
            Err(e) => {
                self.polygons = None;
                Err(e)
            }
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.polygons.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn polygons(&self) -> &[ScreenPolygon] {
        self.polygons.as_deref().unwrap_or_default()
    }

    pub fn copies(&self) -> &[ScreenPolygon] {
        &self.copies
    }

    pub fn set_copies(&mut self, copies: Vec<ScreenPolygon>) {
        self.copies = copies;
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        if !self.is_drawable() {
            return false;
        }
        self.polygons().iter().any(|poly| poly.contains(p))
            || self.copies.iter().any(|poly| poly.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity-ish projection: longitude to x, latitude to y, shifted by an offset.
    struct Flat {
        offset: i32,
    }

    impl Projection for Flat {
        fn project(&self, latitude: f64, longitude: f64) -> ScreenPoint {
            ScreenPoint::new(longitude as i32 + self.offset, latitude as i32)
        }

        fn view_key(&self) -> ViewKey {
            ViewKey {
                zoom: 0,
                origin_x: self.offset as i64,
                origin_y: 0,
            }
        }
    }

    fn triangle() -> Ring {
        Ring::from_points(&[(10.0, 10.0), (50.0, 10.0), (30.0, 40.0)])
    }

    #[test]
    fn three_points_make_one_triangle() {
        let polys = project_region(&[triangle()], &Flat { offset: 0 })
            .expect("no error")
            .expect("drawable");
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 3);
        assert_eq!(
            polys[0].bounds(),
            Bounds {
                min_x: 10,
                min_y: 10,
                max_x: 50,
                max_y: 40
            }
        );
    }

    #[test]
    fn two_points_make_nothing() {
        let ring = Ring::from_points(&[(0.0, 0.0), (5.0, 5.0)]);
        assert_eq!(project_ring(&ring, &Flat { offset: 0 }), Ok(None));
    }

    #[test]
    fn one_degenerate_ring_drops_whole_region() {
        let short = Ring::from_points(&[(0.0, 0.0), (5.0, 5.0)]);
        let result = project_region(&[triangle(), short], &Flat { offset: 0 });
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn empty_ring_list_is_drawable_nothing() {
        let result = project_region(&[], &Flat { offset: 0 }).expect("no error");
        assert_eq!(result, Some(Vec::new()));
    }

    #[test]
    fn mismatched_arrays_are_a_geometry_error() {
        assert_eq!(
            ScreenPolygon::from_parallel(&[1, 2, 3], &[1, 2]),
            Err(GeometryError::LengthMismatch { xs: 3, ys: 2 })
        );

        let ring = Ring {
            longitudes: vec![1.0, 2.0, 3.0, 4.0],
            latitudes: vec![1.0, 2.0, 3.0],
        };
        assert_eq!(
            project_ring(&ring, &Flat { offset: 0 }),
            Err(GeometryError::LengthMismatch { xs: 4, ys: 3 })
        );
    }

    #[test]
    fn contains_uses_even_odd_rule() {
        let square = ScreenPolygon::from_parallel(&[0, 20, 20, 0], &[0, 0, 20, 20])
            .expect("valid")
            .expect("polygon");
        assert!(square.contains(ScreenPoint::new(10, 10)));
        assert!(!square.contains(ScreenPoint::new(25, 10)));
        assert!(!square.contains(ScreenPoint::new(-1, 10)));

        // Bow tie: the top and bottom lobes are inside, the side notches are not.
        let bow = ScreenPolygon::from_parallel(&[0, 20, 0, 20], &[0, 20, 20, 0])
            .expect("valid")
            .expect("polygon");
        assert!(bow.contains(ScreenPoint::new(10, 3)));
        assert!(bow.contains(ScreenPoint::new(10, 17)));
        assert!(!bow.contains(ScreenPoint::new(3, 10)));
    }

    #[test]
    fn translated_moves_points_and_bounds() {
        let square = ScreenPolygon::from_parallel(&[0, 20, 20, 0], &[0, 0, 20, 20])
            .expect("valid")
            .expect("polygon");
        let moved = square.translated(-100, 5);
        assert_eq!(moved.bounds().min_x, -100);
        assert_eq!(moved.bounds().max_y, 25);
        assert!(moved.contains(ScreenPoint::new(-90, 15)));
        assert!(!moved.contains(ScreenPoint::new(10, 10)));
    }

    #[test]
    fn geo_polygon_reprojects_only_when_view_changes() {
        let rings = vec![triangle()];
        let mut shape = GeoPolygon::new();
        assert_eq!(shape.refresh(&rings, &Flat { offset: 0 }), Ok(true));
        assert_eq!(shape.refresh(&rings, &Flat { offset: 0 }), Ok(false));
        assert!(shape.contains(ScreenPoint::new(30, 20)));

        assert_eq!(shape.refresh(&rings, &Flat { offset: 100 }), Ok(true));
        assert!(!shape.contains(ScreenPoint::new(30, 20)));
        assert!(shape.contains(ScreenPoint::new(130, 20)));
    }

    #[test]
    fn geo_polygon_hit_tests_copies() {
        let rings = vec![triangle()];
        let mut shape = GeoPolygon::new();
        shape.refresh(&rings, &Flat { offset: 0 }).expect("projects");
        let copy = shape.polygons()[0].translated(1000, 0);
        shape.set_copies(vec![copy]);
        assert!(shape.contains(ScreenPoint::new(1030, 20)));
        assert!(!shape.contains(ScreenPoint::new(530, 20)));
    }

    #[test]
    fn geo_polygon_error_leaves_shape_absent() {
        let rings = vec![Ring {
            longitudes: vec![1.0],
            latitudes: vec![],
        }];
        let mut shape = GeoPolygon::new();
        assert!(shape.refresh(&rings, &Flat { offset: 0 }).is_err());
        assert!(!shape.is_drawable());
        assert!(!shape.contains(ScreenPoint::new(1, 0)));
    }
}
