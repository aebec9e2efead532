//! Projection between geographic and screen coordinates.

use crate::geo::LatLng;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Size in pixels of the world at zoom level 0.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Default round-trip precision in degrees.
pub const DEFAULT_PRECISION: f64 = 1e-9;

/// A mutually inverse pair of geo → screen and screen → geo transforms.
pub trait Projection {
    /// Convert a geographic coordinate to a screen point.
    fn lat_lng_to_xy(&self, coord: LatLng) -> Point;

    /// Convert a screen point back to a geographic coordinate.
    fn xy_to_lat_lng(&self, xy: Point) -> LatLng;

    /// Tolerance in degrees within which a round trip recovers its input,
    /// for coordinates the projection [`contains`](Projection::contains).
    fn precision(&self) -> f64 {
        DEFAULT_PRECISION
    }

    /// Whether `coord` lies in the domain where the round trip holds.
    fn contains(&self, coord: LatLng) -> bool {
        coord.lat.is_finite() && coord.lon.is_finite()
    }
}

/// Web Mercator viewport with pan and zoom.
///
/// Geographic coordinates are first projected into the unit square and then
/// mapped to the screen by `offset + world * TILE_SIZE * 2^zoom`. The domain
/// is `|lat| <= MAX_LATITUDE`; coordinates beyond it are drawn on the limit
/// but do not round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen-space translation (pan).
    pub offset: Vec2,
    /// Fractional zoom level.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 0.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }
}

impl Viewport {
    /// Create a viewport showing the whole world at zoom 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zoom level, clamped to the allowed range.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }

    /// Set the screen-space pan offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Pixels per world unit at the current zoom.
    pub fn scale(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// World (unit square) to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale())
    }

    /// Screen to world (unit square) transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.offset)
    }

    /// Project a coordinate into the unit square. Latitude is clamped to
    /// [`MAX_LATITUDE`].
    pub fn project(coord: LatLng) -> Point {
        let lat = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (coord.lon + 180.0) / 360.0;
        let y = 0.5 - lat.tan().asinh() / (2.0 * PI);
        Point::new(x, y)
    }

    /// Inverse of [`Viewport::project`].
    pub fn unproject(world: Point) -> LatLng {
        let lon = world.x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * world.y)).sinh().atan().to_degrees();
        LatLng::new(lat, lon)
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `delta` levels, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, delta: f64) {
        let new_zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.inverse_transform() * screen_point;
        self.zoom = new_zoom;

        let new_screen = self.transform() * world_point;
        self.offset += screen_point - new_screen;
    }

    /// Center the viewport on a coordinate.
    pub fn center_on(&mut self, coord: LatLng, viewport: Size) {
        let world = Self::project(coord);
        let scale = self.scale();
        self.offset = Vec2::new(
            viewport.width / 2.0 - world.x * scale,
            viewport.height / 2.0 - world.y * scale,
        );
    }

    /// Fit the viewport so every coordinate is visible with `padding` pixels
    /// of margin.
    pub fn fit_to_coords<I>(&mut self, coords: I, viewport: Size, padding: f64)
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut points = coords.into_iter().map(Self::project);
        let Some(first) = points.next() else {
            self.offset = Vec2::ZERO;
            self.zoom = self.min_zoom;
            return;
        };
        let bounds = points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p));

        if bounds.width() > 0.0 || bounds.height() > 0.0 {
            let padded = Size::new(
                (viewport.width - padding * 2.0).max(1.0),
                (viewport.height - padding * 2.0).max(1.0),
            );
            let scale_x = if bounds.width() > 0.0 {
                padded.width / bounds.width()
            } else {
                f64::INFINITY
            };
            let scale_y = if bounds.height() > 0.0 {
                padded.height / bounds.height()
            } else {
                f64::INFINITY
            };
            let scale = scale_x.min(scale_y);
            self.zoom = (scale / TILE_SIZE).log2().clamp(self.min_zoom, self.max_zoom);
        }

        let center = bounds.center();
        let scale = self.scale();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * scale,
            viewport.height / 2.0 - center.y * scale,
        );
    }
}

impl Projection for Viewport {
    fn lat_lng_to_xy(&self, coord: LatLng) -> Point {
        self.transform() * Self::project(coord)
    }

    fn xy_to_lat_lng(&self, xy: Point) -> LatLng {
        Self::unproject(self.inverse_transform() * xy)
    }

    fn contains(&self, coord: LatLng) -> bool {
        coord.lon.is_finite() && coord.lat.abs() <= MAX_LATITUDE
    }
}

/// Projection backed by host-supplied closures.
pub struct FnProjection<F, G> {
    forward: F,
    inverse: G,
    precision: f64,
}

impl<F, G> FnProjection<F, G>
where
    F: Fn(LatLng) -> Point,
    G: Fn(Point) -> LatLng,
{
    /// Wrap a forward and an inverse transform.
    pub fn new(forward: F, inverse: G) -> Self {
        Self {
            forward,
            inverse,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Set the round-trip tolerance reported by [`Projection::precision`].
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }
}

impl<F, G> Projection for FnProjection<F, G>
where
    F: Fn(LatLng) -> Point,
    G: Fn(Point) -> LatLng,
{
    fn lat_lng_to_xy(&self, coord: LatLng) -> Point {
        (self.forward)(coord)
    }

    fn xy_to_lat_lng(&self, xy: Point) -> LatLng {
        (self.inverse)(xy)
    }

    fn precision(&self) -> f64 {
        self.precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip(viewport: &Viewport, coord: LatLng) {
        let back = viewport.xy_to_lat_lng(viewport.lat_lng_to_xy(coord));
        assert!(
            back.approx_eq(coord, viewport.precision()),
            "{coord:?} came back as {back:?}"
        );
    }

    #[test]
    fn test_origin_maps_to_world_center() {
        let viewport = Viewport::new();
        let xy = viewport.lat_lng_to_xy(LatLng::new(0.0, 0.0));
        assert!((xy.x - 128.0).abs() < 1e-9);
        assert!((xy.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_default() {
        let viewport = Viewport::new();
        for coord in [
            LatLng::new(0.0, 0.0),
            LatLng::new(39.7392, -104.9903),
            LatLng::new(-33.8688, 151.2093),
            LatLng::new(64.1466, -21.9426),
        ] {
            assert_round_trip(&viewport, coord);
        }
    }

    #[test]
    fn test_round_trip_panned_and_zoomed() {
        let viewport = Viewport::new()
            .with_zoom(7.5)
            .with_offset(Vec2::new(-12_000.0, -9_000.0));
        assert_round_trip(&viewport, LatLng::new(40.7128, -74.0060));
        assert_round_trip(&viewport, LatLng::new(51.5074, -0.1278));
    }

    #[test]
    fn test_latitude_domain_boundary() {
        let viewport = Viewport::new().with_zoom(5.0);
        assert!(viewport.contains(LatLng::new(MAX_LATITUDE, 0.0)));
        assert!(viewport.contains(LatLng::new(-85.0, 179.9)));
        assert!(!viewport.contains(LatLng::new(88.0, 10.0)));
        assert!(!viewport.contains(LatLng::new(-89.5, 10.0)));
        assert!(!viewport.contains(LatLng::new(f64::NAN, 10.0)));

        // Inside the domain the round trip holds up to the limit
        assert_round_trip(&viewport, LatLng::new(85.0, 10.0));
        assert_round_trip(&viewport, LatLng::new(-85.0, -10.0));

        // Outside it the point is drawn on the limit and does not come back
        let xy = viewport.lat_lng_to_xy(LatLng::new(88.0, 10.0));
        assert_eq!(xy, viewport.lat_lng_to_xy(LatLng::new(MAX_LATITUDE, 10.0)));
        let back = viewport.xy_to_lat_lng(xy);
        assert!(!back.approx_eq(LatLng::new(88.0, 10.0), viewport.precision()));
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::new();
        viewport.zoom_at(Point::ZERO, -5.0);
        assert!((viewport.zoom - viewport.min_zoom).abs() < f64::EPSILON);

        viewport.zoom_at(Point::ZERO, 100.0);
        assert!((viewport.zoom - viewport.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut viewport = Viewport::new().with_zoom(3.0);
        let anchor = Point::new(300.0, 200.0);
        let before = viewport.xy_to_lat_lng(anchor);
        viewport.zoom_at(anchor, 2.0);
        let after = viewport.lat_lng_to_xy(before);
        assert!((after.x - anchor.x).abs() < 1e-6);
        assert!((after.y - anchor.y).abs() < 1e-6);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::new();
        let before = viewport.lat_lng_to_xy(LatLng::new(10.0, 10.0));
        viewport.pan(Vec2::new(10.0, -20.0));
        let after = viewport.lat_lng_to_xy(LatLng::new(10.0, 10.0));
        assert!((after.x - before.x - 10.0).abs() < 1e-9);
        assert!((after.y - before.y + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_coords_keeps_everything_visible() {
        let coords = [
            LatLng::new(47.6062, -122.3321),
            LatLng::new(25.7617, -80.1918),
            LatLng::new(40.7128, -74.0060),
        ];
        let size = Size::new(800.0, 600.0);
        let mut viewport = Viewport::new();
        viewport.fit_to_coords(coords, size, 20.0);

        for coord in coords {
            let xy = viewport.lat_lng_to_xy(coord);
            assert!(xy.x >= 19.0 && xy.x <= 781.0, "x out of view: {xy:?}");
            assert!(xy.y >= 19.0 && xy.y <= 581.0, "y out of view: {xy:?}");
        }
    }

    #[test]
    fn test_fit_to_single_coord_centers_it() {
        let mut viewport = Viewport::new().with_zoom(4.0);
        let coord = LatLng::new(48.8566, 2.3522);
        viewport.fit_to_coords([coord], Size::new(400.0, 400.0), 10.0);
        let xy = viewport.lat_lng_to_xy(coord);
        assert!((xy.x - 200.0).abs() < 1e-6);
        assert!((xy.y - 200.0).abs() < 1e-6);
        assert!((viewport.zoom - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fn_projection() {
        let projection = FnProjection::new(
            |c: LatLng| Point::new(c.lon * 2.0, -c.lat * 2.0),
            |p: Point| LatLng::new(-p.y / 2.0, p.x / 2.0),
        )
        .with_precision(1e-12);
        let coord = LatLng::new(12.5, -7.25);
        assert_eq!(projection.lat_lng_to_xy(coord), Point::new(-14.5, -25.0));
        assert_eq!(projection.xy_to_lat_lng(Point::new(-14.5, -25.0)), coord);
        assert!((projection.precision() - 1e-12).abs() < f64::EPSILON);
    }
}
