use client_core::ViewportCommand;
use shared::domain::GeoPoint;

use super::projection::{project, unproject, world_size, WorldPos, TILE_SIZE};

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;
const FLIGHT_SECONDS: f64 = 1.5;

#[derive(Debug, Clone, Copy)]
struct Flight {
    from: WorldPos,
    to: WorldPos,
    from_zoom: f64,
    to_zoom: f64,
    /// How far the flight pulls out mid-way so long hops stay readable.
    arc: f64,
    elapsed: f64,
}

impl Flight {
    fn sample(&self) -> (WorldPos, f64) {
        let t = ease_in_out(self.elapsed / FLIGHT_SECONDS);
        let zoom = self.from_zoom + (self.to_zoom - self.from_zoom) * t
            - self.arc * (std::f64::consts::PI * t).sin();
        (self.from.lerp(self.to, t), zoom)
    }
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Camera over the basemap: a center, a fractional zoom and an optional
/// fly-to animation in progress.
#[derive(Debug, Clone)]
pub struct MapViewport {
    center: WorldPos,
    zoom: f64,
    flight: Option<Flight>,
}

impl MapViewport {
    pub fn new(center: GeoPoint, zoom: f64) -> Self {
        Self {
            center: project(center),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            flight: None,
        }
    }

    pub fn center_world(&self) -> WorldPos {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_animating(&self) -> bool {
        self.flight.is_some()
    }

    pub fn apply(&mut self, command: ViewportCommand) {
        match command {
            ViewportCommand::FlyTo { center, zoom } => self.fly_to(center, f64::from(zoom)),
        }
    }

    pub fn fly_to(&mut self, center: GeoPoint, zoom: f64) {
        let to = project(center);
        let to_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        // Zoom level at which the hop spans roughly four tiles.
        let distance = self.center.distance(to);
        let arc = if distance > 0.0 {
            let comfortable = (4.0 / distance).log2();
            (self.zoom.min(to_zoom) - comfortable).max(0.0)
        } else {
            0.0
        };
        self.flight = Some(Flight {
            from: self.center,
            to,
            from_zoom: self.zoom,
            to_zoom,
            arc,
            elapsed: 0.0,
        });
    }

    /// Steps any running flight by `dt` seconds. Returns whether the view moved.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Some(mut flight) = self.flight else {
            return false;
        };
        flight.elapsed += dt.max(0.0);
        if flight.elapsed >= FLIGHT_SECONDS {
            self.center = flight.to;
            self.zoom = flight.to_zoom;
            self.flight = None;
        } else {
            let (center, zoom) = flight.sample();
            self.center = center;
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
            self.flight = Some(flight);
        }
        true
    }

    /// Moves the view by a screen-space drag; cancels any flight.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        self.flight = None;
        let size = world_size(self.zoom);
        self.center = WorldPos {
            x: (self.center.x - dx / size).rem_euclid(1.0),
            y: (self.center.y - dy / size).clamp(0.0, 1.0),
        };
    }

    /// Changes zoom keeping the world point under `anchor` (a screen offset
    /// from the view center) fixed. Cancels any flight.
    pub fn zoom_around(&mut self, delta: f64, anchor: (f64, f64)) {
        self.flight = None;
        let before = self.offset_to_world(anchor);
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.offset_to_world(anchor);
        self.center = WorldPos {
            x: (self.center.x + before.x - after.x).rem_euclid(1.0),
            y: (self.center.y + before.y - after.y).clamp(0.0, 1.0),
        };
    }

    /// Screen-space offset of `point` from the view center, in pixels.
    pub fn offset_of(&self, point: GeoPoint) -> (f64, f64) {
        let pos = project(point);
        let size = world_size(self.zoom);
        let mut dx = pos.x - self.center.x;
        // Take the short way around the antimeridian.
        if dx > 0.5 {
            dx -= 1.0;
        } else if dx < -0.5 {
            dx += 1.0;
        }
        (dx * size, (pos.y - self.center.y) * size)
    }

    /// Geographic point under a screen offset from the view center.
    pub fn point_at(&self, offset: (f64, f64)) -> GeoPoint {
        unproject(self.offset_to_world(offset))
    }

    fn offset_to_world(&self, (dx, dy): (f64, f64)) -> WorldPos {
        let size = world_size(self.zoom);
        WorldPos {
            x: self.center.x + dx / size,
            y: self.center.y + dy / size,
        }
    }

    /// Integer zoom of the tiles drawn for the current fractional zoom, and
    /// the on-screen edge length of one such tile.
    pub fn tile_zoom(&self) -> (u8, f64) {
        let z = self.zoom.round().clamp(0.0, MAX_ZOOM);
        (z as u8, TILE_SIZE * 2f64.powf(self.zoom - z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("point")
    }

    fn assert_near(a: GeoPoint, b: GeoPoint) {
        assert!(
            (a.latitude() - b.latitude()).abs() < 1e-7
                && (a.longitude() - b.longitude()).abs() < 1e-7,
            "{a} != {b}"
        );
    }

    #[test]
    fn fly_to_lands_exactly_on_target() {
        let mut viewport = MapViewport::new(point(0.0, 0.0), 3.0);
        viewport.apply(ViewportCommand::FlyTo {
            center: point(40.0, -73.0),
            zoom: 18,
        });
        assert!(viewport.is_animating());

        let mut frames = 0;
        while viewport.advance(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 1000, "flight never finished");
        }

        assert!(!viewport.is_animating());
        assert_near(unproject(viewport.center_world()), point(40.0, -73.0));
        assert_eq!(viewport.zoom(), 18.0);
    }

    #[test]
    fn long_flights_pull_out_mid_way() {
        let mut viewport = MapViewport::new(point(51.5, -0.12), 18.0);
        viewport.fly_to(point(-33.86, 151.2), 18.0);
        viewport.advance(FLIGHT_SECONDS / 2.0);
        assert!(viewport.zoom() < 10.0, "zoom stayed at {}", viewport.zoom());
    }

    #[test]
    fn panning_cancels_flight() {
        let mut viewport = MapViewport::new(point(0.0, 0.0), 10.0);
        viewport.fly_to(point(10.0, 10.0), 18.0);
        viewport.pan_by_pixels(5.0, 0.0);
        assert!(!viewport.is_animating());
        assert!(!viewport.advance(0.1));
    }

    #[test]
    fn screen_offsets_round_trip_through_points() {
        let viewport = MapViewport::new(point(40.0, -73.0), 18.0);
        let target = point(40.0005, -73.0007);
        let offset = viewport.offset_of(target);
        assert_near(viewport.point_at(offset), target);
        // North is up.
        assert!(offset.1 < 0.0);
    }

    #[test]
    fn zooming_keeps_anchor_fixed() {
        let mut viewport = MapViewport::new(point(40.0, -73.0), 16.0);
        let anchor = (120.0, -40.0);
        let before = viewport.point_at(anchor);
        viewport.zoom_around(1.0, anchor);
        assert_eq!(viewport.zoom(), 17.0);
        assert_near(viewport.point_at(anchor), before);
    }

    #[test]
    fn tile_zoom_scales_fractional_levels() {
        let viewport = MapViewport::new(point(0.0, 0.0), 17.6);
        let (z, size) = viewport.tile_zoom();
        assert_eq!(z, 18);
        assert!(size < 256.0 && size > 128.0);
    }
}
