//! Web Mercator helpers shared by the viewport and tile layout.

use std::f64::consts::PI;

use shared::domain::GeoPoint;

pub const TILE_SIZE: f64 = 256.0;
/// Latitude where Web Mercator becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Position on the Mercator square, both axes in `[0, 1]`, y growing south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub fn lerp(self, to: WorldPos, t: f64) -> WorldPos {
        WorldPos {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn distance(self, other: WorldPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Edge length of the whole world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

pub fn project(point: GeoPoint) -> WorldPos {
    let lat = point.latitude().clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    WorldPos {
        x: (point.longitude() + 180.0) / 360.0,
        y: (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0,
    }
}

/// Inverse of [`project`]. Out-of-square positions are clamped in latitude
/// and wrapped in longitude, so the result is always a valid `GeoPoint`.
pub fn unproject(pos: WorldPos) -> GeoPoint {
    let x = pos.x - pos.x.floor();
    let longitude = x * 360.0 - 180.0;
    let latitude = (PI * (1.0 - 2.0 * pos.y))
        .sinh()
        .atan()
        .to_degrees()
        .clamp(-MAX_LATITUDE, MAX_LATITUDE);
    GeoPoint::clamped(latitude, longitude)
}
