//! In-memory state of the place currently under review.

use shared::domain::{GeoPoint, Place};

/// Single source of truth for the active place and the candidate correction.
///
/// `marker_position` is present exactly when `active_place` is, and starts on
/// the place's reported location every time a place is loaded. Nothing here
/// performs I/O.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    active_place: Option<Place>,
    marker_position: Option<GeoPoint>,
    is_loading: bool,
    load_generation: u64,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            active_place: None,
            marker_position: None,
            is_loading: true,
            load_generation: 0,
        }
    }

    /// Replaces the active place and puts the marker on its reported location.
    pub fn load_place(&mut self, place: Place) {
        self.marker_position = Some(place.location);
        self.active_place = Some(place);
        self.load_generation = self.load_generation.wrapping_add(1);
    }

    /// Moves the marker. Returns `false` and changes nothing when no place is
    /// loaded.
    pub fn update_marker(&mut self, point: GeoPoint) -> bool {
        if self.active_place.is_none() {
            return false;
        }
        self.marker_position = Some(point);
        true
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn active_place(&self) -> Option<&Place> {
        self.active_place.as_ref()
    }

    pub fn marker_position(&self) -> Option<GeoPoint> {
        self.marker_position
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Increments on every `load_place`, including a reload of the same id.
    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    /// The correction that a confirm action would submit.
    pub fn pending_correction(&self) -> Option<(&Place, GeoPoint)> {
        match (&self.active_place, self.marker_position) {
            (Some(place), Some(marker)) => Some((place, marker)),
            _ => None,
        }
    }

    /// Distance in metres between the reported location and the marker.
    pub fn marker_offset_meters(&self) -> Option<f64> {
        self.pending_correction()
            .map(|(place, marker)| place.location.distance_meters(&marker))
    }
}
