//! Keeps the basemap viewport in step with the place being reviewed.

use shared::domain::GeoPoint;

use crate::session::ReviewSession;

/// Zoom level used when a newly loaded place is brought into view.
pub const FLY_TO_ZOOM: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportCommand {
    /// Animate the viewport center to `center` at `zoom`.
    FlyTo { center: GeoPoint, zoom: u8 },
}

/// Issues a fly-to once per place load.
///
/// The trigger is the session's load generation, not the marker position:
/// dragging the marker must never move the camera under the user's cursor.
#[derive(Debug, Default)]
pub struct MapViewController {
    seen_generation: u64,
}

impl MapViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, session: &ReviewSession) -> Option<ViewportCommand> {
        let generation = session.load_generation();
        if generation == self.seen_generation {
            return None;
        }
        self.seen_generation = generation;

        let place = session.active_place()?;
        tracing::debug!(place_id = %place.id, center = %place.location, "recentering map");
        Some(ViewportCommand::FlyTo {
            center: place.location,
            zoom: FLY_TO_ZOOM,
        })
    }
}
