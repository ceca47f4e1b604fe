use shared::domain::GeoPoint;

use crate::session::ReviewSession;

/// Applies a marker drag-end gesture to the session.
///
/// The map widget hands over the resulting coordinates directly. There is no
/// snapping or history, so the last drag wins. Returns whether the session
/// accepted the new position.
pub fn on_drag_end(session: &mut ReviewSession, position: GeoPoint) -> bool {
    let accepted = session.update_marker(position);
    if accepted {
        tracing::debug!(%position, "marker moved");
    } else {
        tracing::debug!(%position, "ignored marker drag with no active place");
    }
    accepted
}
