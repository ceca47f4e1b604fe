use shared::domain::{GeoPoint, Place, PlaceId};

use crate::{
    map_view::{MapViewController, ViewportCommand, FLY_TO_ZOOM},
    marker,
    session::ReviewSession,
};

fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).expect("valid point")
}

fn place(id: i64, lat: f64, lon: f64) -> Place {
    Place {
        id: PlaceId::Int(id),
        name: format!("Place {id}"),
        category: "food".to_string(),
        location: point(lat, lon),
    }
}

#[test]
fn new_session_is_empty_and_loading() {
    let session = ReviewSession::new();
    assert!(session.active_place().is_none());
    assert!(session.marker_position().is_none());
    assert!(session.is_loading());
    assert!(session.pending_correction().is_none());
}

#[test]
fn load_place_puts_marker_on_reported_location() {
    let mut session = ReviewSession::new();
    session.load_place(place(1, 40.0, -73.0));

    assert_eq!(session.active_place().map(|p| &p.id), Some(&PlaceId::Int(1)));
    assert_eq!(session.marker_position(), Some(point(40.0, -73.0)));
    assert_eq!(session.marker_offset_meters(), Some(0.0));
}

#[test]
fn loading_a_new_place_discards_previous_marker_edit() {
    let mut session = ReviewSession::new();
    session.load_place(place(1, 40.0, -73.0));
    assert!(session.update_marker(point(40.5, -73.5)));

    session.load_place(place(2, 51.5, -0.12));
    assert_eq!(session.marker_position(), Some(point(51.5, -0.12)));
}

#[test]
fn update_marker_without_place_is_a_no_op() {
    let mut session = ReviewSession::new();
    assert!(!session.update_marker(point(1.0, 1.0)));
    assert!(session.active_place().is_none());
    assert!(session.marker_position().is_none());
    assert_eq!(session.load_generation(), 0);
}

#[test]
fn marker_and_place_presence_always_agree() {
    let mut session = ReviewSession::new();
    let steps: Vec<Box<dyn Fn(&mut ReviewSession)>> = vec![
        Box::new(|s: &mut ReviewSession| {
            s.update_marker(point(0.0, 0.0));
        }),
        Box::new(|s: &mut ReviewSession| s.set_loading(false)),
        Box::new(|s: &mut ReviewSession| s.load_place(place(1, 10.0, 10.0))),
        Box::new(|s: &mut ReviewSession| {
            s.update_marker(point(10.1, 10.1));
        }),
        Box::new(|s: &mut ReviewSession| s.set_loading(true)),
        Box::new(|s: &mut ReviewSession| s.load_place(place(2, 20.0, 20.0))),
    ];
    for step in steps {
        step(&mut session);
        assert_eq!(
            session.active_place().is_some(),
            session.marker_position().is_some()
        );
    }
}

#[test]
fn drag_end_updates_marker_and_reports_offset() {
    let mut session = ReviewSession::new();
    session.load_place(place(1, 40.0, -73.0));

    assert!(marker::on_drag_end(&mut session, point(40.001, -73.001)));
    assert_eq!(session.marker_position(), Some(point(40.001, -73.001)));
    let offset = session.marker_offset_meters().expect("offset");
    assert!(offset > 100.0 && offset < 200.0, "unexpected offset {offset}");
    // The place record itself is untouched.
    assert_eq!(
        session.active_place().map(|p| p.location),
        Some(point(40.0, -73.0))
    );
}

#[test]
fn last_drag_wins() {
    let mut session = ReviewSession::new();
    session.load_place(place(1, 40.0, -73.0));
    marker::on_drag_end(&mut session, point(40.1, -73.1));
    marker::on_drag_end(&mut session, point(40.2, -73.2));
    assert_eq!(session.marker_position(), Some(point(40.2, -73.2)));
}

#[test]
fn recenter_fires_once_per_place_load() {
    let mut session = ReviewSession::new();
    let mut controller = MapViewController::new();
    assert_eq!(controller.observe(&session), None);

    session.load_place(place(1, 40.0, -73.0));
    assert_eq!(
        controller.observe(&session),
        Some(ViewportCommand::FlyTo {
            center: point(40.0, -73.0),
            zoom: FLY_TO_ZOOM,
        })
    );
    assert_eq!(controller.observe(&session), None);
}

#[test]
fn recenter_ignores_marker_drags() {
    let mut session = ReviewSession::new();
    let mut controller = MapViewController::new();
    session.load_place(place(1, 40.0, -73.0));
    controller.observe(&session);

    marker::on_drag_end(&mut session, point(40.001, -73.001));
    marker::on_drag_end(&mut session, point(40.002, -73.002));
    assert_eq!(controller.observe(&session), None);
}

#[test]
fn reloading_the_same_place_recenters_again() {
    let mut session = ReviewSession::new();
    let mut controller = MapViewController::new();
    session.load_place(place(7, 1.0, 2.0));
    assert!(controller.observe(&session).is_some());

    marker::on_drag_end(&mut session, point(1.5, 2.5));
    session.load_place(place(7, 1.0, 2.0));
    assert_eq!(
        controller.observe(&session),
        Some(ViewportCommand::FlyTo {
            center: point(1.0, 2.0),
            zoom: FLY_TO_ZOOM,
        })
    );
}
