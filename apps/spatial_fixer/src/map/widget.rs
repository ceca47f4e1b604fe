//! Interactive basemap: tiles, pan/zoom, and a single draggable marker.

use eframe::egui::{
    self, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, TextureHandle, Vec2,
};
use shared::domain::GeoPoint;

use super::{
    tiles::{visible_tiles, TileCache, TileId, TileSlot},
    viewport::MapViewport,
};

const BACKGROUND: Color32 = Color32::from_rgb(22, 26, 32);
const FAILED_TILE: Color32 = Color32::from_rgb(48, 30, 34);
/// Scroll distance that changes zoom by one level.
const SCROLL_PER_ZOOM_LEVEL: f64 = 120.0;

/// Marker glyph. Built once at startup and handed to every map render.
#[derive(Debug, Clone)]
pub struct MarkerStyle {
    fill: Color32,
    outline: Stroke,
    shadow: Color32,
    head_radius: f32,
    height: f32,
    label_font: FontId,
}

impl MarkerStyle {
    pub fn pin() -> Self {
        Self {
            fill: Color32::from_rgb(38, 120, 230),
            outline: Stroke::new(1.5, Color32::from_rgb(16, 52, 110)),
            shadow: Color32::from_black_alpha(110),
            head_radius: 11.0,
            height: 38.0,
            label_font: FontId::proportional(13.0),
        }
    }

    fn head_center(&self, tip: Pos2) -> Pos2 {
        tip - Vec2::new(0.0, self.height - self.head_radius)
    }

    fn hit(&self, tip: Pos2, pointer: Pos2) -> bool {
        let head = self.head_center(tip);
        let on_head = pointer.distance(head) <= self.head_radius + 6.0;
        let on_stem = (pointer.x - tip.x).abs() <= self.head_radius * 0.6
            && pointer.y <= tip.y + 4.0
            && pointer.y >= head.y;
        on_head || on_stem
    }

    fn paint(&self, painter: &egui::Painter, tip: Pos2, label: Option<&str>) {
        let head = self.head_center(tip);
        let r = self.head_radius;

        painter.circle_filled(tip, 4.0, self.shadow);
        painter.add(egui::Shape::convex_polygon(
            vec![
                head + Vec2::new(-r * 0.82, r * 0.55),
                head + Vec2::new(r * 0.82, r * 0.55),
                tip,
            ],
            self.fill,
            self.outline,
        ));
        painter.circle(head, r, self.fill, self.outline);
        painter.circle_filled(head, r * 0.38, Color32::WHITE);

        if let Some(label) = label.filter(|l| !l.is_empty()) {
            let galley =
                painter.layout_no_wrap(label.to_owned(), self.label_font.clone(), Color32::WHITE);
            let plate_size = galley.size() + Vec2::new(12.0, 6.0);
            let plate = Rect::from_center_size(
                head - Vec2::new(0.0, r + 8.0 + plate_size.y / 2.0),
                plate_size,
            );
            painter.rect_filled(plate, 4.0, Color32::from_black_alpha(190));
            painter.galley(plate.min + Vec2::new(6.0, 3.0), galley, Color32::WHITE);
        }
    }
}

pub struct MarkerView<'a> {
    pub position: GeoPoint,
    pub label: &'a str,
    pub draggable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The marker was dropped; carries the geographic point under its tip.
    MarkerDragEnd(GeoPoint),
}

#[derive(Debug, Clone, Copy)]
enum DragMode {
    Marker { grab: Vec2, tip: Pos2 },
    Pan,
}

/// Gesture state that lives between frames. Holds no location data beyond
/// the marker preview of a drag in progress.
#[derive(Debug, Default)]
pub struct MapInteraction {
    drag: Option<DragMode>,
}

impl MapInteraction {
    pub fn is_dragging_marker(&self) -> bool {
        matches!(self.drag, Some(DragMode::Marker { .. }))
    }
}

#[derive(Debug, Default)]
pub struct MapOutput {
    pub events: Vec<MapEvent>,
    /// Visible tiles that have never been requested.
    pub missing_tiles: Vec<TileId>,
}

pub fn show_map(
    ui: &mut egui::Ui,
    interaction: &mut MapInteraction,
    viewport: &mut MapViewport,
    tiles: &TileCache<TextureHandle>,
    marker: Option<MarkerView<'_>>,
    style: &MarkerStyle,
    attribution: &str,
) -> MapOutput {
    let mut output = MapOutput::default();
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    let center = rect.center();
    let to_screen = |viewport: &MapViewport, point: GeoPoint| {
        let (dx, dy) = viewport.offset_of(point);
        center + Vec2::new(dx as f32, dy as f32)
    };

    let resting_tip = marker.as_ref().map(|m| to_screen(viewport, m.position));

    if response.drag_started() {
        let press = ui
            .input(|i| i.pointer.press_origin())
            .or_else(|| response.interact_pointer_pos());
        interaction.drag = match (press, resting_tip, marker.as_ref()) {
            (Some(press), Some(tip), Some(m)) if m.draggable && style.hit(tip, press) => {
                Some(DragMode::Marker {
                    grab: press - tip,
                    tip,
                })
            }
            _ => Some(DragMode::Pan),
        };
    }

    if response.dragged() {
        match &mut interaction.drag {
            Some(DragMode::Marker { grab, tip }) => {
                if let Some(pointer) = response.interact_pointer_pos() {
                    *tip = rect.clamp(pointer - *grab);
                }
            }
            Some(DragMode::Pan) | None => {
                let delta = response.drag_delta();
                viewport.pan_by_pixels(f64::from(delta.x), f64::from(delta.y));
            }
        }
    }

    // Tip to draw this frame: the drag preview while a drag is live or just
    // ended, otherwise the session's marker position.
    let mut preview_tip = match interaction.drag {
        Some(DragMode::Marker { tip, .. }) => Some(tip),
        _ => None,
    };

    if response.drag_stopped() {
        if let Some(DragMode::Marker { tip, .. }) = interaction.drag {
            let offset = tip - center;
            let dropped = viewport.point_at((f64::from(offset.x), f64::from(offset.y)));
            output.events.push(MapEvent::MarkerDragEnd(dropped));
            preview_tip = Some(tip);
        }
        interaction.drag = None;
    }

    if response.hovered() && !interaction.is_dragging_marker() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            let anchor = response.hover_pos().map(|p| p - center).unwrap_or_default();
            viewport.zoom_around(
                f64::from(scroll) / SCROLL_PER_ZOOM_LEVEL,
                (f64::from(anchor.x), f64::from(anchor.y)),
            );
        }
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
    for placement in visible_tiles(viewport, f64::from(rect.width()), f64::from(rect.height())) {
        let min = center + Vec2::new(placement.offset.0 as f32, placement.offset.1 as f32);
        let tile_rect = Rect::from_min_size(min, Vec2::splat(placement.size as f32));
        match tiles.get(&placement.tile) {
            Some(TileSlot::Ready(texture)) => {
                painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
            }
            Some(TileSlot::Failed) => {
                painter.rect_filled(tile_rect.shrink(0.5), 0.0, FAILED_TILE);
            }
            Some(TileSlot::Pending) => {}
            None => {
                // Tiles passed through mid-flight are not worth fetching.
                if !viewport.is_animating() {
                    output.missing_tiles.push(placement.tile);
                }
            }
        }
    }

    if let Some(m) = marker.as_ref() {
        let tip = preview_tip.unwrap_or_else(|| to_screen(viewport, m.position));
        style.paint(&painter, tip, Some(m.label));

        let hovering_marker = response
            .hover_pos()
            .is_some_and(|pointer| m.draggable && style.hit(tip, pointer));
        if interaction.is_dragging_marker() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if hovering_marker {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }
    }

    paint_attribution(&painter, rect, attribution);
    output
}

fn paint_attribution(painter: &egui::Painter, rect: Rect, attribution: &str) {
    if attribution.is_empty() {
        return;
    }
    let galley = painter.layout_no_wrap(
        attribution.to_owned(),
        FontId::proportional(10.0),
        Color32::from_gray(30),
    );
    let size = galley.size() + Vec2::new(8.0, 4.0);
    let plate = Rect::from_min_size(rect.right_bottom() - size, size);
    painter.rect_filled(plate, 0.0, Color32::from_white_alpha(190));
    painter.galley(
        plate.min + Vec2::new(4.0, 2.0),
        galley,
        Color32::from_gray(30),
    );
}
