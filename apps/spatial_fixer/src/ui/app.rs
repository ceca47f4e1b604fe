use chrono::{DateTime, Local};
use client_core::{Action, Notification, NotificationLevel, ReviewState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui::{self, TextureHandle};
use shared::domain::GeoPoint;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiEvent};
use crate::controller::orchestration::Orchestrator;
use crate::map::{
    show_map, MapEvent, MapInteraction, MapViewport, MarkerStyle, MarkerView, TileCache,
};

pub const APP_TITLE: &str = "Overture Spatial Fixer";
const INSTRUCTIONS: &str =
    "Drag the pin to the actual main entrance or center of the building, then press Confirm & Next.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    title: &'static str,
    message: String,
    hint: &'static str,
}

impl From<&UiError> for StatusBanner {
    fn from(err: &UiError) -> Self {
        Self {
            severity: StatusBannerSeverity::Error,
            title: err.title(),
            message: err.message().to_string(),
            hint: err.retry_hint(),
        }
    }
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::QueueEmpty => "Queue",
        UiErrorCategory::Service => "Service",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

pub struct ReviewApp {
    orchestrator: Orchestrator,
    ui_rx: Receiver<UiEvent>,
    viewport: MapViewport,
    tiles: TileCache<TextureHandle>,
    interaction: MapInteraction,
    marker_style: MarkerStyle,
    attribution: String,
    status: String,
    status_banner: Option<StatusBanner>,
    last_saved_at: Option<DateTime<Local>>,
}

impl ReviewApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        attribution: String,
    ) -> Self {
        let mut app = Self {
            orchestrator: Orchestrator::new(cmd_tx),
            ui_rx,
            viewport: MapViewport::new(GeoPoint::clamped(20.0, 0.0), 2.0),
            tiles: TileCache::default(),
            interaction: MapInteraction::default(),
            marker_style: MarkerStyle::pin(),
            attribution,
            status: "Starting...".to_string(),
            status_banner: None,
            last_saved_at: None,
        };
        app.submit(Action::Start);
        app
    }

    fn submit(&mut self, action: Action) {
        let notifications = self.orchestrator.submit(action);
        for notification in notifications {
            self.apply_notification(notification);
        }
    }

    fn apply_notification(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                self.last_saved_at = Some(Local::now());
                self.status = notification.message;
            }
            NotificationLevel::Error => {
                let err = UiError::from_notification(&notification);
                tracing::warn!(
                    category = err_label(err.category()),
                    context = ?err.context(),
                    "{}",
                    err.message()
                );
                self.status = err.message().to_string();
                self.status_banner = Some(StatusBanner::from(&err));
            }
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::error!(category = err_label(err.category()), "{}", err.message());
                    self.status = err.message().to_string();
                    self.status_banner = Some(StatusBanner::from(&err));
                }
                UiEvent::Review(action) => self.submit(action),
                UiEvent::TileLoaded { tile, image } => {
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba);
                    let texture = ctx.load_texture(
                        format!("tile:{}/{}/{}", tile.z, tile.x, tile.y),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.tiles.fulfil(tile, texture);
                    tracing::trace!(?tile, cached = self.tiles.len(), "tile ready");
                }
                UiEvent::TileFailed { tile, .. } => self.tiles.fail(tile),
            }
        }
    }

    fn retry(&mut self) {
        self.status_banner = None;
        self.submit(Action::Retry);
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.vertical(|ui| {
                            ui.label(
                                egui::RichText::new(banner.title)
                                    .strong()
                                    .color(egui::Color32::WHITE),
                            );
                            ui.label(
                                egui::RichText::new(&banner.message).color(egui::Color32::WHITE),
                            );
                            ui.label(
                                egui::RichText::new(banner.hint)
                                    .small()
                                    .color(egui::Color32::from_gray(220)),
                            );
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_loading_screen(&mut self, ctx: &egui::Context) {
        let workflow = self.orchestrator.workflow();
        let failed = workflow.state() == ReviewState::Error && !workflow.session().is_loading();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                if failed {
                    self.show_status_banner(ui);
                    ui.add_space(12.0);
                    if ui
                        .add_enabled(
                            self.orchestrator.workflow().can_retry(),
                            egui::Button::new("Retry"),
                        )
                        .clicked()
                    {
                        self.retry();
                    }
                } else {
                    ui.add(egui::Spinner::new().size(32.0));
                    ui.add_space(8.0);
                    ui.heading("Loading Map Data...");
                    ui.label(egui::RichText::new(&self.status).weak());
                }
            });
        });
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("review_header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(APP_TITLE);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!(
                        "Reviewed this session: {}",
                        self.orchestrator.workflow().reviewed_count()
                    ));
                });
            });

            if let Some(place) = self.orchestrator.workflow().session().active_place() {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&place.name).strong().size(16.0));
                    ui.separator();
                    ui.label(&place.category);
                    ui.separator();
                    ui.label(egui::RichText::new(format!("id {}", place.id)).monospace());
                });
            }
            ui.label(egui::RichText::new(INSTRUCTIONS).weak());
            self.show_status_banner(ui);
            ui.add_space(4.0);
        });
    }

    fn show_action_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("review_actions").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let workflow = self.orchestrator.workflow();
                let can_confirm = workflow.can_confirm();
                let can_retry = workflow.can_retry();
                let submitting = workflow.state() == ReviewState::Submitting;
                let offset = workflow.session().marker_offset_meters();

                let confirm = ui.add_enabled(
                    can_confirm,
                    egui::Button::new(egui::RichText::new("Confirm & Next").strong())
                        .min_size(egui::vec2(140.0, 28.0)),
                );
                if confirm.clicked() {
                    self.status_banner = None;
                    self.submit(Action::Confirm);
                }
                if can_retry && ui.button("Retry").clicked() {
                    self.retry();
                }
                if submitting {
                    ui.spinner();
                    ui.label("Saving...");
                }

                ui.separator();
                match offset {
                    Some(meters) if meters >= 0.05 => {
                        ui.label(format!("Marker moved {meters:.1} m"));
                    }
                    Some(_) => {
                        ui.label(egui::RichText::new("Marker at reported location").weak());
                    }
                    None => {}
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(saved_at) = self.last_saved_at {
                        ui.label(
                            egui::RichText::new(format!(
                                "Last saved {}",
                                saved_at.format("%H:%M:%S")
                            ))
                            .weak(),
                        );
                    }
                    ui.label(egui::RichText::new(&self.status).small());
                });
            });
            ui.add_space(6.0);
        });
    }

    fn show_map_panel(&mut self, ctx: &egui::Context) {
        let workflow = self.orchestrator.workflow();
        let session = workflow.session();
        let draggable = workflow.state() != ReviewState::Submitting && !session.is_loading();
        let marker = session
            .active_place()
            .zip(session.marker_position())
            .map(|(place, position)| (place.name.clone(), position));

        let output = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                show_map(
                    ui,
                    &mut self.interaction,
                    &mut self.viewport,
                    &self.tiles,
                    marker.as_ref().map(|(label, position)| MarkerView {
                        position: *position,
                        label,
                        draggable,
                    }),
                    &self.marker_style,
                    &self.attribution,
                )
            })
            .inner;

        for event in output.events {
            match event {
                MapEvent::MarkerDragEnd(position) => self.submit(Action::MarkerDragged(position)),
            }
        }
        for tile in output.missing_tiles {
            if self.orchestrator.request_tile(tile) {
                self.tiles.request(tile);
            }
        }
    }
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        if let Some(command) = self.orchestrator.take_viewport_command() {
            self.viewport.apply(command);
        }
        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        self.viewport.advance(f64::from(dt));

        if self.orchestrator.workflow().session().active_place().is_none() {
            self.show_loading_screen(ctx);
        } else {
            self.show_header(ctx);
            self.show_action_bar(ctx);
            self.show_map_panel(ctx);
        }

        let busy = self.viewport.is_animating()
            || self.interaction.is_dragging_marker()
            || self.orchestrator.workflow().session().is_loading();
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl Drop for ReviewApp {
    fn drop(&mut self) {
        // Completions still in flight land on a closed workflow.
        self.orchestrator.shutdown();
    }
}
