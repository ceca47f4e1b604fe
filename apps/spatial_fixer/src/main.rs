mod backend_bridge;
mod config;
mod controller;
mod map;
mod ui;

use anyhow::Context;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::{ReviewApp, APP_TITLE};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load_settings().context("failed to load settings")?;
    tracing::info!(
        backend = %settings.backend_url,
        timeout_secs = settings.request_timeout.as_secs(),
        "starting review client"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let attribution = settings.tile_attribution.clone();
    runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(ReviewApp::new(cmd_tx, ui_rx, attribution)))),
    )
    .map_err(|err| anyhow::anyhow!("ui terminated with error: {err}"))
}
