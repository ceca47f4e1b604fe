//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{perform, Action, Effect, HttpReviewClient, NetworkError};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::Semaphore;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::{TileImage, UiError, UiErrorContext, UiEvent};
use crate::map::TileId;

const MAX_CONCURRENT_TILE_FETCHES: usize = 8;
const TILE_USER_AGENT: &str = concat!("spatial_fixer/", env!("CARGO_PKG_VERSION"));

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let (client, tiles) = match build_clients(&settings) {
            Ok(clients) => clients,
            Err(message) => {
                tracing::error!("{message}");
                refuse_commands(&cmd_rx, &ui_tx, message);
                return;
            }
        };
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let message =
                    format!("backend worker startup failure: failed to build runtime: {err}");
                tracing::error!("{message}");
                refuse_commands(&cmd_rx, &ui_tx, message);
                return;
            }
        };

        runtime.block_on(async move {
            let tile_permits = Arc::new(Semaphore::new(MAX_CONCURRENT_TILE_FETCHES));
            let template: Arc<str> = settings.tile_url_template.into();

            tracing::info!(backend = %client.base_url(), "backend worker ready");
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend worker received command");
                match cmd {
                    BackendCommand::FetchNext { ticket } => {
                        spawn_review(&client, &ui_tx, Effect::FetchNext { ticket });
                    }
                    BackendCommand::SubmitCorrection {
                        ticket,
                        place_id,
                        location,
                    } => {
                        spawn_review(
                            &client,
                            &ui_tx,
                            Effect::SubmitCorrection {
                                ticket,
                                place_id,
                                location,
                            },
                        );
                    }
                    BackendCommand::FetchTile { tile } => {
                        let http = tiles.clone();
                        let permits = Arc::clone(&tile_permits);
                        let template = Arc::clone(&template);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let Ok(_permit) = permits.acquire_owned().await else {
                                return;
                            };
                            let event = match fetch_tile(&http, &template, tile).await {
                                Ok(image) => UiEvent::TileLoaded { tile, image },
                                Err(reason) => {
                                    tracing::debug!(?tile, %reason, "tile fetch failed");
                                    UiEvent::TileFailed { tile, reason }
                                }
                            };
                            let _ = ui_tx.try_send(event);
                        });
                    }
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

fn build_clients(settings: &Settings) -> Result<(Arc<HttpReviewClient>, reqwest::Client), String> {
    let client = HttpReviewClient::new(settings.backend_url.clone(), settings.request_timeout)
        .map_err(|err| format!("backend worker startup failure: {err}"))?;
    let tiles = reqwest::Client::builder()
        .user_agent(TILE_USER_AGENT)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| format!("backend worker startup failure: tile client: {err}"))?;
    Ok((Arc::new(client), tiles))
}

/// Keeps a worker that failed to start answering: every queued or later
/// command gets a failed reply, so no request is left pending in the UI.
fn refuse_commands(cmd_rx: &Receiver<BackendCommand>, ui_tx: &Sender<UiEvent>, message: String) {
    let _ = ui_tx.send(UiEvent::Error(UiError::from_message(
        UiErrorContext::BackendStartup,
        message.clone(),
    )));
    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "refusing command; backend worker is not running");
        if ui_tx.send(refusal(cmd, &message)).is_err() {
            return;
        }
    }
}

fn refusal(cmd: BackendCommand, message: &str) -> UiEvent {
    match cmd {
        BackendCommand::FetchNext { ticket } => UiEvent::Review(Action::FetchCompleted {
            ticket,
            result: Err(NetworkError::transport(message)),
        }),
        BackendCommand::SubmitCorrection { ticket, .. } => {
            UiEvent::Review(Action::SubmitCompleted {
                ticket,
                result: Err(NetworkError::transport(message)),
            })
        }
        BackendCommand::FetchTile { tile } => UiEvent::TileFailed {
            tile,
            reason: message.to_string(),
        },
    }
}

fn spawn_review(client: &Arc<HttpReviewClient>, ui_tx: &Sender<UiEvent>, effect: Effect) {
    let client = Arc::clone(client);
    let ui_tx = ui_tx.clone();
    tokio::spawn(async move {
        if let Some(action) = perform(&*client, effect).await {
            deliver_completion(ui_tx, action).await;
        }
    });
}

/// Completions must reach the workflow, so a full UI queue is waited out on
/// the blocking pool instead of dropping the event or parking a runtime worker.
async fn deliver_completion(ui_tx: Sender<UiEvent>, action: Action) {
    let event = match ui_tx.try_send(UiEvent::Review(action)) {
        Ok(()) => return,
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!("ui closed before review completion was delivered");
            return;
        }
        Err(TrySendError::Full(event)) => event,
    };
    tracing::debug!("ui event queue full; waiting to deliver review completion");
    let delivered = tokio::task::spawn_blocking(move || ui_tx.send(event).is_ok()).await;
    if !matches!(delivered, Ok(true)) {
        tracing::debug!("ui closed before review completion was delivered");
    }
}

async fn fetch_tile(
    http: &reqwest::Client,
    template: &str,
    tile: TileId,
) -> Result<TileImage, String> {
    let url = tile.url(template);
    let response = http
        .get(&url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| format!("request failed: {err}"))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| format!("failed to read body: {err}"))?;
    decode_tile(&bytes)
}

pub fn decode_tile(bytes: &[u8]) -> Result<TileImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(TileImage {
        size,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use client_core::{RequestTicket, ReviewState};
    use crossbeam_channel::bounded;

    use super::*;
    use crate::controller::orchestration::Orchestrator;

    const WAIT: Duration = Duration::from_secs(2);

    #[test]
    fn failed_worker_answers_commands_it_already_accepted() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let tile = TileId { z: 3, x: 1, y: 2 };
        cmd_tx
            .send(BackendCommand::FetchNext {
                ticket: RequestTicket(4),
            })
            .expect("queue fetch");
        cmd_tx.send(BackendCommand::FetchTile { tile }).expect("queue tile");
        drop(cmd_tx);

        refuse_commands(&cmd_rx, &ui_tx, "failed to build runtime".to_string());

        let Ok(UiEvent::Error(err)) = ui_rx.try_recv() else {
            panic!("expected startup error first");
        };
        assert_eq!(err.context(), UiErrorContext::BackendStartup);
        let Ok(UiEvent::Review(Action::FetchCompleted { ticket, result })) = ui_rx.try_recv()
        else {
            panic!("expected failed fetch completion");
        };
        assert_eq!(ticket, RequestTicket(4));
        assert!(result.expect_err("fetch must fail").message().contains("failed to build runtime"));
        assert!(matches!(
            ui_rx.try_recv(),
            Ok(UiEvent::TileFailed { tile: failed, .. }) if failed == tile
        ));
    }

    #[test]
    fn startup_failure_leaves_the_workflow_retryable() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let mut orchestrator = Orchestrator::new(cmd_tx);
        orchestrator.submit(Action::Start);

        let worker = thread::spawn(move || {
            refuse_commands(&cmd_rx, &ui_tx, "tile client: no tls backend".to_string());
        });

        loop {
            match ui_rx.recv_timeout(WAIT) {
                Ok(UiEvent::Review(action)) => {
                    orchestrator.submit(action);
                    break;
                }
                Ok(_) => continue,
                Err(err) => panic!("initial fetch was never answered: {err}"),
            }
        }
        assert_eq!(orchestrator.workflow().state(), ReviewState::Error);
        assert!(orchestrator.workflow().can_retry());

        // Retrying against the dead worker fails again instead of hanging.
        orchestrator.submit(Action::Retry);
        let Ok(UiEvent::Review(action)) = ui_rx.recv_timeout(WAIT) else {
            panic!("retry was never answered");
        };
        orchestrator.submit(action);
        assert!(orchestrator.workflow().can_retry());

        drop(orchestrator);
        worker.join().expect("worker thread");
    }

    #[tokio::test]
    async fn full_ui_queue_does_not_stall_the_runtime() {
        let (ui_tx, ui_rx) = bounded(1);
        ui_tx
            .try_send(UiEvent::Info("filler".to_string()))
            .expect("fill queue");

        let delivery = tokio::spawn(deliver_completion(ui_tx, Action::Retry));
        // The single-threaded test runtime must keep running other work.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!delivery.is_finished());

        assert!(matches!(ui_rx.try_recv(), Ok(UiEvent::Info(_))));
        delivery.await.expect("delivery task");
        assert!(matches!(ui_rx.try_recv(), Ok(UiEvent::Review(Action::Retry))));
    }

    #[test]
    fn decodes_png_tiles_to_rgba() {
        let mut encoded = Vec::new();
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .expect("encode png");

        let tile = decode_tile(&encoded).expect("decode");
        assert_eq!(tile.size, [4, 2]);
        assert_eq!(tile.rgba.len(), 4 * 2 * 4);
        assert_eq!(&tile.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn rejects_non_image_bodies() {
        assert!(decode_tile(b"<html>rate limited</html>").is_err());
    }
}
