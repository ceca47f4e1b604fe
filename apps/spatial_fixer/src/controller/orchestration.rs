//! Command orchestration helpers from UI actions to backend command queue.

use std::collections::VecDeque;

use client_core::{
    Action, Effect, MapViewController, NetworkError, Notification, ReviewWorkflow,
    ViewportCommand,
};
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::map::TileId;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err("UI command queue is full; please retry".to_string())
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend command processor disconnected");
            Err(
                "Backend worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string(),
            )
        }
    }
}

/// Owns the review workflow and routes its effects: network work goes to the
/// backend worker, notifications go back to the caller.
pub struct Orchestrator {
    workflow: ReviewWorkflow,
    map_view: MapViewController,
    cmd_tx: Sender<BackendCommand>,
    viewport_command: Option<ViewportCommand>,
}

impl Orchestrator {
    pub fn new(cmd_tx: Sender<BackendCommand>) -> Self {
        Self {
            workflow: ReviewWorkflow::new(),
            map_view: MapViewController::new(),
            cmd_tx,
            viewport_command: None,
        }
    }

    pub fn workflow(&self) -> &ReviewWorkflow {
        &self.workflow
    }

    /// Feeds `action` to the workflow and carries out every resulting effect.
    ///
    /// A command that cannot be queued is answered immediately with a failed
    /// completion, so the workflow never waits on a request that was never sent.
    pub fn submit(&mut self, action: Action) -> Vec<Notification> {
        let mut notifications = Vec::new();
        let mut queue = VecDeque::from([action]);

        while let Some(action) = queue.pop_front() {
            for effect in self.workflow.handle(action) {
                let Some(cmd) = BackendCommand::from_effect(effect.clone()) else {
                    if let Effect::Notify(notification) = effect {
                        notifications.push(notification);
                    }
                    continue;
                };
                if let Err(message) = dispatch_backend_command(&self.cmd_tx, cmd) {
                    queue.extend(undeliverable(&effect, message));
                }
            }

            if let Some(command) = self.map_view.observe(self.workflow.session()) {
                self.viewport_command = Some(command);
            }
        }

        notifications
    }

    pub fn take_viewport_command(&mut self) -> Option<ViewportCommand> {
        self.viewport_command.take()
    }

    /// Queues a tile download. Returns whether the worker accepted it.
    pub fn request_tile(&self, tile: TileId) -> bool {
        match self.cmd_tx.try_send(BackendCommand::FetchTile { tile }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(?tile, "tile request dropped; backend worker is gone");
                false
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.workflow.shutdown();
        self.viewport_command = None;
    }
}

fn undeliverable(effect: &Effect, message: String) -> Option<Action> {
    match effect {
        Effect::FetchNext { ticket } => Some(Action::FetchCompleted {
            ticket: *ticket,
            result: Err(NetworkError::transport(message)),
        }),
        Effect::SubmitCorrection { ticket, .. } => Some(Action::SubmitCompleted {
            ticket: *ticket,
            result: Err(NetworkError::transport(message)),
        }),
        Effect::Notify(_) => None,
    }
}
