//! Worker-to-UI events and user-facing error modeling.

use client_core::{Action, Notification, Operation};

use crate::map::TileId;

/// Decoded RGBA tile, ready to upload as a texture.
pub struct TileImage {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

pub enum UiEvent {
    Info(String),
    Error(UiError),
    /// Completion of a review request, fed straight back into the workflow.
    Review(Action),
    TileLoaded {
        tile: TileId,
        image: TileImage,
    },
    TileFailed {
        tile: TileId,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    QueueEmpty,
    Service,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    FetchPlace,
    SubmitCorrection,
}

impl From<Operation> for UiErrorContext {
    fn from(value: Operation) -> Self {
        match value {
            Operation::FetchNext => UiErrorContext::FetchPlace,
            Operation::SubmitCorrection => UiErrorContext::SubmitCorrection,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("no places left") {
            UiErrorCategory::QueueEmpty
        } else if lower.contains("responded with") {
            UiErrorCategory::Service
        } else if lower.contains("timed out")
            || lower.contains("failed to connect")
            || lower.contains("connection")
            || lower.contains("transport")
            || lower.contains("disconnected")
            || lower.contains("backend running")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_notification(notification: &Notification) -> Self {
        Self::from_message(notification.operation.into(), notification.message.clone())
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Short heading for the error banner.
    pub fn title(&self) -> &'static str {
        match (self.context, self.category) {
            (_, UiErrorCategory::QueueEmpty) => "Review queue is empty",
            (UiErrorContext::BackendStartup, _) => "Backend worker failed to start",
            (UiErrorContext::FetchPlace, _) => "Could not load the next place",
            (UiErrorContext::SubmitCorrection, _) => "Could not save the correction",
        }
    }

    pub fn retry_hint(&self) -> &'static str {
        match (self.context, self.category) {
            (UiErrorContext::BackendStartup, _) => "Restart the application.",
            (_, UiErrorCategory::QueueEmpty) => "Retry later to check for new places.",
            (UiErrorContext::SubmitCorrection, _) => {
                "Your marker position is kept; press Retry to submit it again."
            }
            (_, UiErrorCategory::Transport) => "Check that the review service is reachable, then retry.",
            _ => "Press Retry to try again.",
        }
    }
}
