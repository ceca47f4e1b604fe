//! The fetch, correct, submit, refetch loop.
//!
//! `ReviewWorkflow` is a plain state machine: it consumes [`Action`]s and
//! returns [`Effect`]s for the caller to carry out. Network effects are
//! executed with [`perform`], which turns them back into completion actions.

use shared::domain::{GeoPoint, Place, PlaceId};
use tracing::{info, warn};

use crate::{client::ReviewBackend, error::NetworkError, marker, session::ReviewSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Initializing,
    Ready,
    Submitting,
    Error,
}

/// Identifies one issued network request so late completions can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchNext,
    SubmitCorrection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Kick off the first fetch. Only meaningful while initializing.
    Start,
    /// The user confirmed the current marker position.
    Confirm,
    /// The user asked to repeat the operation that failed.
    Retry,
    MarkerDragged(GeoPoint),
    FetchCompleted {
        ticket: RequestTicket,
        result: Result<Place, NetworkError>,
    },
    SubmitCompleted {
        ticket: RequestTicket,
        result: Result<(), NetworkError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub operation: Operation,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchNext {
        ticket: RequestTicket,
    },
    SubmitCorrection {
        ticket: RequestTicket,
        place_id: PlaceId,
        location: GeoPoint,
    },
    Notify(Notification),
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    ticket: RequestTicket,
    operation: Operation,
}

#[derive(Debug)]
pub struct ReviewWorkflow {
    state: ReviewState,
    session: ReviewSession,
    pending: Option<PendingRequest>,
    failed: Option<Operation>,
    next_ticket: u64,
    reviewed: u64,
    closed: bool,
}

impl Default for ReviewWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewWorkflow {
    pub fn new() -> Self {
        Self {
            state: ReviewState::Initializing,
            session: ReviewSession::new(),
            pending: None,
            failed: None,
            next_ticket: 1,
            reviewed: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Corrections saved successfully since start.
    pub fn reviewed_count(&self) -> u64 {
        self.reviewed
    }

    pub fn pending_operation(&self) -> Option<Operation> {
        self.pending.map(|pending| pending.operation)
    }

    /// The operation a `Retry` would repeat.
    pub fn failed_operation(&self) -> Option<Operation> {
        match self.state {
            ReviewState::Error => self.failed,
            _ => None,
        }
    }

    pub fn can_confirm(&self) -> bool {
        !self.closed
            && matches!(self.state, ReviewState::Ready | ReviewState::Error)
            && self.pending.is_none()
            && !self.session.is_loading()
            && self.session.pending_correction().is_some()
    }

    pub fn can_retry(&self) -> bool {
        !self.closed && self.state == ReviewState::Error && self.pending.is_none()
    }

    /// Stops the loop. Every later completion is discarded untouched.
    pub fn shutdown(&mut self) {
        self.closed = true;
        self.pending = None;
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed
    }

    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        match action {
            Action::Start => self.start(),
            Action::Confirm => self.confirm(),
            Action::Retry => self.retry(),
            Action::MarkerDragged(position) => {
                marker::on_drag_end(&mut self.session, position);
                Vec::new()
            }
            Action::FetchCompleted { ticket, result } => self.fetch_completed(ticket, result),
            Action::SubmitCompleted { ticket, result } => self.submit_completed(ticket, result),
        }
    }

    fn start(&mut self) -> Vec<Effect> {
        if self.state != ReviewState::Initializing || self.pending.is_some() {
            return Vec::new();
        }
        vec![self.issue_fetch()]
    }

    fn confirm(&mut self) -> Vec<Effect> {
        if !self.can_confirm() {
            return Vec::new();
        }
        self.issue_submit().into_iter().collect()
    }

    fn retry(&mut self) -> Vec<Effect> {
        if !self.can_retry() {
            return Vec::new();
        }
        match self.failed {
            Some(Operation::FetchNext) => vec![self.issue_fetch()],
            Some(Operation::SubmitCorrection) => self.issue_submit().into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn issue_fetch(&mut self) -> Effect {
        let ticket = self.take_ticket(Operation::FetchNext);
        self.session.set_loading(true);
        Effect::FetchNext { ticket }
    }

    fn issue_submit(&mut self) -> Option<Effect> {
        let (place_id, location) = self
            .session
            .pending_correction()
            .map(|(place, marker)| (place.id.clone(), marker))?;
        let ticket = self.take_ticket(Operation::SubmitCorrection);
        self.state = ReviewState::Submitting;
        Some(Effect::SubmitCorrection {
            ticket,
            place_id,
            location,
        })
    }

    fn take_ticket(&mut self, operation: Operation) -> RequestTicket {
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(PendingRequest { ticket, operation });
        ticket
    }

    /// Clears the pending slot if `ticket` is the request being waited on.
    fn settle(&mut self, ticket: RequestTicket, operation: Operation) -> bool {
        match self.pending {
            Some(pending) if pending.ticket == ticket && pending.operation == operation => {
                self.pending = None;
                true
            }
            _ => {
                warn!(ticket = ticket.0, ?operation, "discarding stale completion");
                false
            }
        }
    }

    fn fetch_completed(
        &mut self,
        ticket: RequestTicket,
        result: Result<Place, NetworkError>,
    ) -> Vec<Effect> {
        if !self.settle(ticket, Operation::FetchNext) {
            return Vec::new();
        }
        self.session.set_loading(false);
        match result {
            Ok(place) => {
                info!(place_id = %place.id, name = %place.name, "loaded place for review");
                self.session.load_place(place);
                self.state = ReviewState::Ready;
                self.failed = None;
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch next place");
                self.fail(Operation::FetchNext, fetch_failure_message(&err))
            }
        }
    }

    fn submit_completed(
        &mut self,
        ticket: RequestTicket,
        result: Result<(), NetworkError>,
    ) -> Vec<Effect> {
        if !self.settle(ticket, Operation::SubmitCorrection) {
            return Vec::new();
        }
        match result {
            Ok(()) => {
                self.reviewed += 1;
                let saved = self
                    .session
                    .active_place()
                    .map(|place| place.name.clone())
                    .unwrap_or_default();
                info!(reviewed = self.reviewed, place = %saved, "correction saved");
                // Stay in Submitting until the next place arrives.
                vec![
                    Effect::Notify(Notification {
                        level: NotificationLevel::Info,
                        operation: Operation::SubmitCorrection,
                        message: format!("Saved correction for {saved}"),
                    }),
                    self.issue_fetch(),
                ]
            }
            Err(err) => {
                warn!(error = %err, "failed to save correction");
                self.fail(
                    Operation::SubmitCorrection,
                    format!("Failed to save correction: {err}"),
                )
            }
        }
    }

    fn fail(&mut self, operation: Operation, message: String) -> Vec<Effect> {
        self.state = ReviewState::Error;
        self.failed = Some(operation);
        vec![Effect::Notify(Notification {
            level: NotificationLevel::Error,
            operation,
            message,
        })]
    }
}

fn fetch_failure_message(err: &NetworkError) -> String {
    if err.is_not_found() {
        "No places left to review.".to_string()
    } else if err.status_code().is_none() {
        format!("Failed to fetch place. Is the backend running? ({err})")
    } else {
        format!("Failed to fetch place: {err}")
    }
}

/// Runs one network effect against `backend` and returns its completion.
///
/// Returns `None` for effects that need no I/O.
pub async fn perform<B>(backend: &B, effect: Effect) -> Option<Action>
where
    B: ReviewBackend + ?Sized,
{
    match effect {
        Effect::FetchNext { ticket } => Some(Action::FetchCompleted {
            ticket,
            result: backend.fetch_next().await,
        }),
        Effect::SubmitCorrection {
            ticket,
            place_id,
            location,
        } => Some(Action::SubmitCompleted {
            ticket,
            result: backend.submit_correction(&place_id, location).await,
        }),
        Effect::Notify(_) => None,
    }
}
