//! Toolkit-independent core of the place review client.

pub mod client;
pub mod error;
pub mod map_view;
pub mod marker;
pub mod session;
pub mod workflow;

pub use client::{HttpReviewClient, ReviewBackend};
pub use error::NetworkError;
pub use map_view::{MapViewController, ViewportCommand, FLY_TO_ZOOM};
pub use session::ReviewSession;
pub use workflow::{
    perform, Action, Effect, Notification, NotificationLevel, Operation, RequestTicket,
    ReviewState, ReviewWorkflow,
};

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod client_tests;

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod workflow_tests;
