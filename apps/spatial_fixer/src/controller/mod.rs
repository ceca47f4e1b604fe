//! Controller layer: UI events, user-facing errors, and command orchestration.

pub mod events;
pub mod orchestration;
