//! UI layer: the review window and its panels.

pub mod app;

pub use app::{ReviewApp, APP_TITLE};
