//! Worker thread that owns the async runtime and all network I/O.

pub mod commands;
pub mod runtime;
