//! webfile library
//!
//! Downloads files over HTTP(S) on background tasks, shares one transfer
//! between every caller that asks for the same destination while it is in
//! flight, and delivers each caller's boolean result on the host's main
//! context when the host ticks the coordinator.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use app::WebFile;
pub use errors::{AppError, Result};
