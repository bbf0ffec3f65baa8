//! Command-line interface components
//!
//! This module contains the argument parsing and command handlers of the
//! reference host binary.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigAction, ConfigArgs, GetArgs, GlobalArgs};
pub use commands::{handle_clear, handle_config, handle_get};
