//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the library.

pub mod diff;
pub mod log;
pub mod spec;

pub use diff::{handle_diff_command, DiffArgs};
pub use log::{handle_log_command, LogCommands};
pub use spec::{handle_spec_command, SpecCommands};
