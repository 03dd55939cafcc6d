//! Display formatting for terminal output
//!
//! Formats audit records for the `bizlog log` commands.

pub mod record;

pub use record::{format_record_details, format_record_list};
