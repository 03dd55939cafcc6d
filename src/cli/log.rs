//! Audit log CLI commands
//!
//! Reads the JSONL audit log written by `JsonlRecordSink`.

use clap::Subcommand;
use std::path::PathBuf;

use crate::audit::JsonlRecordSink;
use crate::config::paths::BizlogPaths;
use crate::display::{format_record_details, format_record_list};
use crate::error::BizlogResult;

/// Audit log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// Show the most recent audit records
    Show {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Audit log file (defaults to audit.log in the bizlog directory)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Show every field of each record
        #[arg(short, long)]
        verbose: bool,
    },

    /// Count the records in the audit log
    Count {
        /// Audit log file (defaults to audit.log in the bizlog directory)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Handle an audit log command
pub fn handle_log_command(paths: &BizlogPaths, cmd: LogCommands) -> BizlogResult<()> {
    match cmd {
        LogCommands::Show {
            limit,
            file,
            verbose,
        } => {
            let sink = JsonlRecordSink::new(file.unwrap_or_else(|| paths.audit_log()));
            let records = sink.read_recent(limit)?;

            if verbose {
                if records.is_empty() {
                    println!("No audit records found.");
                }
                for record in &records {
                    println!("{}", format_record_details(record));
                }
            } else {
                print!("{}", format_record_list(&records));
                if records.is_empty() {
                    println!();
                }
            }
        }

        LogCommands::Count { file } => {
            let sink = JsonlRecordSink::new(file.unwrap_or_else(|| paths.audit_log()));
            println!("{}", sink.entry_count()?);
        }
    }

    Ok(())
}
