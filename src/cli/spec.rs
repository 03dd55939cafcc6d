//! Operation catalog CLI commands

use clap::Subcommand;
use std::path::PathBuf;

use crate::config::catalog::SpecCatalog;
use crate::config::paths::BizlogPaths;
use crate::error::BizlogResult;
use crate::models::OperationSpec;

/// Catalog subcommands
#[derive(Subcommand)]
pub enum SpecCommands {
    /// Validate an operation catalog and list its operations
    Check {
        /// Catalog file (defaults to operations.yaml in the bizlog directory)
        file: Option<PathBuf>,
    },
}

/// Handle a catalog command
pub fn handle_spec_command(paths: &BizlogPaths, cmd: SpecCommands) -> BizlogResult<()> {
    match cmd {
        SpecCommands::Check { file } => {
            let path = file.unwrap_or_else(|| paths.specs_file());
            let catalog = SpecCatalog::load(&path)?;

            if catalog.is_empty() {
                println!("No operations declared in {}", path.display());
                return Ok(());
            }

            let mut total = 0;
            for (method, operations) in catalog.iter() {
                println!("{}", method);
                for spec in operations {
                    println!("  - {}", describe(spec));
                    total += 1;
                }
            }

            println!();
            println!(
                "OK: {} operation(s) on {} method(s)",
                total,
                catalog.len()
            );
        }
    }

    Ok(())
}

fn describe(spec: &OperationSpec) -> String {
    let mut text = spec.operation_type.clone();
    if !spec.action_type.is_empty() {
        text.push_str(&format!(" [{}]", spec.action_type));
    }
    if spec.is_batch {
        text.push_str(&format!(" batch over {}", spec.batch_collection_expr));
    }
    if spec.uses_external_operator() {
        text.push_str(" (operator from caller)");
    }
    text
}
