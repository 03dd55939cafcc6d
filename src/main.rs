use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bizlog::cli::{handle_diff_command, handle_log_command, handle_spec_command};
use bizlog::config::{paths::BizlogPaths, settings::Settings};

#[derive(Parser)]
#[command(
    name = "bizlog",
    author = "Kaylee Beyene",
    version,
    about = "Template-driven business operation audit records",
    long_about = "bizlog turns declared business operations into audit records: \
                  who did what to which business object, with field-level diffs. \
                  The CLI validates operation catalogs, previews diffs and reads \
                  the audit log."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Operation catalog commands
    #[command(subcommand)]
    Spec(bizlog::cli::SpecCommands),

    /// Render the diff between two JSON documents
    Diff(bizlog::cli::DiffArgs),

    /// Audit log commands
    #[command(subcommand)]
    Log(bizlog::cli::LogCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = BizlogPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Spec(cmd)) => handle_spec_command(&paths, cmd)?,
        Some(Commands::Diff(args)) => handle_diff_command(&settings, args)?,
        Some(Commands::Log(cmd)) => handle_log_command(&paths, cmd)?,
        Some(Commands::Config) => {
            println!("bizlog Configuration");
            println!("====================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Settings file:     {}", paths.settings_file().display());
            println!("Operation catalog: {}", paths.specs_file().display());
            println!("Audit log:         {}", paths.audit_log().display());
            println!();
            println!("Diff settings:");
            println!("  Field separator:     {:?}", settings.diff.field_separator);
            println!("  List item separator: {:?}", settings.diff.list_item_separator);
            println!("  Of word:             {:?}", settings.diff.of_word);
            println!("  Add template:        {}", settings.diff.add_template);
            println!("  Update template:     {}", settings.diff.update_template);
            println!("  Delete template:     {}", settings.diff.delete_template);
        }
        None => {
            println!("bizlog - business operation audit records");
            println!();
            println!("Run 'bizlog --help' for usage information.");
        }
    }

    Ok(())
}
