//! Diff CLI command
//!
//! Renders the difference between two JSON documents the same way `_DIFF`
//! does inside operation templates.

use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::settings::Settings;
use crate::diff::{DiffSchema, NO_DIFF_MARKER};
use crate::error::{BizlogError, BizlogResult};
use crate::expr::{Evaluator, FunctionRegistry, TemplateEvaluator};
use crate::models::{MethodId, RuntimeContext};

const DEFAULT_TEMPLATE: &str = "{_DIFF{#before, #after}}";

/// Arguments of `bizlog diff`
#[derive(Args)]
pub struct DiffArgs {
    /// JSON document before the change
    pub before: PathBuf,

    /// JSON document after the change
    pub after: PathBuf,

    /// YAML field schema naming the fields to report
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Template to render, with #before and #after bound to the documents
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    pub template: String,
}

/// Handle the diff command
pub fn handle_diff_command(settings: &Settings, args: DiffArgs) -> BizlogResult<()> {
    let rendered = render_diff(settings, &args)?;
    if rendered == NO_DIFF_MARKER {
        println!("No differences.");
    } else {
        println!("{}", rendered);
    }
    Ok(())
}

fn render_diff(settings: &Settings, args: &DiffArgs) -> BizlogResult<String> {
    let schema = DiffSchema::load(&args.schema)?;
    let evaluator = TemplateEvaluator::new(Arc::new(FunctionRegistry::new()), settings.diff.clone())
        .with_default_schema(schema);

    let ctx = RuntimeContext::new(MethodId::new("bizlog", "diff"))
        .with_arg("before", read_json(&args.before)?)
        .with_arg("after", read_json(&args.after)?);

    evaluator.eval(&args.template, &ctx, None)
}

fn read_json(path: &Path) -> BizlogResult<Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| BizlogError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| BizlogError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}
