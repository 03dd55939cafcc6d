//! Default template language
//!
//! Templates are literal text with placeholders of the form `{fn{args}}`,
//! where the function name is optional: `{{#order.id}}` inserts a value and
//! `{userName{#order.owner}}` passes a value through a registered function.
//! Arguments are `#`-paths or single-quoted literals.
//!
//! Reserved roots: `#_ret` (return value), `#_errorMsg` (error text),
//! `#_item` and `#_index` (current batch element). The built-in `_DIFF`
//! function renders a structural diff of its first two arguments using the
//! schema named by an optional third literal argument.

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::functions::ValueFunctionRegistry;
use super::path::{value_text, ValuePath};
use super::{BatchItem, CallCache, Evaluator};
use crate::config::settings::DiffSettings;
use crate::diff::{DiffRenderer, DiffSchema, JsonDiffProvider};
use crate::error::{BizlogError, BizlogResult};
use crate::models::RuntimeContext;

/// Name of the built-in diff function
pub const DIFF_FUNCTION: &str = "_DIFF";

/// Schema used by `_DIFF` calls that name none
pub const DEFAULT_SCHEMA: &str = "default";

const RET: &str = "_ret";
const ERROR_MSG: &str = "_errorMsg";
const ITEM: &str = "_item";
const INDEX: &str = "_index";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*(\w*)\s*\{(.*?)\}\s*\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Path(ValuePath),
    Literal(String),
}

impl Arg {
    fn is_batch_scoped(&self) -> bool {
        matches!(self, Self::Path(path) if path.root() == ITEM || path.root() == INDEX)
    }
}

/// Evaluator for the `{fn{#expr}}` template language
#[derive(Clone)]
pub struct TemplateEvaluator {
    functions: Arc<dyn ValueFunctionRegistry>,
    renderer: DiffRenderer,
    schemas: HashMap<String, DiffSchema>,
}

impl TemplateEvaluator {
    pub fn new(functions: Arc<dyn ValueFunctionRegistry>, settings: DiffSettings) -> Self {
        Self {
            renderer: DiffRenderer::new(settings, Arc::clone(&functions)),
            functions,
            schemas: HashMap::new(),
        }
    }

    /// Register a diff schema usable as `_DIFF{#a, #b, 'name'}`
    pub fn with_schema(mut self, name: impl Into<String>, schema: DiffSchema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Register the schema used by two-argument `_DIFF` calls
    pub fn with_default_schema(self, schema: DiffSchema) -> Self {
        self.with_schema(DEFAULT_SCHEMA, schema)
    }

    fn expand(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        cache: &mut CallCache,
    ) -> BizlogResult<String> {
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let expr = caps.get(2).map_or("", |m| m.as_str());

            output.push_str(&template[last..whole.start()]);
            output.push_str(&self.placeholder(template, name, expr, ctx, item, cache)?);
            last = whole.end();
        }

        output.push_str(&template[last..]);
        Ok(output)
    }

    fn placeholder(
        &self,
        template: &str,
        name: &str,
        expr: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        cache: &mut CallCache,
    ) -> BizlogResult<String> {
        let args = parse_args(expr).map_err(|reason| BizlogError::evaluation(template, reason))?;

        match name {
            "" => match args.as_slice() {
                [arg] => Ok(self
                    .resolve_arg(arg, ctx, item, template)?
                    .map(|value| value_text(&value))
                    .unwrap_or_default()),
                _ => Err(BizlogError::evaluation(
                    template,
                    "expected exactly one expression",
                )),
            },
            DIFF_FUNCTION => {
                let key = call_key(DIFF_FUNCTION, expr);
                let index = item.map(|item| item.index);
                if let Some(text) = cache.get(&key, index) {
                    return Ok(text.to_string());
                }
                let text = self.render_diff(&args, ctx, item, template)?;
                cache.insert(key, index, text.clone());
                Ok(text)
            }
            function => {
                if let Some(value) = ctx.precomputed(&call_key(function, expr)) {
                    return Ok(value.to_string());
                }
                let text = self.argument_text(&args, ctx, item, template)?;
                Ok(self.functions.apply(function, &text))
            }
        }
    }

    fn argument_text(
        &self,
        args: &[Arg],
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        template: &str,
    ) -> BizlogResult<String> {
        match args {
            [] => Ok(String::new()),
            [arg] => Ok(self
                .resolve_arg(arg, ctx, item, template)?
                .map(|value| value_text(&value))
                .unwrap_or_default()),
            _ => Err(BizlogError::evaluation(
                template,
                "functions take at most one argument",
            )),
        }
    }

    fn render_diff(
        &self,
        args: &[Arg],
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        template: &str,
    ) -> BizlogResult<String> {
        let (before_arg, after_arg, schema_name) = match args {
            [before, after] => (before, after, DEFAULT_SCHEMA),
            [before, after, Arg::Literal(name)] => (before, after, name.as_str()),
            _ => {
                return Err(BizlogError::evaluation(
                    template,
                    "_DIFF expects (#before, #after) or (#before, #after, 'schema')",
                ))
            }
        };
        let schema = self.schemas.get(schema_name).ok_or_else(|| {
            BizlogError::evaluation(template, format!("unknown diff schema '{}'", schema_name))
        })?;

        let before = self.resolve_arg(before_arg, ctx, item, template)?;
        let after = self.resolve_arg(after_arg, ctx, item, template)?;
        let tree = JsonDiffProvider::diff(before.as_deref(), after.as_deref(), schema);
        Ok(self.renderer.render(&tree, before.as_deref(), after.as_deref()))
    }

    fn resolve_arg<'a>(
        &self,
        arg: &Arg,
        ctx: &'a RuntimeContext,
        item: Option<BatchItem<'a>>,
        template: &str,
    ) -> BizlogResult<Option<Cow<'a, Value>>> {
        match arg {
            Arg::Literal(text) => Ok(Some(Cow::Owned(Value::String(text.clone())))),
            Arg::Path(path) => resolve_path(path, ctx, item, template),
        }
    }
}

impl Evaluator for TemplateEvaluator {
    fn eval(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
    ) -> BizlogResult<String> {
        self.expand(template, ctx, item, &mut CallCache::new())
    }

    fn eval_cached(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        cache: &mut CallCache,
    ) -> BizlogResult<String> {
        self.expand(template, ctx, item, cache)
    }

    fn eval_collection(&self, expr: &str, ctx: &RuntimeContext) -> BizlogResult<Vec<Value>> {
        let path = ValuePath::parse(unwrap_placeholder(expr))
            .map_err(|reason| BizlogError::evaluation(expr, reason))?;

        match resolve_path(&path, ctx, None, expr)?.as_deref() {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(BizlogError::evaluation(
                expr,
                format!("expected a sequence, got {}", value_kind(other)),
            )),
        }
    }

    fn eval_before(&self, template: &str, ctx: &RuntimeContext) -> BizlogResult<Vec<(String, String)>> {
        let mut results = Vec::new();

        for caps in PLACEHOLDER.captures_iter(template) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let expr = caps.get(2).map_or("", |m| m.as_str());
            if name.is_empty() || name == DIFF_FUNCTION || !self.functions.executes_before(name) {
                continue;
            }

            let args =
                parse_args(expr).map_err(|reason| BizlogError::evaluation(template, reason))?;
            // per-element calls can only run once the batch exists
            if args.iter().any(Arg::is_batch_scoped) {
                continue;
            }
            let text = self.argument_text(&args, ctx, None, template)?;
            results.push((call_key(name, expr), self.functions.apply(name, &text)));
        }

        Ok(results)
    }
}

impl fmt::Debug for TemplateEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemas: Vec<&String> = self.schemas.keys().collect();
        schemas.sort();
        f.debug_struct("TemplateEvaluator")
            .field("renderer", &self.renderer)
            .field("schemas", &schemas)
            .finish_non_exhaustive()
    }
}

fn resolve_path<'a>(
    path: &ValuePath,
    ctx: &'a RuntimeContext,
    item: Option<BatchItem<'a>>,
    template: &str,
) -> BizlogResult<Option<Cow<'a, Value>>> {
    let root: Cow<'a, Value> = match path.root() {
        RET => match ctx.ret() {
            Some(value) => Cow::Borrowed(value),
            None => return Ok(None),
        },
        ERROR_MSG => match ctx.error() {
            Some(error) => Cow::Owned(Value::String(error.to_string())),
            None => return Ok(None),
        },
        ITEM => Cow::Borrowed(batch_item(item, template)?.value),
        INDEX => Cow::Owned(Value::from(batch_item(item, template)?.index)),
        name => Cow::Borrowed(ctx.lookup(name).ok_or_else(|| {
            BizlogError::evaluation(template, format!("unknown variable '#{}'", name))
        })?),
    };

    Ok(match root {
        Cow::Borrowed(value) => path.resolve(value).map(Cow::Borrowed),
        Cow::Owned(value) => path.resolve(&value).cloned().map(Cow::Owned),
    })
}

fn batch_item<'a>(item: Option<BatchItem<'a>>, template: &str) -> BizlogResult<BatchItem<'a>> {
    item.ok_or_else(|| BizlogError::evaluation(template, "#_item used outside a batch"))
}

/// Key under which a before-call function result is stored
fn call_key(function: &str, expr: &str) -> String {
    format!("{}{{{}}}", function, expr.trim())
}

/// Accept both `#orders` and `{{#orders}}` as collection expressions
fn unwrap_placeholder(expr: &str) -> &str {
    let trimmed = expr.trim();
    if let Some(caps) = PLACEHOLDER.captures(trimmed) {
        let whole_match = caps.get(0).is_some_and(|m| m.as_str() == trimmed);
        let unnamed = caps.get(1).map_or(true, |m| m.as_str().is_empty());
        if whole_match && unnamed {
            if let Some(inner) = caps.get(2) {
                return inner.as_str();
            }
        }
    }
    trimmed
}

fn parse_args(expr: &str) -> Result<Vec<Arg>, String> {
    if expr.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_args(expr).into_iter().map(parse_arg).collect()
}

/// Split on commas that are not inside a quoted literal
fn split_args(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                parts.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

fn parse_arg(raw: &str) -> Result<Arg, String> {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Ok(Arg::Literal(raw[1..raw.len() - 1].to_string()));
    }
    if raw.starts_with('#') {
        return ValuePath::parse(raw).map(Arg::Path);
    }
    Err(format!("unsupported expression '{}'", raw))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
