//! Template evaluation
//!
//! The resolver only depends on the [`Evaluator`] trait; `TemplateEvaluator`
//! is the bundled implementation of the `{fn{#expr}}` template language.

pub mod functions;
pub mod path;
pub mod template;

use serde_json::Value;
use std::collections::HashMap;

use crate::error::BizlogResult;
use crate::models::RuntimeContext;

pub use functions::{FunctionRegistry, ValueFunctionRegistry};
pub use path::{value_text, PathSegment, ValuePath};
pub use template::TemplateEvaluator;

/// One element of a batch collection
#[derive(Debug, Clone, Copy)]
pub struct BatchItem<'a> {
    pub index: usize,
    pub value: &'a Value,
}

/// Results of calls already rendered during one resolution pass
///
/// Keyed by call text and batch index, so a call embedded in several
/// templates of the same pass is rendered once.
#[derive(Debug, Clone, Default)]
pub struct CallCache {
    results: HashMap<(String, Option<usize>), String>,
}

impl CallCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, call: &str, index: Option<usize>) -> Option<&str> {
        self.results
            .get(&(call.to_string(), index))
            .map(String::as_str)
    }

    pub fn insert(&mut self, call: impl Into<String>, index: Option<usize>, result: impl Into<String>) {
        self.results.insert((call.into(), index), result.into());
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Evaluates templates against a runtime context
///
/// Shared by all concurrent invocations.
pub trait Evaluator: Send + Sync {
    /// Evaluate one template, optionally against a batch element
    fn eval(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
    ) -> BizlogResult<String>;

    /// Evaluate one template, reusing calls rendered earlier in the same pass
    fn eval_cached(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        item: Option<BatchItem<'_>>,
        _cache: &mut CallCache,
    ) -> BizlogResult<String> {
        self.eval(template, ctx, item)
    }

    /// Evaluate an expression that must produce a sequence
    fn eval_collection(&self, expr: &str, ctx: &RuntimeContext) -> BizlogResult<Vec<Value>>;

    /// Compute the before-call functions referenced by `template`
    ///
    /// Returns `(call key, result)` pairs that are handed back through
    /// [`RuntimeContext::precomputed`] after the call.
    fn eval_before(&self, _template: &str, _ctx: &RuntimeContext) -> BizlogResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}
