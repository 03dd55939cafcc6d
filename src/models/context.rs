//! Per-invocation runtime context
//!
//! A `RuntimeContext` is created once per audited call. It starts out with the
//! method identity and its named arguments, and is completed after the call
//! with the return value, the error text, variables the business code added,
//! and function results computed before the call.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::operation::MethodId;

/// Variables the business code attaches to the current invocation
///
/// They are visible to templates as `#name` and shadow arguments of the
/// same name.
#[derive(Debug, Clone, Default)]
pub struct LogVariables {
    values: Map<String, Value>,
}

impl LogVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable bag of everything templates can reference for one call
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    method: MethodId,
    args: Map<String, Value>,
    variables: LogVariables,
    ret: Option<Value>,
    error: Option<String>,
    precomputed: BTreeMap<String, String>,
}

impl RuntimeContext {
    /// Create a context for a call that has not run yet
    pub fn new(method: MethodId) -> Self {
        Self {
            method,
            args: Map::new(),
            variables: LogVariables::new(),
            ret: None,
            error: None,
            precomputed: BTreeMap::new(),
        }
    }

    /// Add a named argument
    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Complete the context with the outcome of the call
    pub fn completed(
        mut self,
        ret: Option<Value>,
        error: Option<String>,
        variables: LogVariables,
        precomputed: BTreeMap<String, String>,
    ) -> Self {
        self.ret = ret;
        self.error = error;
        self.variables = variables;
        self.precomputed = precomputed;
        self
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Return value of the call, absent until it completed successfully
    pub fn ret(&self) -> Option<&Value> {
        self.ret.as_ref()
    }

    /// Error text of the call, absent on success
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Result of a before-call function, keyed by its call text
    pub fn precomputed(&self, key: &str) -> Option<&str> {
        self.precomputed.get(key).map(String::as_str)
    }

    /// Look up a named root: variables first, then arguments
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).or_else(|| self.args.get(name))
    }
}
