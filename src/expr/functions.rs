//! Value functions
//!
//! Named functions turn raw value text into display text, e.g. a user id into
//! a user name. Templates call them as `{name{#expr}}` and diff schemas name
//! them per field. Functions flagged to run before the call are evaluated
//! while the old state is still observable.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lookup of value functions by name
///
/// Implementations are shared across concurrent invocations.
pub trait ValueFunctionRegistry: Send + Sync {
    /// Apply the named function; unknown names pass the value through
    fn apply(&self, name: &str, value: &str) -> String;

    /// Whether the named function is evaluated before the audited call
    fn executes_before(&self, name: &str) -> bool;
}

type FunctionImpl = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
struct RegisteredFunction {
    execute_before: bool,
    function: FunctionImpl,
}

/// In-memory function registry
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function evaluated after the call
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.insert(name.into(), false, Arc::new(function))
    }

    /// Register a function evaluated before the call
    pub fn register_before<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.insert(name.into(), true, Arc::new(function))
    }

    fn insert(&mut self, name: String, execute_before: bool, function: FunctionImpl) -> &mut Self {
        self.functions.insert(
            name,
            RegisteredFunction {
                execute_before,
                function,
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl ValueFunctionRegistry for FunctionRegistry {
    fn apply(&self, name: &str, value: &str) -> String {
        match self.functions.get(name) {
            Some(registered) => (registered.function)(value),
            None => value.to_string(),
        }
    }

    fn executes_before(&self, name: &str) -> bool {
        self.functions
            .get(name)
            .is_some_and(|registered| registered.execute_before)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_registered() {
        let mut registry = FunctionRegistry::new();
        registry.register("upper", |v| v.to_uppercase());

        assert_eq!(registry.apply("upper", "alice"), "ALICE");
        assert!(registry.contains("upper"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_function_passes_through() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.apply("missing", "42"), "42");
        assert!(!registry.executes_before("missing"));
    }

    #[test]
    fn test_execute_before_flag() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("after", |v| v.to_string())
            .register_before("before", |v| v.to_string());

        assert!(!registry.executes_before("after"));
        assert!(registry.executes_before("before"));
    }

    #[test]
    fn test_debug_lists_names() {
        let mut registry = FunctionRegistry::new();
        registry.register("b", |v| v.into()).register("a", |v| v.into());
        assert_eq!(
            format!("{:?}", registry),
            "FunctionRegistry { functions: [\"a\", \"b\"] }"
        );
    }
}
