//! Template resolution passes
//!
//! A pass collects the distinct templates of the operations being logged,
//! evaluates each one once against the runtime context, and hands the results
//! to the assembler. Batch passes evaluate every template once per element of
//! the batch collection.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{BizlogError, BizlogResult};
use crate::expr::{BatchItem, CallCache, Evaluator};
use crate::models::{OperationSpec, RuntimeContext};

/// Deduplicated set of templates evaluated in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionSet {
    templates: BTreeSet<String>,
}

impl ExpressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template; blank templates are not evaluated
    pub fn insert(&mut self, template: &str) {
        if !template.trim().is_empty() {
            self.templates.insert(template.to_string());
        }
    }

    /// Templates needed to assemble a record of `spec` for the given outcome
    pub fn for_operation(spec: &OperationSpec, success: bool) -> Self {
        let mut set = Self::new();
        set.add_operation(spec, success);
        set
    }

    /// Success-path templates of every spec, for the before-call phase
    pub fn before_call<'a>(specs: impl IntoIterator<Item = &'a OperationSpec>) -> Self {
        let mut set = Self::new();
        for spec in specs {
            set.add_operation(spec, true);
        }
        set
    }

    fn add_operation(&mut self, spec: &OperationSpec, success: bool) {
        for template in [
            spec.action_template(success),
            spec.operator_expr.as_str(),
            spec.operation_type.as_str(),
            spec.biz_no_expr.as_str(),
            spec.sub_biz_no_expr.as_str(),
            spec.extra_expr.as_str(),
            spec.detail_expr.as_str(),
            spec.condition_expr.as_str(),
        ] {
            self.insert(template);
        }
    }

    pub fn contains(&self, template: &str) -> bool {
        self.templates.contains(template)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Template → rendered text for a single-record pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedValues {
    values: HashMap<String, String>,
}

impl ResolvedValues {
    /// Rendered text of a template; `None` for blank or unresolved templates
    pub fn get(&self, template: &str) -> Option<&str> {
        if template.trim().is_empty() {
            return None;
        }
        self.values.get(template).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Template → index-aligned rendered texts for a batch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchValues {
    len: usize,
    values: HashMap<String, Vec<String>>,
}

impl BatchValues {
    /// Number of elements in the batch collection
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rendered text of a template for the element at `index`
    pub fn get(&self, template: &str, index: usize) -> Option<&str> {
        if template.trim().is_empty() {
            return None;
        }
        self.values
            .get(template)
            .and_then(|texts| texts.get(index))
            .map(String::as_str)
    }
}

/// Runs resolution passes against an evaluator
#[derive(Clone, Copy)]
pub struct TemplateResolver<'e> {
    evaluator: &'e dyn Evaluator,
}

impl<'e> TemplateResolver<'e> {
    pub fn new(evaluator: &'e dyn Evaluator) -> Self {
        Self { evaluator }
    }

    /// Evaluate every template once; the first failure aborts the pass
    ///
    /// Calls shared between templates, such as one `_DIFF` in both the
    /// detail and the action, are rendered once per pass.
    pub fn resolve(
        &self,
        templates: &ExpressionSet,
        ctx: &RuntimeContext,
    ) -> BizlogResult<ResolvedValues> {
        let mut values = HashMap::with_capacity(templates.len());
        let mut cache = CallCache::new();
        for template in templates.iter() {
            let text = self.evaluator.eval_cached(template, ctx, None, &mut cache)?;
            values.insert(template.to_string(), text);
        }
        Ok(ResolvedValues { values })
    }

    /// Evaluate every template once per element of the batch collection
    pub fn resolve_batch(
        &self,
        templates: &ExpressionSet,
        ctx: &RuntimeContext,
        collection_expr: &str,
    ) -> BizlogResult<BatchValues> {
        if collection_expr.trim().is_empty() {
            return Err(BizlogError::evaluation(
                collection_expr,
                "batch operation has no collection expression",
            ));
        }

        let items: Vec<Value> = self.evaluator.eval_collection(collection_expr, ctx)?;
        let mut values: HashMap<String, Vec<String>> = HashMap::with_capacity(templates.len());
        let mut cache = CallCache::new();

        for template in templates.iter() {
            let mut texts = Vec::with_capacity(items.len());
            for (index, value) in items.iter().enumerate() {
                let item = BatchItem { index, value };
                texts.push(self.evaluator.eval_cached(template, ctx, Some(item), &mut cache)?);
            }
            values.insert(template.to_string(), texts);
        }

        Ok(BatchValues {
            len: items.len(),
            values,
        })
    }

    /// Run before-call functions, keyed by call text
    ///
    /// A template that fails here is reported and skipped; the call itself
    /// is evaluated again after the business call.
    pub fn resolve_before(
        &self,
        templates: &ExpressionSet,
        ctx: &RuntimeContext,
    ) -> BTreeMap<String, String> {
        let mut precomputed = BTreeMap::new();
        for template in templates.iter() {
            match self.evaluator.eval_before(template, ctx) {
                Ok(results) => precomputed.extend(results),
                Err(e) => tracing::warn!(
                    method = %ctx.method(),
                    template = %template,
                    error = %e,
                    "Before-call evaluation failed"
                ),
            }
        }
        precomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MethodId;
    use serde_json::json;
    use std::sync::Mutex;

    /// Echoes templates back and remembers how often each was evaluated
    #[derive(Default)]
    struct CountingEvaluator {
        calls: Mutex<HashMap<String, usize>>,
    }

    impl CountingEvaluator {
        fn count(&self, template: &str) -> usize {
            self.calls.lock().unwrap().get(template).copied().unwrap_or(0)
        }
    }

    impl Evaluator for CountingEvaluator {
        fn eval(
            &self,
            template: &str,
            _ctx: &RuntimeContext,
            item: Option<BatchItem<'_>>,
        ) -> BizlogResult<String> {
            *self.calls.lock().unwrap().entry(template.to_string()).or_default() += 1;
            if template == "boom" {
                return Err(BizlogError::evaluation(template, "boom"));
            }
            Ok(match item {
                Some(item) => format!("{}#{}", template, item.index),
                None => template.to_string(),
            })
        }

        fn eval_collection(&self, expr: &str, ctx: &RuntimeContext) -> BizlogResult<Vec<Value>> {
            match ctx.lookup(expr.trim_start_matches('#')) {
                Some(Value::Array(items)) => Ok(items.clone()),
                _ => Err(BizlogError::evaluation(expr, "not a sequence")),
            }
        }

        fn eval_before(&self, template: &str, _ctx: &RuntimeContext) -> BizlogResult<Vec<(String, String)>> {
            if template == "boom" {
                return Err(BizlogError::evaluation(template, "boom"));
            }
            Ok(vec![(template.to_string(), format!("pre:{}", template))])
        }
    }

    fn ctx() -> RuntimeContext {
        RuntimeContext::new(MethodId::new("OrderService", "create"))
            .with_arg("orders", json!([{"id": 1}, {"id": 2}, {"id": 3}]))
            .with_arg("none", json!([]))
    }

    #[test]
    fn test_expression_set_dedups_and_skips_blank() {
        let spec = OperationSpec::new("ORDER", "{{#order.id}}", "{{#order.id}}")
            .with_fail_template("failed")
            .with_condition("{{#order.id}}")
            .with_sub_biz_no("  ");

        let success = ExpressionSet::for_operation(&spec, true);
        assert_eq!(success.len(), 2);
        assert!(success.contains("ORDER"));
        assert!(success.contains("{{#order.id}}"));

        let failure = ExpressionSet::for_operation(&spec, false);
        assert!(failure.contains("failed"));
    }

    #[test]
    fn test_before_call_uses_success_templates_only() {
        let spec = OperationSpec::new("ORDER", "1", "created").with_fail_template("{f{#_errorMsg}}");
        let set = ExpressionSet::before_call([&spec]);
        assert!(set.contains("created"));
        assert!(!set.contains("{f{#_errorMsg}}"));
    }

    #[test]
    fn test_resolve_evaluates_each_template_once() {
        let a = OperationSpec::new("ORDER", "{{#id}}", "{{#id}}").with_detail("{{#id}}");
        let b = OperationSpec::new("ORDER", "{{#id}}", "other");
        let mut templates = ExpressionSet::for_operation(&a, true);
        for t in ExpressionSet::for_operation(&b, true).iter() {
            templates.insert(t);
        }

        let evaluator = CountingEvaluator::default();
        let resolved = TemplateResolver::new(&evaluator)
            .resolve(&templates, &ctx())
            .unwrap();

        assert_eq!(evaluator.count("{{#id}}"), 1);
        assert_eq!(evaluator.count("ORDER"), 1);
        assert_eq!(resolved.get("other"), Some("other"));
        assert_eq!(resolved.get(""), None);
    }

    #[test]
    fn test_shared_diff_renders_once_per_pass() {
        use crate::config::settings::DiffSettings;
        use crate::diff::{DiffSchema, FieldSpec};
        use crate::expr::{FunctionRegistry, TemplateEvaluator};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut functions = FunctionRegistry::new();
        functions.register("upper", move |text| {
            counter.fetch_add(1, Ordering::SeqCst);
            text.to_uppercase()
        });
        let schema = DiffSchema::new().field("title", FieldSpec::named("Title").with_function("upper"));
        let evaluator = TemplateEvaluator::new(Arc::new(functions), DiffSettings::default())
            .with_default_schema(schema);

        let mut templates = ExpressionSet::new();
        templates.insert("{_DIFF{#old, #new}}");
        templates.insert("changed: {_DIFF{ #old, #new }}");
        let ctx = ctx()
            .with_arg("old", json!({"title": "lamp"}))
            .with_arg("new", json!({"title": "desk"}));

        let resolved = TemplateResolver::new(&evaluator)
            .resolve(&templates, &ctx)
            .unwrap();

        // one render transforms the old and the new value
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let detail = resolved.get("{_DIFF{#old, #new}}").unwrap();
        assert!(detail.contains("LAMP") && detail.contains("DESK"));
        assert_eq!(
            resolved.get("changed: {_DIFF{ #old, #new }}"),
            Some(format!("changed: {}", detail).as_str())
        );
    }

    #[test]
    fn test_batch_diff_cached_per_element() {
        use crate::config::settings::DiffSettings;
        use crate::diff::{DiffSchema, FieldSpec};
        use crate::expr::{FunctionRegistry, TemplateEvaluator};
        use std::sync::Arc;

        let schema = DiffSchema::new().field("title", FieldSpec::named("Title"));
        let evaluator = TemplateEvaluator::new(Arc::new(FunctionRegistry::new()), DiffSettings::default())
            .with_default_schema(schema);
        let ctx = ctx().with_arg(
            "changes",
            json!([
                {"old": {"title": "A"}, "new": {"title": "B"}},
                {"old": {"title": "C"}, "new": {"title": "D"}}
            ]),
        );

        let mut templates = ExpressionSet::new();
        templates.insert("{_DIFF{#_item.old, #_item.new}}");
        templates.insert("x {_DIFF{#_item.old, #_item.new}}");
        let values = TemplateResolver::new(&evaluator)
            .resolve_batch(&templates, &ctx, "#changes")
            .unwrap();

        let first = values.get("{_DIFF{#_item.old, #_item.new}}", 0).unwrap();
        let second = values.get("{_DIFF{#_item.old, #_item.new}}", 1).unwrap();
        assert!(first.contains('A') && first.contains('B'));
        assert!(second.contains('C') && second.contains('D'));
        assert_eq!(
            values.get("x {_DIFF{#_item.old, #_item.new}}", 1),
            Some(format!("x {}", second).as_str())
        );
    }

    #[test]
    fn test_resolve_fails_fast() {
        let mut templates = ExpressionSet::new();
        templates.insert("boom");
        let evaluator = CountingEvaluator::default();
        let err = TemplateResolver::new(&evaluator)
            .resolve(&templates, &ctx())
            .unwrap_err();
        assert!(err.is_evaluation());
    }

    #[test]
    fn test_resolve_batch_aligns_by_index() {
        let mut templates = ExpressionSet::new();
        templates.insert("action");
        let evaluator = CountingEvaluator::default();
        let values = TemplateResolver::new(&evaluator)
            .resolve_batch(&templates, &ctx(), "#orders")
            .unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values.get("action", 0), Some("action#0"));
        assert_eq!(values.get("action", 2), Some("action#2"));
        assert_eq!(values.get("action", 3), None);
        assert_eq!(evaluator.count("action"), 3);
    }

    #[test]
    fn test_resolve_batch_empty_collection() {
        let mut templates = ExpressionSet::new();
        templates.insert("action");
        let evaluator = CountingEvaluator::default();
        let values = TemplateResolver::new(&evaluator)
            .resolve_batch(&templates, &ctx(), "#none")
            .unwrap();
        assert!(values.is_empty());
        assert_eq!(evaluator.count("action"), 0);
    }

    #[test]
    fn test_resolve_batch_requires_collection() {
        let evaluator = CountingEvaluator::default();
        let resolver = TemplateResolver::new(&evaluator);
        assert!(resolver
            .resolve_batch(&ExpressionSet::new(), &ctx(), "")
            .is_err());
        assert!(resolver
            .resolve_batch(&ExpressionSet::new(), &ctx(), "#missing")
            .is_err());
    }

    #[test]
    fn test_resolve_before_skips_failures() {
        let mut templates = ExpressionSet::new();
        templates.insert("boom");
        templates.insert("ok");
        let evaluator = CountingEvaluator::default();
        let pre = TemplateResolver::new(&evaluator).resolve_before(&templates, &ctx());
        assert_eq!(pre.len(), 1);
        assert_eq!(pre.get("ok").map(String::as_str), Some("pre:ok"));
    }
}
