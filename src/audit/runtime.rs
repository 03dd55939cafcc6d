//! Operation runtime
//!
//! `OperationRuntime` wraps a business call with audit logging. Before the
//! call it runs before-call functions; after the call it resolves templates,
//! assembles records, and hands them to the sink. Nothing that goes wrong in
//! logging, including panics, changes what the business call returns.

use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::assembler::RecordAssembler;
use super::resolver::{ExpressionSet, TemplateResolver};
use super::sink::RecordSink;
use crate::error::{BizlogError, BizlogResult};
use crate::expr::Evaluator;
use crate::models::{LogVariables, OperationSet, OperationSpec, RuntimeContext};

/// Identity collaborator: who is performing the current operation
pub trait OperatorProvider: Send + Sync {
    fn current_operator(&self) -> Option<String>;
}

impl<F> OperatorProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_operator(&self) -> Option<String> {
        self()
    }
}

/// Provider for applications without an ambient identity
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOperator;

impl OperatorProvider for NoOperator {
    fn current_operator(&self) -> Option<String> {
        None
    }
}

/// Orchestrates logging around business calls
#[derive(Clone)]
pub struct OperationRuntime {
    evaluator: Arc<dyn Evaluator>,
    sink: Arc<dyn RecordSink>,
    operators: Arc<dyn OperatorProvider>,
}

/// Builder for `OperationRuntime`
#[derive(Default)]
pub struct OperationRuntimeBuilder {
    evaluator: Option<Arc<dyn Evaluator>>,
    sink: Option<Arc<dyn RecordSink>>,
    operators: Option<Arc<dyn OperatorProvider>>,
}

impl OperationRuntimeBuilder {
    pub fn evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn operator_provider(mut self, operators: Arc<dyn OperatorProvider>) -> Self {
        self.operators = Some(operators);
        self
    }

    /// Build the runtime; evaluator and sink are required
    pub fn build(self) -> BizlogResult<OperationRuntime> {
        let evaluator = self
            .evaluator
            .ok_or_else(|| BizlogError::Config("Runtime needs an evaluator".into()))?;
        let sink = self
            .sink
            .ok_or_else(|| BizlogError::Config("Runtime needs a record sink".into()))?;

        Ok(OperationRuntime {
            evaluator,
            sink,
            operators: self.operators.unwrap_or_else(|| Arc::new(NoOperator)),
        })
    }
}

impl OperationRuntime {
    pub fn builder() -> OperationRuntimeBuilder {
        OperationRuntimeBuilder::default()
    }

    /// Run `call` and log the operations declared for it
    ///
    /// The call's result is returned unchanged.
    pub fn execute<T, E, F>(&self, operations: &OperationSet, ctx: RuntimeContext, call: F) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        self.execute_with_variables(operations, ctx, |_| call())
    }

    /// Like `execute`, but the call may add variables visible to templates
    pub fn execute_with_variables<T, E, F>(
        &self,
        operations: &OperationSet,
        ctx: RuntimeContext,
        call: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: FnOnce(&mut LogVariables) -> Result<T, E>,
    {
        let precomputed = self.before_call(operations, &ctx);

        let mut variables = LogVariables::new();
        let outcome = call(&mut variables);

        let (ret, error) = match &outcome {
            Ok(value) => match serde_json::to_value(value) {
                Ok(value) => (Some(value), None),
                Err(e) => {
                    tracing::warn!(
                        method = %ctx.method(),
                        error = %e,
                        "Return value is not serializable; #_ret will be empty"
                    );
                    (None, None)
                }
            },
            Err(e) => (None, Some(e.to_string())),
        };

        let ctx = ctx.completed(ret, error, variables, precomputed);
        self.after_call(operations, &ctx);

        outcome
    }

    fn before_call(&self, operations: &OperationSet, ctx: &RuntimeContext) -> BTreeMap<String, String> {
        let templates = ExpressionSet::before_call(operations);
        if templates.is_empty() {
            return BTreeMap::new();
        }

        let resolver = TemplateResolver::new(self.evaluator.as_ref());
        match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve_before(&templates, ctx))) {
            Ok(precomputed) => precomputed,
            Err(payload) => {
                tracing::error!(
                    method = %ctx.method(),
                    panic = %panic_message(payload.as_ref()),
                    "Before-call logging panicked"
                );
                BTreeMap::new()
            }
        }
    }

    fn after_call(&self, operations: &OperationSet, ctx: &RuntimeContext) {
        for spec in operations {
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.record_operation(spec, ctx)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(
                    method = %ctx.method(),
                    operation = %spec.operation_type,
                    error = %e,
                    "Failed to record operation"
                ),
                Err(payload) => tracing::error!(
                    method = %ctx.method(),
                    operation = %spec.operation_type,
                    panic = %panic_message(payload.as_ref()),
                    "Operation logging panicked"
                ),
            }
        }
    }

    fn record_operation(&self, spec: &OperationSpec, ctx: &RuntimeContext) -> BizlogResult<()> {
        let success = ctx.is_success();
        if spec.action_template(success).trim().is_empty() {
            return Ok(());
        }

        let resolver = TemplateResolver::new(self.evaluator.as_ref());
        let assembler = RecordAssembler::new(ctx.method().clone());
        let templates = ExpressionSet::for_operation(spec, success);
        let external = self.operators.current_operator();

        if spec.is_batch {
            let values = resolver.resolve_batch(&templates, ctx, &spec.batch_collection_expr)?;
            let records = assembler.assemble_batch(spec, &values, success, external.as_deref())?;
            if records.is_empty() {
                return Ok(());
            }
            tracing::debug!(method = %ctx.method(), count = records.len(), "Emitting batch records");
            self.sink.batch_record(records)
        } else {
            match assembler.assemble(spec, &resolver.resolve(&templates, ctx)?, success, external.as_deref())? {
                Some(record) => {
                    tracing::debug!(method = %ctx.method(), biz_no = %record.biz_no, "Emitting record");
                    self.sink.record(record)
                }
                None => Ok(()),
            }
        }
    }
}

impl std::fmt::Debug for OperationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRuntime").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
