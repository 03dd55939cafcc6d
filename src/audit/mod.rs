//! Business operation audit logging
//!
//! Wraps business calls and turns their declared operations into
//! `AuditRecord`s.
//!
//! # Architecture
//!
//! - `TemplateResolver`: evaluates the distinct templates of a pass once,
//!   before the call (before-call functions) and after it.
//! - `RecordAssembler`: applies the condition gate, operator precedence and
//!   no-op update suppression, and builds records.
//! - `OperationRuntime`: orders the phases around the business call and
//!   isolates the call from every logging failure.
//! - `RecordSink`: persistence; `JsonlRecordSink` appends JSON lines to a
//!   file, `MemorySink` keeps records in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use bizlog::audit::{JsonlRecordSink, OperationRuntime};
//! use bizlog::models::{MethodId, RuntimeContext};
//!
//! let runtime = OperationRuntime::builder()
//!     .evaluator(Arc::new(evaluator))
//!     .sink(Arc::new(JsonlRecordSink::new(paths.audit_log())))
//!     .operator_provider(Arc::new(|| current_user()))
//!     .build()?;
//!
//! let ctx = RuntimeContext::new(MethodId::new("OrderService", "create"))
//!     .with_arg("order", serde_json::to_value(&order)?);
//! let created = runtime.execute(catalog_entry, ctx, || service.create(order))?;
//! ```

mod assembler;
mod logger;
mod record;
mod resolver;
mod runtime;
mod sink;

pub use assembler::{condition_passed, is_no_op_update, RecordAssembler};
pub use logger::JsonlRecordSink;
pub use record::AuditRecord;
pub use resolver::{BatchValues, ExpressionSet, ResolvedValues, TemplateResolver};
pub use runtime::{NoOperator, OperationRuntime, OperationRuntimeBuilder, OperatorProvider};
pub use sink::{MemorySink, RecordSink};
