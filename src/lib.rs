//! bizlog - template-driven business operation audit records
//!
//! Application code declares which operations a method performs
//! (`OperationSpec`) and wraps the call in an `OperationRuntime`. After the
//! call, the declared templates are evaluated against the arguments, return
//! value and error, and one `AuditRecord` per operation is handed to a
//! `RecordSink`. Field-level change descriptions come from the built-in
//! `_DIFF` template function.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: paths, settings and the YAML operation catalog
//! - `error`: custom error types
//! - `models`: operation declarations and the per-call runtime context
//! - `expr`: the template language and the value function registry
//! - `diff`: diff trees over JSON graphs and their rendering
//! - `audit`: resolution, assembly, the runtime and record sinks
//! - `display`: terminal formatting of records
//! - `cli`: command handlers for the `bizlog` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use bizlog::audit::{MemorySink, OperationRuntime};
//! use bizlog::config::settings::DiffSettings;
//! use bizlog::expr::{FunctionRegistry, TemplateEvaluator};
//! use bizlog::models::{MethodId, OperationSet, OperationSpec, RuntimeContext};
//!
//! let evaluator = TemplateEvaluator::new(Arc::new(FunctionRegistry::new()), DiffSettings::default());
//! let runtime = OperationRuntime::builder()
//!     .evaluator(Arc::new(evaluator))
//!     .sink(Arc::new(MemorySink::new()))
//!     .operator_provider(Arc::new(|| Some("alice".to_string())))
//!     .build()?;
//!
//! let method = MethodId::new("OrderService", "create");
//! let ops = OperationSet::new(
//!     &method,
//!     vec![OperationSpec::new("ORDER", "{{#_ret.id}}", "created order {{#_ret.id}}")],
//! )?;
//! let order = runtime.execute(&ops, RuntimeContext::new(method), || service.create())?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod diff;
pub mod display;
pub mod error;
pub mod expr;
pub mod models;

pub use error::{BizlogError, BizlogResult};
