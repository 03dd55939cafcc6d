//! Core data models for bizlog
//!
//! Operation declarations, the per-invocation runtime context, and record
//! identifiers.

pub mod context;
pub mod ids;
pub mod operation;

pub use context::{LogVariables, RuntimeContext};
pub use ids::RecordId;
pub use operation::{MethodId, OperationSet, OperationSpec, SpecValidationError};
