//! Structural diffs between before/after object graphs
//!
//! - `tree`: the arena-backed diff tree and its read-only node views
//! - `provider`: builds diff trees from JSON values and a `DiffSchema`
//! - `render`: turns a diff tree into change descriptions

pub mod provider;
pub mod render;
pub mod tree;

pub use provider::{DiffSchema, FieldSpec, JsonDiffProvider};
pub use render::{DiffRenderer, NO_DIFF_MARKER};
pub use tree::{ChangeState, DiffNode, DiffTree, FieldMeta, NodeId};
