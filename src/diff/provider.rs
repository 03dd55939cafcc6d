//! Diff trees for JSON object graphs
//!
//! `JsonDiffProvider` compares a before and an after `serde_json::Value` and
//! annotates every field with the display metadata found in a `DiffSchema`.
//! Nested objects become nested nodes; arrays are leaves compared by
//! membership, and left to the renderer's list handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::tree::{ChangeState, DiffTree, FieldMeta, NodeId};
use crate::error::{BizlogError, BizlogResult};
use crate::expr::path::PathSegment;

/// Display configuration for the fields of one object type
///
/// ```yaml
/// title: { name: Title }
/// owner: { name: Owner, function: userName }
/// address:
///   name: Address
///   fields:
///     city: { name: City }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffSchema {
    pub fields: BTreeMap<String, FieldSpec>,
}

/// Display configuration for one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Display name; fields without one are never rendered
    pub name: String,

    /// Value function for this field's values
    pub function: String,

    /// Schema of a nested object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<DiffSchema>,
}

impl FieldSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn with_fields(mut self, fields: DiffSchema) -> Self {
        self.fields = Some(fields);
        self
    }

    fn meta(&self) -> Option<FieldMeta> {
        if self.name.trim().is_empty() {
            return None;
        }
        Some(FieldMeta::new(self.name.clone()).with_function(self.function.clone()))
    }
}

impl DiffSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    pub fn field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(key.into(), spec);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    pub fn from_yaml_str(yaml: &str) -> BizlogResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| BizlogError::Config(format!("Failed to parse diff schema: {}", e)))
    }

    /// Load a schema from a YAML file
    pub fn load(path: &Path) -> BizlogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BizlogError::Io(format!(
                "Failed to read diff schema {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)
    }
}

/// Builds diff trees from two JSON graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDiffProvider;

impl JsonDiffProvider {
    /// Compare two graphs; absent and null sides are treated alike
    pub fn diff(before: Option<&Value>, after: Option<&Value>, schema: &DiffSchema) -> DiffTree {
        let mut tree = DiffTree::new();
        let root = tree.root_id();
        let before = before.filter(|v| !v.is_null());
        let after = after.filter(|v| !v.is_null());

        let state = if is_object_or_absent(before) && is_object_or_absent(after) {
            compare_objects(&mut tree, root, before, after, Some(schema))
        } else {
            leaf_state(before, after)
        };
        tree.set_state(root, state);
        tree
    }
}

fn is_object_or_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_object)
}

fn leaf_state(before: Option<&Value>, after: Option<&Value>) -> ChangeState {
    match (before, after) {
        (None, None) => ChangeState::Unchanged,
        (None, Some(_)) => ChangeState::Added,
        (Some(_), None) => ChangeState::Removed,
        (Some(b), Some(a)) if same_leaf(b, a) => ChangeState::Unchanged,
        (Some(_), Some(_)) => ChangeState::Changed,
    }
}

/// Arrays are equal when each holds every element of the other, in any order
fn same_leaf(before: &Value, after: &Value) -> bool {
    match (before, after) {
        (Value::Array(b), Value::Array(a)) => {
            b.iter().all(|item| a.contains(item)) && a.iter().all(|item| b.contains(item))
        }
        _ => before == after,
    }
}

/// Add one child per key of either object, returning the parent's state
fn compare_objects(
    tree: &mut DiffTree,
    parent: NodeId,
    before: Option<&Value>,
    after: Option<&Value>,
    schema: Option<&DiffSchema>,
) -> ChangeState {
    let keys: BTreeSet<&String> = before
        .and_then(Value::as_object)
        .into_iter()
        .chain(after.and_then(Value::as_object))
        .flat_map(|map| map.keys())
        .collect();

    let mut changed = false;
    for key in keys {
        let b = before.and_then(|v| v.get(key.as_str())).filter(|v| !v.is_null());
        let a = after.and_then(|v| v.get(key.as_str())).filter(|v| !v.is_null());
        let spec = schema.and_then(|s| s.get(key));
        let meta = spec.and_then(FieldSpec::meta);
        let segment = PathSegment::Field(key.clone());

        let nested = (b.is_some() || a.is_some()) && is_object_or_absent(b) && is_object_or_absent(a);
        let state = if nested {
            let child = tree.add_child(parent, segment, ChangeState::Unchanged, meta, true);
            let inner = compare_objects(
                tree,
                child,
                b,
                a,
                spec.and_then(|s| s.fields.as_ref()),
            );
            let state = match (b, a) {
                (None, _) => ChangeState::Added,
                (_, None) => ChangeState::Removed,
                _ => inner,
            };
            tree.set_state(child, state);
            state
        } else {
            let state = leaf_state(b, a);
            tree.add_child(parent, segment, state, meta, false);
            state
        };

        changed |= state != ChangeState::Unchanged;
    }

    if changed {
        ChangeState::Changed
    } else {
        ChangeState::Unchanged
    }
}
