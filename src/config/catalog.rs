//! Operation catalog
//!
//! Loads operation declarations from a YAML file keyed by `Type::method`:
//!
//! ```yaml
//! OrderService::update:
//!   - operation_type: ORDER
//!     biz_no_expr: "{{#order.id}}"
//!     success_template: "updated order {{#order.id}}"
//!     detail_expr: "{_DIFF{#old, #order, 'order'}}"
//!     action_type: UPDATE
//! ```
//!
//! Every declaration is validated while loading, so a malformed catalog fails
//! before any audited call runs.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BizlogError, BizlogResult};
use crate::models::{MethodId, OperationSet, OperationSpec};

/// Validated operations for every declared method
#[derive(Debug, Clone, Default)]
pub struct SpecCatalog {
    operations: BTreeMap<MethodId, OperationSet>,
}

impl SpecCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operations of one method
    pub fn register(&mut self, method: MethodId, specs: Vec<OperationSpec>) -> BizlogResult<()> {
        let set = OperationSet::new(&method, specs)?;
        self.operations.insert(method, set);
        Ok(())
    }

    /// Parse and validate a YAML catalog
    pub fn from_yaml_str(yaml: &str) -> BizlogResult<Self> {
        let raw: BTreeMap<String, Vec<OperationSpec>> = serde_yaml::from_str(yaml)
            .map_err(|e| BizlogError::Config(format!("Failed to parse operation catalog: {}", e)))?;

        let mut catalog = Self::new();
        for (key, specs) in raw {
            let method: MethodId = key.parse().map_err(BizlogError::Config)?;
            catalog.register(method, specs)?;
        }
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> BizlogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BizlogError::Io(format!(
                "Failed to read operation catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Operations declared on `method`
    pub fn lookup(&self, method: &MethodId) -> Option<&OperationSet> {
        self.operations.get(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MethodId, &OperationSet)> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
