//! Operation declaration model
//!
//! An `OperationSpec` describes one loggable operation: which templates to
//! resolve on success and failure, how to identify the business object and the
//! operator, and whether the operation fans out into one record per element
//! of a collection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BizlogError, BizlogResult};

/// Identity of an audited method: declaring type plus method name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    pub declaring_type: String,
    pub method_name: String,
}

impl MethodId {
    pub fn new(declaring_type: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method_name: method_name.into(),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.method_name)
    }
}

impl FromStr for MethodId {
    type Err = String;

    /// Parses `Type::method`; the type part may itself contain `::`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().rsplit_once("::") {
            Some((ty, method)) if !ty.is_empty() && !method.is_empty() => {
                Ok(Self::new(ty, method))
            }
            _ => Err(format!("expected 'Type::method', got '{}'", s)),
        }
    }
}

/// Declarative description of one loggable operation
///
/// Empty strings mean "not configured". An empty `operator_expr` means the
/// operator is taken from the identity collaborator instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSpec {
    /// Action template used when the operation succeeds
    pub success_template: String,

    /// Action template used when the operation fails
    pub fail_template: String,

    /// Expression resolving the operator id
    pub operator_expr: String,

    /// Business module / operation type template
    pub operation_type: String,

    /// Business key template
    pub biz_no_expr: String,

    pub sub_biz_no_expr: String,

    pub extra_expr: String,

    /// Detail template, usually a `_DIFF` directive
    pub detail_expr: String,

    /// Record is kept only when this resolves to text ending in "true"
    pub condition_expr: String,

    /// Fan out into one record per element of `batch_collection_expr`
    pub is_batch: bool,

    pub batch_collection_expr: String,

    /// Free-form action category, e.g. "UPDATE"
    pub action_type: String,
}

impl OperationSpec {
    /// Create a spec with the mandatory parts of a success-path record
    pub fn new(
        operation_type: impl Into<String>,
        biz_no_expr: impl Into<String>,
        success_template: impl Into<String>,
    ) -> Self {
        Self {
            operation_type: operation_type.into(),
            biz_no_expr: biz_no_expr.into(),
            success_template: success_template.into(),
            ..Default::default()
        }
    }

    pub fn with_fail_template(mut self, template: impl Into<String>) -> Self {
        self.fail_template = template.into();
        self
    }

    pub fn with_operator(mut self, expr: impl Into<String>) -> Self {
        self.operator_expr = expr.into();
        self
    }

    pub fn with_sub_biz_no(mut self, expr: impl Into<String>) -> Self {
        self.sub_biz_no_expr = expr.into();
        self
    }

    pub fn with_extra(mut self, expr: impl Into<String>) -> Self {
        self.extra_expr = expr.into();
        self
    }

    pub fn with_detail(mut self, expr: impl Into<String>) -> Self {
        self.detail_expr = expr.into();
        self
    }

    pub fn with_condition(mut self, expr: impl Into<String>) -> Self {
        self.condition_expr = expr.into();
        self
    }

    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = action_type.into();
        self
    }

    /// Turn this spec into a batch spec over the given collection expression
    pub fn batch_over(mut self, collection_expr: impl Into<String>) -> Self {
        self.is_batch = true;
        self.batch_collection_expr = collection_expr.into();
        self
    }

    /// The action template for the given outcome (may be empty)
    pub fn action_template(&self, success: bool) -> &str {
        if success {
            &self.success_template
        } else {
            &self.fail_template
        }
    }

    /// Whether the operator comes from the identity collaborator
    pub fn uses_external_operator(&self) -> bool {
        self.operator_expr.trim().is_empty()
    }

    /// Whether records of this spec describe an update
    pub fn is_update(&self) -> bool {
        self.action_type.eq_ignore_ascii_case("UPDATE")
    }

    /// Validate the declaration
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        if self.success_template.trim().is_empty() && self.fail_template.trim().is_empty() {
            return Err(SpecValidationError::NoTemplate);
        }

        if self.is_batch && self.batch_collection_expr.trim().is_empty() {
            return Err(SpecValidationError::MissingBatchCollection);
        }

        Ok(())
    }
}

/// Validation errors for operation specs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecValidationError {
    NoTemplate,
    MissingBatchCollection,
}

impl fmt::Display for SpecValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTemplate => write!(
                f,
                "one of 'success_template' and 'fail_template' must be set"
            ),
            Self::MissingBatchCollection => {
                write!(f, "batch operations require 'batch_collection_expr'")
            }
        }
    }
}

impl std::error::Error for SpecValidationError {}

/// The validated operations declared on one method
///
/// Only constructible through [`OperationSet::new`], so every set handed to
/// the runtime has passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSet {
    specs: Vec<OperationSpec>,
}

impl OperationSet {
    /// Validate `specs` for `method`
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the method and the first invalid
    /// operation.
    pub fn new(method: &MethodId, specs: Vec<OperationSpec>) -> BizlogResult<Self> {
        for (index, spec) in specs.iter().enumerate() {
            spec.validate().map_err(|e| {
                BizlogError::Config(format!(
                    "Invalid operation #{} on '{}': {}",
                    index + 1,
                    method,
                    e
                ))
            })?;
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[OperationSpec] {
        &self.specs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = &'a OperationSpec;
    type IntoIter = std::slice::Iter<'a, OperationSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_id_display_and_parse() {
        let id = MethodId::new("OrderService", "create");
        assert_eq!(id.to_string(), "OrderService::create");

        let parsed: MethodId = "shop::OrderService::create".parse().unwrap();
        assert_eq!(parsed.declaring_type, "shop::OrderService");
        assert_eq!(parsed.method_name, "create");

        assert!("create".parse::<MethodId>().is_err());
        assert!("Type::".parse::<MethodId>().is_err());
    }

    #[test]
    fn test_no_template_rejected() {
        let spec = OperationSpec::new("ORDER", "{{#order.id}}", "");
        assert_eq!(spec.validate(), Err(SpecValidationError::NoTemplate));

        let spec = spec.with_fail_template("   ");
        assert_eq!(spec.validate(), Err(SpecValidationError::NoTemplate));
    }

    #[test]
    fn test_fail_template_alone_is_valid() {
        let spec = OperationSpec::new("ORDER", "{{#order.id}}", "")
            .with_fail_template("failed: {{#_errorMsg}}");
        assert!(spec.validate().is_ok());
        assert_eq!(spec.action_template(true), "");
        assert_eq!(spec.action_template(false), "failed: {{#_errorMsg}}");
    }

    #[test]
    fn test_batch_requires_collection() {
        let spec = OperationSpec::new("ORDER", "{{#_item.id}}", "created").batch_over("");
        assert_eq!(
            spec.validate(),
            Err(SpecValidationError::MissingBatchCollection)
        );
    }

    #[test]
    fn test_operator_source() {
        let spec = OperationSpec::new("ORDER", "1", "ok");
        assert!(spec.uses_external_operator());
        assert!(!spec.with_operator("{{#user.id}}").uses_external_operator());
    }

    #[test]
    fn test_update_detection() {
        let spec = OperationSpec::new("ORDER", "1", "ok").with_action_type("update");
        assert!(spec.is_update());
        assert!(!OperationSpec::new("ORDER", "1", "ok").is_update());
    }

    #[test]
    fn test_operation_set_rejects_invalid_spec() {
        let method = MethodId::new("OrderService", "create");
        let specs = vec![
            OperationSpec::new("ORDER", "1", "ok"),
            OperationSpec::new("ORDER", "1", ""),
        ];
        let err = OperationSet::new(&method, specs).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("#2 on 'OrderService::create'"));
    }

    #[test]
    fn test_operation_set_keeps_order() {
        let method = MethodId::new("OrderService", "create");
        let set = OperationSet::new(
            &method,
            vec![
                OperationSpec::new("A", "1", "first"),
                OperationSpec::new("B", "2", "second"),
            ],
        )
        .unwrap();
        let types: Vec<&str> = set.iter().map(|s| s.operation_type.as_str()).collect();
        assert_eq!(types, vec!["A", "B"]);
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = "success_template: created\nbiz_no_expr: '{{#order.id}}'\n";
        let spec: OperationSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.success_template, "created");
        assert!(spec.fail_template.is_empty());
        assert!(!spec.is_batch);
    }
}
