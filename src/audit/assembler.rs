//! Record assembly
//!
//! Turns resolved template values into `AuditRecord`s, applying the
//! condition gate, operator precedence, the empty-action rule, and
//! suppression of no-op updates.

use chrono::{DateTime, Utc};

use super::record::AuditRecord;
use super::resolver::{BatchValues, ResolvedValues};
use crate::diff::NO_DIFF_MARKER;
use crate::error::{BizlogError, BizlogResult};
use crate::models::{MethodId, OperationSpec, RecordId};

/// Builds records for operations declared on one method
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    location: MethodId,
}

impl RecordAssembler {
    pub fn new(location: MethodId) -> Self {
        Self { location }
    }

    /// Assemble the record of a single-mode operation
    ///
    /// Returns `Ok(None)` when the record is intentionally dropped.
    pub fn assemble(
        &self,
        spec: &OperationSpec,
        resolved: &ResolvedValues,
        success: bool,
        external_operator: Option<&str>,
    ) -> BizlogResult<Option<AuditRecord>> {
        self.build(
            spec,
            |template| resolved.get(template),
            success,
            external_operator,
            Utc::now(),
        )
    }

    /// Assemble one record per batch element, preserving source order
    pub fn assemble_batch(
        &self,
        spec: &OperationSpec,
        values: &BatchValues,
        success: bool,
        external_operator: Option<&str>,
    ) -> BizlogResult<Vec<AuditRecord>> {
        let mut records = Vec::with_capacity(values.len());
        let mut last = Utc::now();

        for index in 0..values.len() {
            let created_at = Utc::now().max(last);
            let record = self.build(
                spec,
                |template| values.get(template, index),
                success,
                external_operator,
                created_at,
            )?;
            if let Some(record) = record {
                last = record.created_at;
                records.push(record);
            }
        }

        Ok(records)
    }

    fn build<'v>(
        &self,
        spec: &OperationSpec,
        value: impl Fn(&str) -> Option<&'v str>,
        success: bool,
        external_operator: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> BizlogResult<Option<AuditRecord>> {
        if !spec.condition_expr.trim().is_empty()
            && !condition_passed(value(spec.condition_expr.as_str()).unwrap_or_default())
        {
            return Ok(None);
        }

        let operator = self.operator(spec, value(spec.operator_expr.as_str()), external_operator)?;

        let Some(action) = non_empty(value(spec.action_template(success))) else {
            return Ok(None);
        };

        let detail = value(spec.detail_expr.as_str());
        if spec.is_update() && detail.is_some_and(is_no_op_update) {
            return Ok(None);
        }

        Ok(Some(AuditRecord {
            id: RecordId::new(),
            kind: value(spec.operation_type.as_str()).unwrap_or_default().to_string(),
            biz_no: value(spec.biz_no_expr.as_str()).unwrap_or_default().to_string(),
            sub_biz_no: non_empty(value(spec.sub_biz_no_expr.as_str())),
            operator,
            extra: non_empty(value(spec.extra_expr.as_str())),
            action,
            detail: non_empty(detail.filter(|d| *d != NO_DIFF_MARKER)),
            action_type: non_empty(Some(spec.action_type.as_str())),
            fail: !success,
            created_at,
            location: self.location.clone(),
        }))
    }

    /// An identity from the collaborator wins over the declared expression
    fn operator(
        &self,
        spec: &OperationSpec,
        resolved: Option<&str>,
        external: Option<&str>,
    ) -> BizlogResult<String> {
        if let Some(external) = external.filter(|op| !op.trim().is_empty()) {
            return Ok(external.to_string());
        }
        if spec.uses_external_operator() {
            return Err(BizlogError::missing_operator(self.location.to_string()));
        }
        Ok(resolved.unwrap_or_default().to_string())
    }
}

/// Condition text passes when it ends with "true", ignoring case
pub fn condition_passed(text: &str) -> bool {
    text.to_ascii_lowercase().ends_with("true")
}

/// Detail text of an update that changed nothing
pub fn is_no_op_update(detail: &str) -> bool {
    detail.contains(NO_DIFF_MARKER)
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(str::to_string)
}
