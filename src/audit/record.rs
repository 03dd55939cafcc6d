//! Audit record data structure
//!
//! An `AuditRecord` is the immutable product of one logged operation: who did
//! what to which business object, whether it worked, and where in the code it
//! happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MethodId, RecordId};

/// One persisted business operation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: RecordId,

    /// Business module / operation type
    #[serde(rename = "type")]
    pub kind: String,

    /// Business key of the affected object
    pub biz_no: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_biz_no: Option<String>,

    /// Who performed the operation
    pub operator: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,

    /// Rendered success or fail text
    pub action: String,

    /// Rendered detail, usually a field-level diff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,

    /// True when the business call failed
    pub fail: bool,

    /// When the record was assembled (UTC)
    pub created_at: DateTime<Utc>,

    /// Code location of the audited operation
    pub location: MethodId,
}

impl AuditRecord {
    pub fn is_success(&self) -> bool {
        !self.fail
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} by {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if self.fail { "FAIL" } else { "OK" },
            self.kind,
            self.biz_no,
            self.operator
        );

        if let Some(sub) = &self.sub_biz_no {
            output.push_str(&format!(" ({})", sub));
        }

        output.push_str(&format!("\n  {}", self.action));

        if let Some(detail) = &self.detail {
            output.push_str(&format!("\n  Changes: {}", detail));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AuditRecord {
        AuditRecord {
            id: RecordId::new(),
            kind: "ORDER".into(),
            biz_no: "42".into(),
            sub_biz_no: None,
            operator: "alice".into(),
            extra: None,
            action: "created order 42".into(),
            detail: Some("[Title] added: [Lamp]".into()),
            action_type: None,
            fail: false,
            created_at: Utc::now(),
            location: MethodId::new("OrderService", "create"),
        }
    }

    #[test]
    fn test_serialization_uses_type_key() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["type"], "ORDER");
        assert!(json.get("kind").is_none());
        assert!(json.get("sub_biz_no").is_none());
        assert_eq!(json["location"]["method_name"], "create");
    }

    #[test]
    fn test_round_trip() {
        let original = record();
        let text = serde_json::to_string(&original).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_human_readable_format() {
        let mut rec = record();
        rec.sub_biz_no = Some("line-1".into());
        let formatted = rec.format_human_readable();
        assert!(formatted.contains("OK ORDER 42 by alice (line-1)"));
        assert!(formatted.contains("created order 42"));
        assert!(formatted.contains("Changes: [Title] added: [Lamp]"));

        rec.fail = true;
        assert!(!rec.is_success());
        assert!(rec.format_human_readable().contains("FAIL"));
    }
}
