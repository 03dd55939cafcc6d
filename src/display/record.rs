//! Audit record display formatting
//!
//! Formats audit records for terminal output in table and detail views.

use crate::audit::AuditRecord;

const ACTION_WIDTH: usize = 48;

/// Format a list of records as a table
pub fn format_record_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let type_width = column_width(records, "Type", |r| r.kind.len());
    let biz_width = column_width(records, "Biz No", |r| r.biz_no.len());
    let operator_width = column_width(records, "Operator", |r| r.operator.len());

    let mut output = String::new();
    output.push_str(&format!(
        "{:<19}  {:<type_width$}  {:<biz_width$}  {:<operator_width$}  {:<6}  {}\n",
        "Time",
        "Type",
        "Biz No",
        "Operator",
        "Status",
        "Action",
        type_width = type_width,
        biz_width = biz_width,
        operator_width = operator_width,
    ));

    output.push_str(&format!(
        "{:-<19}  {:-<type_width$}  {:-<biz_width$}  {:-<operator_width$}  {:-<6}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        type_width = type_width,
        biz_width = biz_width,
        operator_width = operator_width,
    ));

    for record in records {
        output.push_str(&format!(
            "{:<19}  {:<type_width$}  {:<biz_width$}  {:<operator_width$}  {:<6}  {}\n",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.kind,
            record.biz_no,
            record.operator,
            if record.fail { "FAIL" } else { "OK" },
            truncate(&record.action, ACTION_WIDTH),
            type_width = type_width,
            biz_width = biz_width,
            operator_width = operator_width,
        ));
    }

    output
}

/// Format a single record's details
pub fn format_record_details(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Record: {}\n", record.id));
    output.push_str(&format!("  Type:        {}\n", record.kind));
    output.push_str(&format!("  Biz No:      {}\n", record.biz_no));
    if let Some(sub) = &record.sub_biz_no {
        output.push_str(&format!("  Sub Biz No:  {}\n", sub));
    }
    output.push_str(&format!("  Operator:    {}\n", record.operator));
    output.push_str(&format!(
        "  Status:      {}\n",
        if record.fail { "Failed" } else { "Succeeded" }
    ));
    if let Some(action_type) = &record.action_type {
        output.push_str(&format!("  Action Type: {}\n", action_type));
    }
    output.push_str(&format!("  Location:    {}\n", record.location));
    output.push_str(&format!(
        "  Created:     {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push('\n');
    output.push_str(&format!("  Action: {}\n", record.action));

    if let Some(detail) = &record.detail {
        output.push_str(&format!("  Detail: {}\n", detail));
    }
    if let Some(extra) = &record.extra {
        output.push_str(&format!("  Extra:  {}\n", extra));
    }

    output
}

fn column_width(records: &[AuditRecord], header: &str, width: impl Fn(&AuditRecord) -> usize) -> usize {
    records
        .iter()
        .map(width)
        .max()
        .unwrap_or(header.len())
        .max(header.len())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
