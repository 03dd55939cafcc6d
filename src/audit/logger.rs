//! Append-only JSON-lines record log
//!
//! Provides `JsonlRecordSink`, which writes audit records to a log file.
//! Each record is written as a single JSON line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{BizlogError, BizlogResult};

use super::record::AuditRecord;
use super::sink::RecordSink;

/// Writes audit records to a JSONL file
///
/// Every line is a complete JSON object representing one record.
#[derive(Debug, Clone)]
pub struct JsonlRecordSink {
    log_path: PathBuf,
}

impl JsonlRecordSink {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append a record to the log
    pub fn log(&self, record: &AuditRecord) -> BizlogResult<()> {
        self.append(std::slice::from_ref(record))
    }

    /// Append several records with a single flush
    pub fn log_batch(&self, records: &[AuditRecord]) -> BizlogResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.append(records)
    }

    fn append(&self, records: &[AuditRecord]) -> BizlogResult<()> {
        let mut buffer = String::new();
        for record in records {
            let json = serde_json::to_string(record)
                .map_err(|e| BizlogError::Json(format!("Failed to serialize audit record: {}", e)))?;
            buffer.push_str(&json);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BizlogError::Io(format!("Failed to open audit log: {}", e)))?;

        // one write per call keeps lines from concurrent writers intact
        file.write_all(buffer.as_bytes())
            .map_err(|e| BizlogError::Io(format!("Failed to write audit record: {}", e)))?;

        file.flush()
            .map_err(|e| BizlogError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all records, oldest first
    pub fn read_all(&self) -> BizlogResult<Vec<AuditRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BizlogError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                BizlogError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: AuditRecord = serde_json::from_str(&line).map_err(|e| {
                BizlogError::Json(format!(
                    "Failed to parse audit record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            records.push(record);
        }

        Ok(records)
    }

    /// Read the most recent `count` records
    pub fn read_recent(&self, count: usize) -> BizlogResult<Vec<AuditRecord>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all[start..].to_vec())
    }

    /// Number of records in the log
    pub fn entry_count(&self) -> BizlogResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BizlogError::Io(format!("Failed to open audit log: {}", e)))?;

        let count = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }

    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

impl RecordSink for JsonlRecordSink {
    fn record(&self, record: AuditRecord) -> BizlogResult<()> {
        self.log(&record)
    }

    fn batch_record(&self, records: Vec<AuditRecord>) -> BizlogResult<()> {
        self.log_batch(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MethodId, RecordId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_sink() -> (JsonlRecordSink, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonlRecordSink::new(temp_dir.path().join("audit.log"));
        (sink, temp_dir)
    }

    fn create_test_record(biz_no: &str) -> AuditRecord {
        AuditRecord {
            id: RecordId::new(),
            kind: "ORDER".into(),
            biz_no: biz_no.into(),
            sub_biz_no: None,
            operator: "alice".into(),
            extra: Some("web".into()),
            action: format!("created order {}", biz_no),
            detail: None,
            action_type: Some("CREATE".into()),
            fail: false,
            created_at: Utc::now(),
            location: MethodId::new("OrderService", "create"),
        }
    }

    #[test]
    fn test_log_and_read() {
        let (sink, _temp) = create_test_sink();
        let record = create_test_record("42");

        sink.log(&record).unwrap();

        let records = sink.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_log_batch_and_count() {
        let (sink, _temp) = create_test_sink();
        let records: Vec<AuditRecord> = (0..3).map(|i| create_test_record(&i.to_string())).collect();

        sink.log_batch(&records).unwrap();
        sink.log_batch(&[]).unwrap();

        assert_eq!(sink.entry_count().unwrap(), 3);
        assert_eq!(sink.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_read_recent() {
        let (sink, _temp) = create_test_sink();
        for i in 0..10 {
            sink.record(create_test_record(&i.to_string())).unwrap();
        }

        let recent = sink.read_recent(3).unwrap();
        let biz: Vec<&str> = recent.iter().map(|r| r.biz_no.as_str()).collect();
        assert_eq!(biz, vec!["7", "8", "9"]);
    }

    #[test]
    fn test_empty_log() {
        let (sink, _temp) = create_test_sink();

        assert!(!sink.exists());
        assert_eq!(sink.entry_count().unwrap(), 0);
        assert!(sink.read_all().unwrap().is_empty());
        assert!(sink.read_recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_reports_position() {
        let (sink, _temp) = create_test_sink();
        sink.log(&create_test_record("1")).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(sink.path())
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();

        let err = sink.read_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
