//! Persistence collaborators for assembled records

use std::sync::{Arc, Mutex};

use super::record::AuditRecord;
use crate::error::{BizlogError, BizlogResult};

/// Destination for assembled audit records
pub trait RecordSink: Send + Sync {
    /// Persist a single record
    fn record(&self, record: AuditRecord) -> BizlogResult<()>;

    /// Persist the records of one batch operation, in order
    fn batch_record(&self, records: Vec<AuditRecord>) -> BizlogResult<()> {
        for record in records {
            self.record(record)?;
        }
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    fn record(&self, record: AuditRecord) -> BizlogResult<()> {
        (**self).record(record)
    }

    fn batch_record(&self, records: Vec<AuditRecord>) -> BizlogResult<()> {
        (**self).batch_record(records)
    }
}

/// In-memory sink, mostly useful for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl RecordSink for MemorySink {
    fn record(&self, record: AuditRecord) -> BizlogResult<()> {
        self.records
            .lock()
            .map_err(|_| BizlogError::Sink("Memory sink lock poisoned".into()))?
            .push(record);
        Ok(())
    }

    fn batch_record(&self, records: Vec<AuditRecord>) -> BizlogResult<()> {
        self.records
            .lock()
            .map_err(|_| BizlogError::Sink("Memory sink lock poisoned".into()))?
            .extend(records);
        Ok(())
    }
}
