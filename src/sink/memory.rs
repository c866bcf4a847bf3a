//! In-memory sink for testing and single-process use
//!
//! Records are kept in insertion order behind a `tokio::sync::RwLock`
//! and lost on drop.

use crate::error::{AuditError, Result};
use crate::sink::AuditSink;
use crate::types::AuditRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Memory sink configuration
#[derive(Debug, Clone)]
pub struct MemorySinkConfig {
    /// Maximum records kept; the oldest are dropped beyond this
    pub max_records: usize,

    /// Reject records whose required details are missing
    ///
    /// Validation is advisory in the core; this is the sink opting in.
    pub reject_invalid: bool,
}

impl Default for MemorySinkConfig {
    fn default() -> Self {
        Self {
            max_records: 100_000,
            reject_invalid: false,
        }
    }
}

/// In-memory audit sink
pub struct MemorySink {
    records: Arc<RwLock<VecDeque<AuditRecord>>>,
    config: MemorySinkConfig,
}

impl MemorySink {
    /// Create a sink with the given configuration
    pub fn new(config: MemorySinkConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::new())),
            config,
        }
    }

    /// All stored records, oldest first
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(MemorySinkConfig::default())
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn save(&self, mut record: AuditRecord) -> Result<AuditRecord> {
        if self.config.reject_invalid {
            if let Err(e) = record.validate() {
                tracing::warn!(event_type = %record.event_type, error = %e, "Memory sink rejected record");
                return Err(AuditError::Persistence(e.to_string()));
            }
        }

        record.id = Some(format!("aud-{}", uuid::Uuid::new_v4()));
        record.created_at = Some(Utc::now());

        let mut records = self.records.write().await;
        records.push_back(record.clone());
        while records.len() > self.config.max_records {
            records.pop_front();
        }
        Ok(record)
    }

    async fn history(
        &self,
        object_type: &str,
        object_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| {
                r.object_type.as_deref() == Some(object_type)
                    && r.object_id.as_deref() == Some(object_id)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
