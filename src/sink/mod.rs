//! Persistence sink trait — where finished audit records go
//!
//! Storage is owned by the integrating application. The core hands each
//! finished record to an `AuditSink` in a single call and treats that call
//! as atomic: it either returns the stored record or fails.

use crate::error::Result;
use crate::types::AuditRecord;
use async_trait::async_trait;

pub mod memory;

/// Core trait for audit record storage backends
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Store a finished record, returning it with `id` and `createdAt` assigned
    ///
    /// Failures should be reported as `AuditError::Persistence`; the core
    /// propagates them to the caller of `trace` without retrying.
    async fn save(&self, record: AuditRecord) -> Result<AuditRecord>;

    /// Records about one object, newest first
    async fn history(
        &self,
        object_type: &str,
        object_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditRecord>>;

    /// Sink name (e.g., "memory", "postgres")
    fn name(&self) -> &str;
}
