//! Job capability set seen by the worker.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{HandleState, MessageId, Payload, Settlement};
use crate::error::JobError;

/// A leased job.
/// The worker owns it and must finalize it with exactly one of `delete` or `release`.
///
/// Design intent:
/// - Implementations own the remote side effects of finalizing.
/// - The worker only reads attempts / payload and picks the finalize call.
#[async_trait]
pub trait Job: Send + Sync {
    fn job_id(&self) -> &MessageId;

    fn raw_body(&self) -> &str;

    /// Decoded payload.
    fn payload(&self) -> Result<Payload, JobError> {
        Payload::parse(self.raw_body())
    }

    /// Number of times the job has been attempted (1 on first delivery).
    fn attempts(&self) -> Result<u64, JobError> {
        Ok(self.payload()?.attempts())
    }

    fn queue_name(&self) -> Result<String, JobError> {
        Ok(self.payload()?.queue()?.to_string())
    }

    /// Handler name from the payload's `job` field.
    fn name(&self) -> Result<Option<String>, JobError> {
        Ok(self.payload()?.job().map(str::to_string))
    }

    fn settlement(&self) -> Settlement;

    fn state(&self) -> HandleState {
        self.settlement().state()
    }

    fn is_deleted(&self) -> bool {
        self.settlement().is_deleted()
    }

    fn is_released(&self) -> bool {
        self.settlement().is_released()
    }

    fn is_deleted_or_released(&self) -> bool {
        self.settlement().is_deleted_or_released()
    }

    /// Acknowledge the job.
    async fn delete(&mut self) -> Result<(), JobError>;

    /// Put the job back with `attempts + 1`, visible again after `delay`.
    async fn release(&mut self, delay: Duration) -> Result<(), JobError>;
}
