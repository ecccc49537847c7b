use thiserror::Error;

use crate::domain::{HandleState, MessageId};
use crate::ports::RemoteError;

/// Errors raised by the job lifecycle (`Job` / `JobHandle`).
#[derive(Debug, Error)]
pub enum JobError {
    /// The body is not a JSON object, or a field required by the operation is missing.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Pull-mode release deleted the reservation but could not publish the replacement.
    /// The job is neither reserved nor requeued.
    #[error("message {message_id} on queue {queue} was deleted but could not be recreated: {source}")]
    Inconsistent {
        message_id: MessageId,
        queue: String,
        #[source]
        source: RemoteError,
    },

    #[error("job already finalized (state={state:?})")]
    AlreadyFinalized { state: HandleState },
}

impl JobError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Did this error possibly lose the job?
    pub fn is_job_lost(&self) -> bool {
        matches!(self, Self::Inconsistent { .. })
    }
}

/// Errors raised while resolving or running a handler.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("handler not found for job={0}")]
    HandlerNotFound(String),

    #[error("duplicate handler for job={0}")]
    DuplicateHandler(String),

    #[error("{0}")]
    Failed(String),
}

impl From<String> for RuntimeError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for RuntimeError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
