//! Job submission and supervision error types

use thiserror::Error;

use crate::job::JobId;
use crate::orchestrator::BuildReport;

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;

/// Errors from the job layer
#[derive(Debug, Error)]
pub enum JobError {
    /// One or more jobs of a plan reached the failed state
    #[error("{count} jobs failed: {names}")]
    JobsFailed {
        /// Number of failed jobs
        count: usize,
        /// Comma-separated failed target labels, in plan order
        names: String,
        /// Full per-target outcome, including the failures
        report: BuildReport,
    },

    /// No backend is registered under the configured name
    #[error("Unknown job backend: {0}")]
    UnknownBackend(String),

    /// A job id the backend has no record of
    #[error("Unknown job id: {0}")]
    UnknownJob(JobId),

    /// A target names a build handler that was never registered
    #[error("No build handler '{handler}' registered for {module}")]
    UnknownHandler { handler: String, module: String },

    /// The backend refused a submission
    #[error("Backend {backend} rejected submission of {name}: {reason}")]
    SubmitRejected {
        backend: String,
        name: String,
        reason: String,
    },

    /// Supervision gave up before every job reached a terminal state
    #[error("Gave up polling after {elapsed_secs}s with {pending} jobs outstanding")]
    PollTimeout { elapsed_secs: u64, pending: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Create an unknown-handler error
    pub fn unknown_handler(handler: impl Into<String>, module: impl Into<String>) -> Self {
        JobError::UnknownHandler {
            handler: handler.into(),
            module: module.into(),
        }
    }

    /// Create a submission-rejected error
    pub fn submit_rejected(
        backend: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        JobError::SubmitRejected {
            backend: backend.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }
}
