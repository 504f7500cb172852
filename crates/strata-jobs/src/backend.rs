//! Backend seam between the orchestrator and batch execution

use strata_config::JobSettings;

use crate::error::{JobError, JobResult};
use crate::job::{JobId, JobRequest, JobState};
use crate::local::LocalBackend;

/// A batch execution substrate jobs are submitted to
///
/// The orchestrator drives a backend from a single thread, so
/// implementations need no internal locking. A job must never start
/// before every prerequisite named at submission has succeeded; how
/// that is enforced is up to the backend. A backend may fail or
/// cancel the dependents of a failed job on its own, the orchestrator
/// handles the ones it does not.
pub trait JobBackend {
    /// Registered backend name, as referenced by configuration
    fn name(&self) -> &str;

    /// Submit a job, returning its backend identifier
    fn submit(&mut self, request: &JobRequest) -> JobResult<JobId>;

    /// Current state of a previously submitted job, without blocking
    fn poll(&mut self, id: &JobId) -> JobResult<JobState>;

    /// Release a job that was submitted held
    fn release(&mut self, _id: &JobId) -> JobResult<()> {
        Ok(())
    }

    /// Best-effort cancellation; the job must still poll as terminal
    /// afterwards
    fn cancel(&mut self, _id: &JobId) -> JobResult<()> {
        Ok(())
    }

    /// Whether the backend bounds the number of running jobs itself
    ///
    /// When false, the orchestrator submits jobs held and releases
    /// them within its own concurrency budget.
    fn manages_admission(&self) -> bool {
        true
    }
}

/// Construct the backend named by `settings.backend`
pub fn backend_by_name(settings: &JobSettings) -> JobResult<Box<dyn JobBackend>> {
    match settings.backend.as_str() {
        "local" => Ok(Box::new(LocalBackend::new(settings))),
        other => Err(JobError::UnknownBackend(other.to_string())),
    }
}
