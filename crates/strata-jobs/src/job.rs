//! Job identity, state machine, and submission records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned job identifier
///
/// Opaque to the orchestrator: the only operations are equality,
/// ordering, and display.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Wrap a backend identifier
    pub fn new(id: impl Into<String>) -> Self {
        JobId(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of one job
///
/// Jobs move `Pending` (or `Held`) to `Running` to one of the two
/// terminal states. A held job stays `Held` until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted by the backend, waiting to run
    Pending,
    /// Accepted but blocked until explicitly released
    Held,
    /// Currently executing
    Running,
    /// Finished with a zero exit status
    Succeeded,
    /// Finished with a non-zero exit status, was cancelled, or never
    /// became runnable
    Failed,
}

impl JobState {
    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Get state name
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Held => "held",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resources requested for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResources {
    /// Cores per job
    pub cores: usize,
    /// Wall-clock limit in hours
    pub max_walltime_hours: u64,
}

impl JobResources {
    /// Create a resource request
    pub fn new(cores: usize, max_walltime_hours: u64) -> Self {
        JobResources {
            cores,
            max_walltime_hours,
        }
    }

    /// Wall-clock limit in minutes, as most queue systems want it
    pub fn walltime_minutes(&self) -> u64 {
        self.max_walltime_hours * 60
    }
}

impl Default for JobResources {
    fn default() -> Self {
        JobResources {
            cores: 1,
            max_walltime_hours: 24,
        }
    }
}

/// A submission request handed to a backend
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Job name, the target label
    pub name: String,
    /// Shell command the job runs
    pub command: String,
    /// Requested resources
    pub resources: JobResources,
    /// Jobs that must succeed before this one may start
    pub prerequisites: Vec<JobId>,
    /// Submit in the held state; the orchestrator releases the job
    /// once its prerequisites have succeeded and the concurrency
    /// budget allows
    pub hold: bool,
}

/// One job tracked by the orchestrator
#[derive(Debug, Clone)]
pub struct Job {
    /// Backend identifier
    pub id: JobId,
    /// Module name of the target this job builds
    pub module: String,
    /// Job name, the target label
    pub name: String,
    /// Last observed state
    pub state: JobState,
    /// Prerequisite job ids
    pub prerequisites: Vec<JobId>,
    /// When the job was submitted
    pub submitted_at: DateTime<Utc>,
    /// When a terminal state was first observed
    pub finished_at: Option<DateTime<Utc>>,
}
