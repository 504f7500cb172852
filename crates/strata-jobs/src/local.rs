//! Local backend: jobs run synchronously through the shell

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use strata_config::JobSettings;

use crate::backend::JobBackend;
use crate::error::{JobError, JobResult};
use crate::job::{JobId, JobRequest, JobState};

/// Backend that runs every job in-process via `sh -c`
///
/// Submission blocks until the command finishes, so the first poll of
/// a non-held job already observes a terminal state. Held jobs run
/// when released. A job whose prerequisites have not all succeeded by
/// the time it would run is failed without running its command.
pub struct LocalBackend {
    /// Directory for per-job output files, one `{name}.out` per job
    output_dir: Option<PathBuf>,
    jobs: BTreeMap<JobId, LocalJob>,
    counter: usize,
}

struct LocalJob {
    request: JobRequest,
    state: JobState,
}

impl LocalBackend {
    /// Create a local backend from job settings
    pub fn new(settings: &JobSettings) -> Self {
        LocalBackend {
            output_dir: settings.output_dir.clone(),
            jobs: BTreeMap::new(),
            counter: 0,
        }
    }

    /// Run a stored job to completion and record its terminal state
    fn run(&mut self, id: &JobId) -> JobResult<()> {
        let job = self
            .jobs
            .get(id)
            .ok_or_else(|| JobError::UnknownJob(id.clone()))?;

        // Jobs run in submission order, so every prerequisite is
        // already terminal here.
        let eligible = job.request.prerequisites.iter().all(|prereq| {
            self.jobs
                .get(prereq)
                .is_some_and(|p| p.state == JobState::Succeeded)
        });
        if !eligible {
            debug!(
                "{}: prerequisite did not succeed, failing without running",
                job.request.name
            );
            if let Some(job) = self.jobs.get_mut(id) {
                job.state = JobState::Failed;
            }
            return Ok(());
        }

        let name = job.request.name.clone();
        let command = job.request.command.clone();
        let output = match Command::new("sh").arg("-c").arg(&command).output() {
            Ok(output) => output,
            Err(err) => {
                if let Some(job) = self.jobs.get_mut(id) {
                    job.state = JobState::Failed;
                }
                return Err(JobError::Io(err));
            }
        };

        let state = if output.status.success() {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
        debug!(
            "{} exited with {}: {}",
            name,
            output.status.code().unwrap_or(1),
            state
        );

        if let Some(dir) = &self.output_dir {
            fs::create_dir_all(dir)?;
            let mut log = String::from_utf8_lossy(&output.stdout).to_string();
            log.push_str(&String::from_utf8_lossy(&output.stderr));
            fs::write(dir.join(format!("{name}.out")), log)?;
        }

        if let Some(job) = self.jobs.get_mut(id) {
            job.state = state;
        }
        Ok(())
    }
}

impl JobBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn submit(&mut self, request: &JobRequest) -> JobResult<JobId> {
        self.counter += 1;
        let id = JobId::new(format!("local.{}", self.counter));
        let state = if request.hold {
            JobState::Held
        } else {
            JobState::Pending
        };
        self.jobs.insert(
            id.clone(),
            LocalJob {
                request: request.clone(),
                state,
            },
        );
        if !request.hold {
            self.run(&id)?;
        }
        Ok(id)
    }

    fn poll(&mut self, id: &JobId) -> JobResult<JobState> {
        self.jobs
            .get(id)
            .map(|job| job.state)
            .ok_or_else(|| JobError::UnknownJob(id.clone()))
    }

    fn release(&mut self, id: &JobId) -> JobResult<()> {
        match self.jobs.get(id) {
            Some(job) if job.state == JobState::Held => self.run(id),
            Some(_) => Ok(()),
            None => Err(JobError::UnknownJob(id.clone())),
        }
    }

    fn cancel(&mut self, id: &JobId) -> JobResult<()> {
        let job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| JobError::UnknownJob(id.clone()))?;
        if !job.state.is_terminal() {
            job.state = JobState::Failed;
        }
        Ok(())
    }
}
