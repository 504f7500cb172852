//! Plan orchestration: submit every target as a job, supervise until done

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use strata_config::JobSettings;
use strata_resolver::{BuildPlan, BuildTarget};

use crate::backend::JobBackend;
use crate::command::CommandRegistry;
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobId, JobRequest, JobResources, JobState};

/// Per-target outcome of one orchestrated plan
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Terminal (or last observed) state per module name
    pub states: BTreeMap<String, JobState>,
    /// Submitted jobs with their ids and timestamps, in plan order
    pub jobs: Vec<Job>,
    /// External modules present in the plan; never built
    pub external: Vec<String>,
}

impl BuildReport {
    /// Number of targets that reached the succeeded state
    pub fn succeeded(&self) -> usize {
        self.states
            .values()
            .filter(|state| **state == JobState::Succeeded)
            .count()
    }

    /// Module names of the targets that failed, in module order
    pub fn failed_modules(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, state)| **state == JobState::Failed)
            .map(|(module, _)| module.as_str())
            .collect()
    }

    /// Whether every target succeeded
    pub fn is_success(&self) -> bool {
        self.states.values().all(|state| *state == JobState::Succeeded)
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} external",
            self.succeeded(),
            self.failed_modules().len(),
            self.external.len()
        )
    }
}

/// Submits a build plan to a backend and supervises it to completion
///
/// Every non-external plan target becomes exactly one job, wired with
/// the job ids of its direct dependencies as prerequisites. Failures
/// are isolated: a failed submission or build fails that target and
/// the targets depending on it, while everything else keeps going.
pub struct Orchestrator<'a> {
    backend: &'a mut dyn JobBackend,
    commands: CommandRegistry,
    settings: JobSettings,
    prepare: Option<Box<dyn Fn(&BuildTarget) -> JobResult<()>>>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator over a backend
    ///
    /// The command registry starts with the settings' command template
    /// as the default shell handler.
    pub fn new(backend: &'a mut dyn JobBackend, settings: JobSettings) -> Self {
        let commands = CommandRegistry::with_default(&settings.command_template);
        Orchestrator {
            backend,
            commands,
            settings,
            prepare: None,
        }
    }

    /// Replace the command registry
    pub fn with_commands(mut self, commands: CommandRegistry) -> Self {
        self.commands = commands;
        self
    }

    /// Set a side effect to run for each target right before its
    /// submission, such as pre-creating install directories
    pub fn with_prepare(
        mut self,
        prepare: impl Fn(&BuildTarget) -> JobResult<()> + 'static,
    ) -> Self {
        self.prepare = Some(Box::new(prepare));
        self
    }

    /// Run a plan to completion
    ///
    /// Submits one job per target in plan order, then polls until all
    /// jobs are terminal. Returns the report, or `JobsFailed` carrying
    /// the report when any target failed.
    pub fn run(mut self, plan: BuildPlan) -> JobResult<BuildReport> {
        let started = Instant::now();
        // Backends that admit everything at once get their jobs held
        // and released within the configured budget.
        let hold_all =
            !self.backend.manages_admission() && self.settings.max_concurrent.is_some();
        let resources =
            JobResources::new(self.settings.cores, self.settings.max_walltime_hours);

        let mut jobs: Vec<Job> = Vec::new();
        let mut by_module: BTreeMap<String, usize> = BTreeMap::new();
        let mut states: BTreeMap<String, JobState> = BTreeMap::new();
        let mut external: Vec<String> = Vec::new();

        info!(
            "submitting {} targets to backend {}",
            plan.len(),
            self.backend.name()
        );

        for target in plan.targets() {
            if target.external {
                debug!("{}: external module, nothing to build", target.module);
                external.push(target.module.clone());
                continue;
            }
            if let Some(dep) = target
                .dependencies
                .iter()
                .find(|dep| states.get(&dep.module) == Some(&JobState::Failed))
            {
                warn!(
                    "{}: prerequisite {} failed, not submitting",
                    target.label, dep.module
                );
                states.insert(target.module.clone(), JobState::Failed);
                continue;
            }
            let command = match self.commands.command_for(target) {
                Ok(command) => command,
                Err(err) => {
                    warn!("{}: {}", target.label, err);
                    states.insert(target.module.clone(), JobState::Failed);
                    continue;
                }
            };
            if self.settings.pre_create_install_dirs {
                if let Some(prepare) = &self.prepare {
                    if let Err(err) = prepare(target) {
                        warn!("{}: preparation failed: {}", target.label, err);
                        states.insert(target.module.clone(), JobState::Failed);
                        continue;
                    }
                }
            }
            // Dependencies without a submitted job, such as installed
            // modules pruned from the plan, contribute no prerequisite.
            let prerequisites: Vec<JobId> = target
                .dependencies
                .iter()
                .filter_map(|dep| by_module.get(&dep.module))
                .map(|&index| jobs[index].id.clone())
                .collect();
            let request = JobRequest {
                name: target.label.clone(),
                command,
                resources,
                prerequisites: prerequisites.clone(),
                hold: hold_all,
            };
            match self.backend.submit(&request) {
                Ok(id) => {
                    debug!("{} submitted as {}", target.label, id);
                    let state = if hold_all {
                        JobState::Held
                    } else {
                        JobState::Pending
                    };
                    by_module.insert(target.module.clone(), jobs.len());
                    states.insert(target.module.clone(), state);
                    jobs.push(Job {
                        id,
                        module: target.module.clone(),
                        name: target.label.clone(),
                        state,
                        prerequisites,
                        submitted_at: Utc::now(),
                        finished_at: None,
                    });
                }
                Err(err) => {
                    warn!("{}: submission failed: {}", target.label, err);
                    states.insert(target.module.clone(), JobState::Failed);
                }
            }
        }

        self.supervise(&mut jobs, hold_all)?;

        for job in &jobs {
            states.insert(job.module.clone(), job.state);
        }
        let report = BuildReport {
            states,
            jobs,
            external,
        };
        info!(
            "plan finished in {:.1}s: {}",
            started.elapsed().as_secs_f64(),
            report
        );

        let failed: Vec<&str> = plan
            .targets()
            .iter()
            .filter(|target| report.states.get(&target.module) == Some(&JobState::Failed))
            .map(|target| target.label.as_str())
            .collect();
        if failed.is_empty() {
            Ok(report)
        } else {
            Err(JobError::JobsFailed {
                count: failed.len(),
                names: failed.join(", "),
                report,
            })
        }
    }

    /// Poll all jobs until every one is terminal
    ///
    /// A backend error or the poll timeout cancels everything still
    /// outstanding before the error is returned.
    fn supervise(&mut self, jobs: &mut [Job], hold_all: bool) -> JobResult<()> {
        let interval = Duration::from_secs(self.settings.poll_interval_secs);
        let timeout = self.settings.poll_timeout_secs.map(Duration::from_secs);
        let started = Instant::now();

        loop {
            if let Err(err) = self.poll_round(jobs, hold_all) {
                warn!("backend error, cancelling outstanding jobs: {}", err);
                self.cancel_outstanding(jobs);
                return Err(err);
            }

            if jobs.iter().all(|job| job.state.is_terminal()) {
                return Ok(());
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    let pending = jobs.iter().filter(|job| !job.state.is_terminal()).count();
                    warn!("giving up on {} outstanding jobs, cancelling", pending);
                    self.cancel_outstanding(jobs);
                    return Err(JobError::PollTimeout {
                        elapsed_secs: started.elapsed().as_secs(),
                        pending,
                    });
                }
            }

            thread::sleep(interval);
        }
    }

    /// One polling round over every job not yet terminal
    fn poll_round(&mut self, jobs: &mut [Job], hold_all: bool) -> JobResult<()> {
        for job in jobs.iter_mut().filter(|job| !job.state.is_terminal()) {
            let state = self.backend.poll(&job.id)?;
            if state != job.state {
                debug!("{} is now {}", job.name, state);
            }
            job.state = state;
            if state.is_terminal() {
                job.finished_at = Some(Utc::now());
            }
        }

        self.fail_blocked_jobs(jobs);

        if hold_all {
            self.release_within_budget(jobs)?;
        }
        Ok(())
    }

    /// Best-effort cancellation of everything not yet terminal
    fn cancel_outstanding(&mut self, jobs: &[Job]) {
        for job in jobs.iter().filter(|job| !job.state.is_terminal()) {
            if let Err(err) = self.backend.cancel(&job.id) {
                debug!("cancel of {} failed: {}", job.id, err);
            }
        }
    }

    /// Fail every job with a failed prerequisite
    ///
    /// Live dependents are cancelled at the backend. A job the backend
    /// claims succeeded despite a failed prerequisite breaks the
    /// submission contract and is reported as failed. Iterates to a
    /// fixpoint so a failure propagates through a whole chain of
    /// dependents within one round.
    fn fail_blocked_jobs(&mut self, jobs: &mut [Job]) {
        loop {
            let failed: BTreeSet<JobId> = jobs
                .iter()
                .filter(|job| job.state == JobState::Failed)
                .map(|job| job.id.clone())
                .collect();
            let mut changed = false;
            for index in 0..jobs.len() {
                if jobs[index].state == JobState::Failed {
                    continue;
                }
                let blocked = jobs[index]
                    .prerequisites
                    .iter()
                    .any(|prereq| failed.contains(prereq));
                if !blocked {
                    continue;
                }
                if jobs[index].state == JobState::Succeeded {
                    warn!(
                        "{}: succeeded despite a failed prerequisite, reporting as failed",
                        jobs[index].name
                    );
                } else {
                    warn!("{}: prerequisite failed, cancelling", jobs[index].name);
                    if let Err(err) = self.backend.cancel(&jobs[index].id) {
                        debug!("cancel of {} failed: {}", jobs[index].id, err);
                    }
                    jobs[index].finished_at = Some(Utc::now());
                }
                jobs[index].state = JobState::Failed;
                changed = true;
            }
            if !changed {
                return;
            }
        }
    }

    /// Release held jobs whose prerequisites have all succeeded,
    /// keeping the number of admitted jobs within the budget
    fn release_within_budget(&mut self, jobs: &mut [Job]) -> JobResult<()> {
        let budget = self.settings.max_concurrent.unwrap_or(usize::MAX);
        let mut active = jobs
            .iter()
            .filter(|job| matches!(job.state, JobState::Pending | JobState::Running))
            .count();
        let succeeded: BTreeSet<JobId> = jobs
            .iter()
            .filter(|job| job.state == JobState::Succeeded)
            .map(|job| job.id.clone())
            .collect();
        for index in 0..jobs.len() {
            if active >= budget {
                return Ok(());
            }
            if jobs[index].state != JobState::Held {
                continue;
            }
            if jobs[index]
                .prerequisites
                .iter()
                .all(|prereq| succeeded.contains(prereq))
            {
                debug!("releasing {}", jobs[index].name);
                self.backend.release(&jobs[index].id)?;
                jobs[index].state = JobState::Pending;
                active += 1;
            }
        }
        Ok(())
    }
}
