//! Strata parallel build orchestration
//!
//! Turns a resolved build plan into batch jobs and supervises them:
//! - One job per plan target, prerequisites wired from plan edges
//! - Pluggable backends behind the `JobBackend` trait
//! - Build-step handlers keyed by the recipe's handler name
//! - Held submission and budgeted release for backends that admit
//!   everything at once
//! - Aggregate failure reporting with per-target states

pub mod backend;
pub mod command;
pub mod error;
pub mod job;
pub mod local;
pub mod orchestrator;

// Re-export main types
pub use backend::{backend_by_name, JobBackend};
pub use command::{CommandBuilder, CommandRegistry, TemplateCommand, DEFAULT_HANDLER};
pub use error::{JobError, JobResult};
pub use job::{Job, JobId, JobRequest, JobResources, JobState};
pub use local::LocalBackend;
pub use orchestrator::{BuildReport, Orchestrator};
