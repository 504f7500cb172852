//! Settings consumed by the resolver and the job orchestrator.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_recipe::{CpuArch, ExternalMetadataTable, NamingScheme};

use crate::{ConfigError, ConfigResult};

/// Settings that shape dependency resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveSettings {
    /// Architecture used to pick per-architecture dependency versions.
    pub arch: CpuArch,

    /// Module naming scheme.
    pub naming: NamingScheme,

    /// Software names pruned from every dependency list before resolution.
    pub filter_deps: BTreeSet<String>,

    /// Module names considered already installed; dependencies resolving
    /// to these get no graph node of their own.
    pub installed_modules: BTreeSet<String>,

    /// Expand dependencies even when their module is already installed.
    pub retain_all_deps: bool,

    /// Substitute the most minimal sufficient toolchain for dependencies
    /// that inherit their parent's toolchain.
    pub minimal_toolchains: bool,

    /// Let minimal toolchain substitution descend all the way to the
    /// system toolchain.
    pub add_system_to_minimal_toolchains: bool,

    /// Configured metadata for external modules.
    pub external_metadata: ExternalMetadataTable,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        ResolveSettings {
            arch: CpuArch::detect(),
            naming: NamingScheme::default(),
            filter_deps: BTreeSet::new(),
            installed_modules: BTreeSet::new(),
            retain_all_deps: false,
            minimal_toolchains: false,
            add_system_to_minimal_toolchains: false,
            external_metadata: ExternalMetadataTable::new(),
        }
    }
}

impl ResolveSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// Settings that shape job submission and supervision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobSettings {
    /// Registered name of the batch backend to submit through.
    pub backend: String,

    /// Cores requested per build job.
    pub cores: usize,

    /// Walltime requested per build job, in hours.
    pub max_walltime_hours: u64,

    /// Upper bound on concurrently eligible jobs. Only enforced by the
    /// orchestrator when the backend does not manage admission itself.
    pub max_concurrent: Option<usize>,

    /// Seconds between supervision polls.
    pub poll_interval_secs: u64,

    /// Give up supervising after this many seconds; outstanding jobs are
    /// cancelled. `None` waits indefinitely.
    pub poll_timeout_secs: Option<u64>,

    /// Directory for per-job output files.
    pub output_dir: Option<PathBuf>,

    /// Run the pre-submission hook for each target before its job is
    /// submitted.
    pub pre_create_install_dirs: bool,

    /// Default build command template; see the command registry for the
    /// supported placeholders.
    pub command_template: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        JobSettings {
            backend: "local".to_string(),
            cores: 1,
            max_walltime_hours: 24,
            max_concurrent: None,
            poll_interval_secs: 30,
            poll_timeout_secs: None,
            output_dir: None,
            pre_create_install_dirs: true,
            command_template: "strata build {module}".to_string(),
        }
    }
}

impl JobSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "jobs.backend".to_string(),
                reason: "backend name must not be empty".to_string(),
            });
        }
        if self.cores == 0 {
            return Err(ConfigError::InvalidValue {
                field: "jobs.cores".to_string(),
                reason: "at least one core is required".to_string(),
            });
        }
        if self.max_walltime_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "jobs.max_walltime_hours".to_string(),
                reason: "walltime must be at least one hour".to_string(),
            });
        }
        if self.max_concurrent == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "jobs.max_concurrent".to_string(),
                reason: "concurrency limit must be at least one".to_string(),
            });
        }
        if self.command_template.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "jobs.command_template".to_string(),
                reason: "command template must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Fully merged settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub resolve: ResolveSettings,
    pub jobs: JobSettings,
}

impl Settings {
    pub fn validate(&self) -> ConfigResult<()> {
        self.resolve.validate()?;
        self.jobs.validate()
    }
}

/// One settings file on disk. Sections are optional so that precedence
/// between project and global files can be decided per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve: Option<ResolveSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<JobSettings>,
}

impl SettingsFile {
    /// Load and validate a settings file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let file: SettingsFile =
            toml::from_str(&content).map_err(|error| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error,
            })?;

        if let Some(resolve) = &file.resolve {
            resolve.validate()?;
        }
        if let Some(jobs) = &file.jobs {
            jobs.validate()?;
        }

        Ok(file)
    }
}
