//! Settings loader
//!
//! Handles loading and merging settings from multiple sources with proper precedence.

use std::env;
use std::path::{Path, PathBuf};

use strata_recipe::CpuArch;

use crate::settings::{Settings, SettingsFile};
use crate::{ConfigError, ConfigResult};

/// Name of the per-project settings file.
const PROJECT_FILE: &str = "strata.toml";

/// Settings loader
///
/// Loads settings from multiple sources and merges them with proper precedence:
/// 1. Global settings (~/.strata/config.toml) - lowest priority
/// 2. Project settings (./strata.toml) - overrides global per section
/// 3. Environment variables (STRATA_*) - override individual fields
pub struct SettingsLoader {
    /// Cached global settings path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project settings file, empty when no strata.toml was found
    pub project: SettingsFile,

    /// Global settings file, empty when absent
    pub global: SettingsFile,

    /// Project root directory (where strata.toml was found)
    pub project_root: Option<PathBuf>,

    /// Effective settings after merging and environment overrides
    settings: Settings,
}

impl SettingsLoader {
    /// Create a new settings loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Load settings starting from the given directory
    ///
    /// Walks up the directory tree to find strata.toml, then loads the
    /// global settings file if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_settings(start_dir)?;
        self.build_config(project, project_root)
    }

    /// Load settings from a specific project settings file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = SettingsFile::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.build_config(project, project_root)
    }

    /// Merge the project file with the global file and apply env overrides
    fn build_config(
        &mut self,
        project: SettingsFile,
        project_root: Option<PathBuf>,
    ) -> ConfigResult<Config> {
        let global = match self.load_global_settings() {
            Ok(global) => global,
            // No home directory means no global settings file.
            Err(ConfigError::HomeNotFound) => SettingsFile::default(),
            Err(err) => return Err(err),
        };

        let mut settings = merge_sections(&project, &global);
        apply_env_overrides(&mut settings)?;

        Ok(Config {
            project,
            global,
            project_root,
            settings,
        })
    }

    /// Find project settings by walking up the directory tree
    fn find_project_settings(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, SettingsFile)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                let project = SettingsFile::load_from_file(&config_path)?;
                return Ok((Some(current), project));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    // Reached filesystem root without finding strata.toml
                    return Ok((None, SettingsFile::default()));
                }
            }
        }
    }

    /// Load global settings from ~/.strata/config.toml
    fn load_global_settings(&mut self) -> ConfigResult<SettingsFile> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = Self::global_config_dir()?.join("config.toml");
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global settings are optional
        if !path.exists() {
            return Ok(SettingsFile::default());
        }

        SettingsFile::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.strata)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".strata"))
    }

    /// Ensure the global configuration directory exists
    pub fn ensure_global_config_dir() -> ConfigResult<PathBuf> {
        let dir = Self::global_config_dir()?;
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge two settings files section by section
///
/// Sections present in the project file shadow the global file whole,
/// absent sections fall back to defaults.
fn merge_sections(project: &SettingsFile, global: &SettingsFile) -> Settings {
    Settings {
        resolve: project
            .resolve
            .clone()
            .or_else(|| global.resolve.clone())
            .unwrap_or_default(),
        jobs: project
            .jobs
            .clone()
            .or_else(|| global.jobs.clone())
            .unwrap_or_default(),
    }
}

/// Apply environment variable overrides on top of merged settings
///
/// Supported variables: STRATA_ARCH, STRATA_JOB_BACKEND, STRATA_JOB_CORES.
fn apply_env_overrides(settings: &mut Settings) -> ConfigResult<()> {
    if let Ok(arch) = env::var("STRATA_ARCH") {
        let arch: CpuArch = arch.parse().map_err(|_| ConfigError::InvalidValue {
            field: "STRATA_ARCH".to_string(),
            reason: format!("unknown architecture '{arch}'"),
        })?;
        settings.resolve.arch = arch;
    }

    if let Ok(backend) = env::var("STRATA_JOB_BACKEND") {
        settings.jobs.backend = backend;
    }

    if let Ok(cores) = env::var("STRATA_JOB_CORES") {
        let cores: usize = cores.parse().map_err(|_| ConfigError::InvalidValue {
            field: "STRATA_JOB_CORES".to_string(),
            reason: format!("expected a positive integer, got '{cores}'"),
        })?;
        settings.jobs.cores = cores;
    }

    Ok(())
}

impl Config {
    /// Effective settings after section merging and environment overrides
    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has strata.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
