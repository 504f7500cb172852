//! Strata Configuration System
//!
//! Settings for dependency resolution and job submission, loaded from:
//! - Project settings (./strata.toml)
//! - Global user settings (~/.strata/config.toml)
//! - Environment variables (STRATA_*)
//!
//! # Configuration Hierarchy
//!
//! Sections are taken from the project file when present, falling back to
//! the global file and finally to built-in defaults. Environment variables
//! override individual fields on top of that.
//!
//! # Example
//!
//! ```no_run
//! use strata_config::SettingsLoader;
//! use std::path::Path;
//!
//! let mut loader = SettingsLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let settings = config.settings();
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, SettingsLoader};
pub use settings::{JobSettings, ResolveSettings, Settings, SettingsFile};
