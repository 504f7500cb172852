//! Strata recipe model
//!
//! Build recipes, dependency declarations, toolchain references and the
//! module naming scheme shared by the resolver and the job layer.

pub mod arch;
pub mod dependency;
pub mod metadata;
pub mod naming;
pub mod recipe;
pub mod registry;
pub mod toolchain;

pub use arch::CpuArch;
pub use dependency::{ArchVersion, Dependency, VersionSpec};
pub use metadata::{ExternalMetadataTable, ExternalModuleMetadata, ModuleProbe, NoProbe};
pub use naming::NamingScheme;
pub use recipe::Recipe;
pub use registry::{MemoryRegistry, RecipeRegistry};
pub use toolchain::{
    SubtoolchainSpec, ToolchainDef, ToolchainRef, ToolchainTable, SYSTEM_TOOLCHAIN_NAME,
};

/// Recipe model errors
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("unknown CPU architecture '{0}'")]
    UnknownArchitecture(String),

    #[error("unexpected key '{key}' in version of dependency {dep} (only arch=* and arch=<name> are allowed)")]
    UnexpectedVersionKey { dep: String, key: String },

    #[error("no version for architecture {arch} in version of dependency {dep}")]
    MissingArchVersion { dep: String, arch: CpuArch },

    #[error("invalid version for dependency {dep}: {reason}")]
    InvalidVersionSpec { dep: String, reason: String },

    #[error("multi-version dependency lists of {recipe} do not all have the same number of versions")]
    MultiDepArityMismatch { recipe: String },

    #[error("Failed to parse recipe: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize recipe: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

pub type RecipeResult<T> = std::result::Result<T, RecipeError>;
