//! Strata dependency resolver
//!
//! Expands requested build targets into a complete, ordered dependency
//! graph: toolchain hierarchy walks and minimal-toolchain substitution,
//! recursive dependency expansion with deduplication and cycle detection,
//! and deterministic topological ordering of the resulting build plan.

pub mod hierarchy;
pub mod normalize;
pub mod order;
pub mod robot;

pub use hierarchy::{subtoolchain_version, toolchain_hierarchy};
pub use order::{BuildPlan, DependencyEdge};
pub use robot::{BuildTarget, DepRef, Resolver, TargetSpec};

use strata_recipe::RecipeError;

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error("Recipe for {name}-{version} with toolchain {toolchain} not found")]
    RecipeNotFound {
        name: String,
        version: String,
        toolchain: String,
    },

    #[error("No version found for subtoolchain {subtoolchain} in dependencies of {toolchain}")]
    NoSubtoolchainVersion {
        subtoolchain: String,
        toolchain: String,
    },

    #[error("Multiple versions of {subtoolchain} found in dependencies of toolchain {toolchain}: {versions}")]
    MultipleSubtoolchainVersions {
        subtoolchain: String,
        toolchain: String,
        versions: String,
    },

    #[error("Unknown toolchain '{0}'")]
    UnknownToolchain(String),

    #[error("Toolchain hierarchy of {0} loops back on itself")]
    ToolchainCycle(String),

    #[error("No toolchain in the {toolchain} hierarchy provides {name}-{version}")]
    NoMinimalToolchain {
        name: String,
        version: String,
        toolchain: String,
    },

    #[error("Dependency {name} of {parent} is listed both hidden ({hidden_module}) and visible ({visible_module})")]
    HiddenVisibleConflict {
        name: String,
        parent: String,
        hidden_module: String,
        visible_module: String,
    },

    #[error("Dependency cycle detected: {chain}")]
    DependencyCycle { chain: String },
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
