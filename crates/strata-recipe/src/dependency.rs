//! Dependency declarations as they appear in recipes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arch::CpuArch;
use crate::toolchain::ToolchainRef;
use crate::{ExternalModuleMetadata, RecipeError, RecipeResult};

/// Key prefix for per-architecture version entries.
const ARCH_KEY_PREFIX: &str = "arch=";

/// Wildcard entry matching any architecture without an exact entry.
const ARCH_KEY_WILDCARD: &str = "arch=*";

/// Value of one per-architecture version entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchVersion {
    /// Build against this version on the matching architecture.
    Version(String),
    /// `false` in a recipe: the dependency does not apply on this
    /// architecture and is dropped entirely.
    Skip(bool),
}

/// A dependency version: either one version for every architecture, or a
/// map keyed by `arch=<name>` with an optional `arch=*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSpec {
    Version(String),
    ByArch(BTreeMap<String, ArchVersion>),
}

impl VersionSpec {
    pub fn version(version: impl Into<String>) -> Self {
        VersionSpec::Version(version.into())
    }

    /// Resolve the version to use on `arch`.
    ///
    /// Returns `Ok(None)` when the dependency is marked as skipped on this
    /// architecture. An exact `arch=<name>` entry wins over `arch=*`; a map
    /// with neither is an error, as is any key outside the `arch=` family.
    pub fn select(&self, dep: &str, arch: CpuArch) -> RecipeResult<Option<String>> {
        let map = match self {
            VersionSpec::Version(version) => return Ok(Some(version.clone())),
            VersionSpec::ByArch(map) => map,
        };

        for key in map.keys() {
            let valid = key == ARCH_KEY_WILDCARD
                || key
                    .strip_prefix(ARCH_KEY_PREFIX)
                    .is_some_and(|rest| rest.parse::<CpuArch>().is_ok());
            if !valid {
                return Err(RecipeError::UnexpectedVersionKey {
                    dep: dep.to_string(),
                    key: key.clone(),
                });
            }
        }

        let exact = format!("{ARCH_KEY_PREFIX}{arch}");
        let entry = map
            .get(&exact)
            .or_else(|| map.get(ARCH_KEY_WILDCARD))
            .ok_or_else(|| RecipeError::MissingArchVersion {
                dep: dep.to_string(),
                arch,
            })?;

        match entry {
            ArchVersion::Version(version) => Ok(Some(version.clone())),
            ArchVersion::Skip(false) => Ok(None),
            ArchVersion::Skip(true) => Err(RecipeError::InvalidVersionSpec {
                dep: dep.to_string(),
                reason: "only `false` may be used to skip an architecture".to_string(),
            }),
        }
    }
}

/// One dependency record of a recipe.
///
/// `toolchain: None` means the dependency inherits the toolchain of the
/// recipe that declares it, which also makes it eligible for minimal
/// toolchain substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: VersionSpec,
    #[serde(default)]
    pub versionsuffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainRef>,
    /// Needed at build time only; not part of the installed runtime closure.
    #[serde(default)]
    pub build_only: bool,
    /// Installed as a hidden module (dot-prefixed version in module names).
    #[serde(default)]
    pub hidden: bool,
    /// Satisfied by a module outside this system; never expanded or built.
    #[serde(default)]
    pub external: bool,
    /// Inline metadata for external dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExternalModuleMetadata>,
}

impl Dependency {
    /// A runtime dependency inheriting the parent toolchain.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Dependency {
            name: name.into(),
            version: VersionSpec::version(version),
            versionsuffix: String::new(),
            toolchain: None,
            build_only: false,
            hidden: false,
            external: false,
            metadata: None,
        }
    }

    /// A dependency on an external module `name/version`.
    pub fn external(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut dep = Dependency::new(name, version);
        dep.external = true;
        dep
    }

    pub fn with_version_map(mut self, versions: BTreeMap<String, ArchVersion>) -> Self {
        self.version = VersionSpec::ByArch(versions);
        self
    }

    pub fn with_versionsuffix(mut self, suffix: impl Into<String>) -> Self {
        self.versionsuffix = suffix.into();
        self
    }

    pub fn with_toolchain(mut self, toolchain: ToolchainRef) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    pub fn build_only(mut self) -> Self {
        self.build_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_metadata(mut self, metadata: ExternalModuleMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
