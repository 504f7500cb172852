//! Metadata for dependencies satisfied by external modules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What an external module provides: the software names and versions
/// behind it, and the install prefix it exposes.
///
/// All fields are optional; absent fields can be filled in from a less
/// specific source without disturbing the ones already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalModuleMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl ExternalModuleMetadata {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.version.is_empty() && self.prefix.is_none()
    }

    /// Fill in fields that are still absent from `other`, leaving fields
    /// that already have a value untouched.
    pub fn fill_from(&mut self, other: &ExternalModuleMetadata) {
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        if self.version.is_empty() {
            self.version = other.version.clone();
        }
        if self.prefix.is_none() {
            self.prefix = other.prefix.clone();
        }
    }
}

/// Configured metadata for external modules, keyed by either the exact
/// `name/version` module name or the bare module name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalMetadataTable {
    entries: BTreeMap<String, ExternalModuleMetadata>,
}

impl ExternalMetadataTable {
    pub fn new() -> Self {
        ExternalMetadataTable::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, metadata: ExternalModuleMetadata) {
        self.entries.insert(module.into(), metadata);
    }

    pub fn get(&self, module: &str) -> Option<&ExternalModuleMetadata> {
        self.entries.get(module)
    }

    /// Metadata for module `name/version`, merged field by field: values
    /// from the exact `name/version` entry win, gaps are filled from the
    /// bare `name` entry.
    pub fn lookup(&self, name: &str, version: &str) -> ExternalModuleMetadata {
        let mut metadata = ExternalModuleMetadata::default();
        if let Some(exact) = self.entries.get(&format!("{name}/{version}")) {
            metadata.fill_from(exact);
        }
        if let Some(bare) = self.entries.get(name) {
            metadata.fill_from(bare);
        }
        metadata
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runtime source of metadata for external modules, typically backed by a
/// module tool. Used as the lowest-precedence fallback after configured
/// metadata.
pub trait ModuleProbe {
    /// Probe the environment for module `name/version`. Implementations
    /// may fall back to another version of `name` when the exact module
    /// is not available.
    fn probe(&self, name: &str, version: &str) -> Option<ExternalModuleMetadata>;
}

/// Probe that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl ModuleProbe for NoProbe {
    fn probe(&self, _name: &str, _version: &str) -> Option<ExternalModuleMetadata> {
        None
    }
}
