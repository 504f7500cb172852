//! Build recipes: one installable software version and its dependencies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::toolchain::ToolchainRef;
use crate::{RecipeError, RecipeResult};

/// A build recipe: what to build, against which toolchain, and what it
/// depends on. Recipes are the unit of resolution; how their sources are
/// fetched and compiled is the build layer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub versionsuffix: String,
    pub toolchain: ToolchainRef,
    /// Runtime dependencies.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Build-time-only dependencies.
    #[serde(default)]
    pub build_dependencies: Vec<Dependency>,
    /// Dependencies installed as hidden modules.
    #[serde(default)]
    pub hidden_dependencies: Vec<Dependency>,
    /// Multi-version build dependencies: each listed software fans the
    /// recipe out into one build variant per version. All lists must have
    /// the same length; variant `i` pins list entry `i` of every software.
    #[serde(default)]
    pub multi_deps: BTreeMap<String, Vec<String>>,
    /// Install this recipe's own module hidden.
    #[serde(default)]
    pub hidden: bool,
    /// Build-step handler key; the orchestrator falls back to its default
    /// handler when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        toolchain: ToolchainRef,
    ) -> Self {
        Recipe {
            name: name.into(),
            version: version.into(),
            versionsuffix: String::new(),
            toolchain,
            dependencies: Vec::new(),
            build_dependencies: Vec::new(),
            hidden_dependencies: Vec::new(),
            multi_deps: BTreeMap::new(),
            hidden: false,
            handler: None,
        }
    }

    pub fn with_versionsuffix(mut self, suffix: impl Into<String>) -> Self {
        self.versionsuffix = suffix.into();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_build_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.build_dependencies = dependencies;
        self
    }

    pub fn with_hidden_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.hidden_dependencies = dependencies;
        self
    }

    pub fn with_multi_deps(mut self, multi_deps: BTreeMap<String, Vec<String>>) -> Self {
        self.multi_deps = multi_deps;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Parse a recipe from TOML.
    pub fn from_toml_str(content: &str) -> RecipeResult<Self> {
        let recipe: Recipe = toml::from_str(content)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Serialize the recipe to TOML.
    pub fn to_toml_string(&self) -> RecipeResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check internal consistency. Multi-version dependency lists must all
    /// have the same, non-zero number of versions.
    pub fn validate(&self) -> RecipeResult<()> {
        if !self.multi_deps.is_empty() {
            let mut lengths = self.multi_deps.values().map(Vec::len);
            let first = lengths.next().unwrap_or(0);
            if first == 0 || lengths.any(|len| len != first) {
                return Err(RecipeError::MultiDepArityMismatch {
                    recipe: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of build variants this recipe fans out into: 1 without
    /// multi-version dependencies, otherwise the shared list length.
    pub fn variant_count(&self) -> usize {
        self.multi_deps.values().next().map_or(1, Vec::len)
    }

    /// All declared dependencies: build-time first, then runtime, then
    /// hidden.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.build_dependencies
            .iter()
            .chain(self.dependencies.iter())
            .chain(self.hidden_dependencies.iter())
    }
}
