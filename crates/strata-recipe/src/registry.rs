//! Recipe lookup: the seam between resolution and recipe storage.

use std::collections::BTreeMap;

use crate::recipe::Recipe;
use crate::toolchain::ToolchainRef;

/// Source of recipes, keyed by the full identity of a build: name,
/// version, version suffix and toolchain. A miss is not an error at this
/// layer; the resolver decides what a missing recipe means.
pub trait RecipeRegistry {
    fn lookup(
        &self,
        name: &str,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
    ) -> Option<Recipe>;
}

type RegistryKey = (String, String, String, ToolchainRef);

/// In-memory registry, the storage used by tests and embedders that
/// assemble recipes programmatically.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    recipes: BTreeMap<RegistryKey, Recipe>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        MemoryRegistry::default()
    }

    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let mut registry = MemoryRegistry::new();
        for recipe in recipes {
            registry.insert(recipe);
        }
        registry
    }

    /// Store a recipe, replacing any previous one with the same identity.
    pub fn insert(&mut self, recipe: Recipe) {
        let key = (
            recipe.name.clone(),
            recipe.version.clone(),
            recipe.versionsuffix.clone(),
            recipe.toolchain.clone(),
        );
        self.recipes.insert(key, recipe);
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeRegistry for MemoryRegistry {
    fn lookup(
        &self,
        name: &str,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
    ) -> Option<Recipe> {
        let key = (
            name.to_string(),
            version.to_string(),
            versionsuffix.to_string(),
            toolchain.clone(),
        );
        self.recipes.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_matches_on_full_identity() {
        let mut registry = MemoryRegistry::new();
        registry.insert(Recipe::new(
            "zlib",
            "1.2.8",
            ToolchainRef::new("GCC", "6.4.0-2.28"),
        ));
        registry.insert(
            Recipe::new("zlib", "1.2.8", ToolchainRef::new("GCC", "6.4.0-2.28"))
                .with_versionsuffix("-static"),
        );

        let gcc = ToolchainRef::new("GCC", "6.4.0-2.28");
        assert!(registry.lookup("zlib", "1.2.8", "", &gcc).is_some());
        assert!(registry.lookup("zlib", "1.2.8", "-static", &gcc).is_some());
        assert!(registry.lookup("zlib", "1.2.8", "", &ToolchainRef::system()).is_none());
        assert!(registry.lookup("zlib", "1.2.9", "", &gcc).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_insert_replaces_same_identity() {
        let mut registry = MemoryRegistry::new();
        let tc = ToolchainRef::system();
        registry.insert(Recipe::new("toy", "0.0", tc.clone()));
        registry.insert(Recipe::new("toy", "0.0", tc.clone()).hidden());
        assert_eq!(registry.len(), 1);
        let recipe = registry.lookup("toy", "0.0", "", &tc).unwrap();
        assert!(recipe.hidden);
    }
}
