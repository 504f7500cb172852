//! Per-recipe dependency normalization: architecture version selection,
//! filtering, toolchain inheritance, hidden-set merging and external
//! metadata lookup.

use tracing::debug;

use strata_config::ResolveSettings;
use strata_recipe::{Dependency, ExternalModuleMetadata, ModuleProbe, Recipe, ToolchainRef};

use crate::{ResolveError, ResolveResult};

/// One dependency after normalization: a concrete version, a concrete
/// toolchain, and merged flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedDep {
    pub name: String,
    pub version: String,
    pub versionsuffix: String,
    pub toolchain: ToolchainRef,
    /// The toolchain was inherited from the declaring recipe, which makes
    /// this dependency eligible for minimal toolchain substitution.
    pub toolchain_inherited: bool,
    pub build_only: bool,
    pub hidden: bool,
    pub external: bool,
    pub metadata: ExternalModuleMetadata,
}

impl NormalizedDep {
    /// Identity used for deduplication, hidden-ness excluded.
    fn identity(&self) -> (&str, &str, &str, &ToolchainRef, bool) {
        (
            &self.name,
            &self.version,
            &self.versionsuffix,
            &self.toolchain,
            self.external,
        )
    }
}

/// Normalize every declared dependency of `recipe`: build-time first,
/// then runtime, then the hidden set.
///
/// Dependencies named in `filter_deps` and dependencies whose version
/// resolves to the skip marker on the current architecture are dropped.
/// A dependency listed both hidden and visible is an error; identical
/// duplicates collapse into one entry.
pub(crate) fn normalize_dependencies(
    recipe: &Recipe,
    probe: &dyn ModuleProbe,
    settings: &ResolveSettings,
) -> ResolveResult<Vec<NormalizedDep>> {
    let mut deps: Vec<NormalizedDep> = Vec::new();

    let declared = recipe
        .build_dependencies
        .iter()
        .map(|dep| (dep, true, false))
        .chain(recipe.dependencies.iter().map(|dep| (dep, false, false)))
        .chain(
            recipe
                .hidden_dependencies
                .iter()
                .map(|dep| (dep, false, true)),
        );

    for (dep, from_build_set, from_hidden_set) in declared {
        if settings.filter_deps.contains(&dep.name) {
            debug!(
                "dependency {} of {} filtered out",
                dep.name, recipe.name
            );
            continue;
        }

        let Some(version) = dep.version.select(&dep.name, settings.arch)? else {
            debug!(
                "dependency {} of {} does not apply on {}",
                dep.name, recipe.name, settings.arch
            );
            continue;
        };

        let normalized = normalize_one(dep, version, from_build_set, from_hidden_set, recipe, probe, settings);

        match deps.iter_mut().find(|d| d.identity() == normalized.identity()) {
            None => deps.push(normalized),
            Some(existing) => {
                if existing.hidden != normalized.hidden {
                    let (hidden_dep, visible_dep) = if existing.hidden {
                        (&*existing, &normalized)
                    } else {
                        (&normalized, &*existing)
                    };
                    return Err(ResolveError::HiddenVisibleConflict {
                        name: normalized.name.clone(),
                        parent: settings.naming.label(
                            &recipe.name,
                            &recipe.version,
                            &recipe.versionsuffix,
                            &recipe.toolchain,
                        ),
                        hidden_module: module_name(hidden_dep, settings),
                        visible_module: module_name(visible_dep, settings),
                    });
                }
                // Same module declared twice: a runtime listing wins over a
                // build-only one.
                existing.build_only = existing.build_only && normalized.build_only;
            }
        }
    }

    Ok(deps)
}

fn normalize_one(
    dep: &Dependency,
    version: String,
    from_build_set: bool,
    from_hidden_set: bool,
    recipe: &Recipe,
    probe: &dyn ModuleProbe,
    settings: &ResolveSettings,
) -> NormalizedDep {
    let (toolchain, toolchain_inherited) = if dep.external {
        // External modules live outside any toolchain.
        (ToolchainRef::system(), false)
    } else {
        match &dep.toolchain {
            Some(toolchain) => (toolchain.clone(), false),
            None => (recipe.toolchain.clone(), true),
        }
    };

    let mut metadata = ExternalModuleMetadata::default();
    if dep.external {
        if let Some(inline) = &dep.metadata {
            metadata.fill_from(inline);
        }
        metadata.fill_from(&settings.external_metadata.lookup(&dep.name, &version));
        let incomplete =
            metadata.name.is_empty() || metadata.version.is_empty() || metadata.prefix.is_none();
        if incomplete {
            if let Some(probed) = probe.probe(&dep.name, &version) {
                metadata.fill_from(&probed);
            }
        }
    }

    NormalizedDep {
        name: dep.name.clone(),
        version,
        versionsuffix: dep.versionsuffix.clone(),
        toolchain,
        toolchain_inherited,
        build_only: dep.build_only || from_build_set,
        hidden: dep.hidden || from_hidden_set,
        external: dep.external,
        metadata,
    }
}

fn module_name(dep: &NormalizedDep, settings: &ResolveSettings) -> String {
    settings.naming.module_name(
        &dep.name,
        &dep.version,
        &dep.versionsuffix,
        &dep.toolchain,
        dep.hidden,
    )
}
