//! Recursive dependency expansion: from requested targets to a complete
//! build plan.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use strata_config::ResolveSettings;
use strata_recipe::{
    Dependency, ExternalModuleMetadata, ModuleProbe, NoProbe, Recipe, RecipeRegistry,
    ToolchainRef, ToolchainTable,
};

use crate::hierarchy::toolchain_hierarchy;
use crate::normalize::{normalize_dependencies, NormalizedDep};
use crate::order::order_targets;
use crate::{BuildPlan, ResolveError, ResolveResult};

/// A requested build, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    pub version: String,
    pub versionsuffix: String,
    pub toolchain: ToolchainRef,
}

impl TargetSpec {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        toolchain: ToolchainRef,
    ) -> Self {
        TargetSpec {
            name: name.into(),
            version: version.into(),
            versionsuffix: String::new(),
            toolchain,
        }
    }

    pub fn with_versionsuffix(mut self, suffix: impl Into<String>) -> Self {
        self.versionsuffix = suffix.into();
        self
    }
}

/// Reference from a resolved target to one of its dependencies.
///
/// `module` names a plan node, except for dependencies satisfied by an
/// already installed module, which keep their module name but have no
/// node of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepRef {
    pub module: String,
    pub name: String,
    pub build_only: bool,
    pub hidden: bool,
    pub external: bool,
}

/// One resolved node of the build plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildTarget {
    pub name: String,
    pub version: String,
    pub versionsuffix: String,
    pub toolchain: ToolchainRef,
    /// Full module name; the node identity within a plan.
    pub module: String,
    /// Flat `name-fullversion` label used for job names and logs.
    pub label: String,
    pub hidden: bool,
    /// Satisfied by an external module: part of the graph, never built.
    pub external: bool,
    /// Metadata for external targets; empty otherwise.
    pub metadata: ExternalModuleMetadata,
    /// Build-step handler key, orchestrator default when unset.
    pub handler: Option<String>,
    pub dependencies: Vec<DepRef>,
}

impl BuildTarget {
    /// Dependencies visible in module listings: hidden ones are skipped
    /// unless explicitly forced visible.
    pub fn visible_dependencies(&self, force_visible: bool) -> impl Iterator<Item = &DepRef> + '_ {
        self.dependencies
            .iter()
            .filter(move |dep| force_visible || !dep.hidden)
    }

    /// Dependencies that are part of the runtime closure.
    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &DepRef> + '_ {
        self.dependencies.iter().filter(|dep| !dep.build_only)
    }
}

/// Dependency resolver.
///
/// Expands requested targets recursively, deduplicating on full module
/// names, and hands the result to the orderer. One resolver instance
/// resolves one request set.
pub struct Resolver<'a> {
    registry: &'a dyn RecipeRegistry,
    toolchains: &'a ToolchainTable,
    probe: &'a dyn ModuleProbe,
    settings: &'a ResolveSettings,
    targets: BTreeMap<String, BuildTarget>,
    request_index: BTreeMap<String, usize>,
    edges: BTreeSet<(String, String)>,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a dyn RecipeRegistry,
        toolchains: &'a ToolchainTable,
        settings: &'a ResolveSettings,
    ) -> Self {
        Resolver {
            registry,
            toolchains,
            probe: &NoProbe,
            settings,
            targets: BTreeMap::new(),
            request_index: BTreeMap::new(),
            edges: BTreeSet::new(),
            stack: Vec::new(),
        }
    }

    /// Use `probe` as the runtime metadata source for external modules.
    pub fn with_probe(mut self, probe: &'a dyn ModuleProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Resolve `requests` into an ordered build plan.
    pub fn resolve(mut self, requests: &[TargetSpec]) -> ResolveResult<BuildPlan> {
        for request in requests {
            let modules = self.expand(
                &request.name,
                &request.version,
                &request.versionsuffix,
                &request.toolchain,
                false,
            )?;
            for module in modules {
                let next = self.request_index.len();
                self.request_index.entry(module).or_insert(next);
            }
        }
        debug!(
            "resolved {} targets, {} dependency edges",
            self.targets.len(),
            self.edges.len()
        );
        order_targets(self.targets, self.edges, self.request_index)
    }

    /// Expand one `(name, version, suffix, toolchain)` into plan nodes.
    /// Multi-version dependencies fan the recipe out into several nodes;
    /// the returned module names cover every variant.
    fn expand(
        &mut self,
        name: &str,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
        force_hidden: bool,
    ) -> ResolveResult<Vec<String>> {
        let mut recipe = self
            .registry
            .lookup(name, version, versionsuffix, toolchain)
            .ok_or_else(|| ResolveError::RecipeNotFound {
                name: name.to_string(),
                version: version.to_string(),
                toolchain: toolchain.to_string(),
            })?;
        recipe.validate()?;
        recipe.hidden |= force_hidden;

        let mut modules = Vec::new();
        for variant in fan_out(&recipe) {
            modules.push(self.expand_recipe(variant)?);
        }
        Ok(modules)
    }

    /// Expand one concrete recipe variant into a plan node.
    fn expand_recipe(&mut self, recipe: Recipe) -> ResolveResult<String> {
        let module = self.settings.naming.module_name(
            &recipe.name,
            &recipe.version,
            &recipe.versionsuffix,
            &recipe.toolchain,
            recipe.hidden,
        );

        if let Some(pos) = self.stack.iter().position(|entry| entry == &module) {
            let mut chain: Vec<&str> = self.stack[pos..].iter().map(String::as_str).collect();
            chain.push(&module);
            return Err(ResolveError::DependencyCycle {
                chain: chain.join(" -> "),
            });
        }
        if self.targets.contains_key(&module) {
            return Ok(module);
        }

        self.stack.push(module.clone());
        let expanded = self.expand_dependencies(&recipe, &module);
        self.stack.pop();
        let dependencies = expanded?;

        debug!("resolved {}", module);
        let label = self.settings.naming.label(
            &recipe.name,
            &recipe.version,
            &recipe.versionsuffix,
            &recipe.toolchain,
        );
        self.targets.insert(
            module.clone(),
            BuildTarget {
                name: recipe.name,
                version: recipe.version,
                versionsuffix: recipe.versionsuffix,
                toolchain: recipe.toolchain,
                module: module.clone(),
                label,
                hidden: recipe.hidden,
                external: false,
                metadata: ExternalModuleMetadata::default(),
                handler: recipe.handler,
                dependencies,
            },
        );
        Ok(module)
    }

    /// Expand the normalized dependencies of `recipe`, including the
    /// implicit dependency on its (non-system) toolchain.
    fn expand_dependencies(
        &mut self,
        recipe: &Recipe,
        module: &str,
    ) -> ResolveResult<Vec<DepRef>> {
        let mut refs = Vec::new();

        if !recipe.toolchain.is_system() {
            let toolchain_dep = NormalizedDep {
                name: recipe.toolchain.name.clone(),
                version: recipe.toolchain.version.clone(),
                versionsuffix: String::new(),
                toolchain: ToolchainRef::system(),
                toolchain_inherited: false,
                build_only: false,
                hidden: false,
                external: false,
                metadata: ExternalModuleMetadata::default(),
            };
            refs.extend(self.expand_dep(&toolchain_dep, module)?);
        }

        for dep in normalize_dependencies(recipe, self.probe, self.settings)? {
            if dep.external {
                refs.push(self.record_external(&dep, module));
            } else {
                refs.extend(self.expand_dep(&dep, module)?);
            }
        }
        Ok(refs)
    }

    /// Expand one internal dependency, wiring plan edges to every node it
    /// produces. Dependencies satisfied by an installed module produce a
    /// reference but no node and no edge.
    fn expand_dep(&mut self, dep: &NormalizedDep, parent: &str) -> ResolveResult<Vec<DepRef>> {
        let toolchain = if self.settings.minimal_toolchains
            && dep.toolchain_inherited
            && !dep.toolchain.is_system()
        {
            self.minimal_toolchain_for(dep)?
        } else {
            dep.toolchain.clone()
        };

        let module = self.settings.naming.module_name(
            &dep.name,
            &dep.version,
            &dep.versionsuffix,
            &toolchain,
            dep.hidden,
        );
        if !self.settings.retain_all_deps && self.settings.installed_modules.contains(&module) {
            debug!("dependency {} satisfied by installed module", module);
            return Ok(vec![DepRef {
                module,
                name: dep.name.clone(),
                build_only: dep.build_only,
                hidden: dep.hidden,
                external: false,
            }]);
        }

        let modules = self.expand(
            &dep.name,
            &dep.version,
            &dep.versionsuffix,
            &toolchain,
            dep.hidden,
        )?;
        Ok(modules
            .into_iter()
            .map(|module| {
                self.edges.insert((parent.to_string(), module.clone()));
                DepRef {
                    module,
                    name: dep.name.clone(),
                    build_only: dep.build_only,
                    hidden: dep.hidden,
                    external: false,
                }
            })
            .collect())
    }

    /// Record an external dependency as a graph node that is never
    /// expanded further.
    fn record_external(&mut self, dep: &NormalizedDep, parent: &str) -> DepRef {
        let module = self.settings.naming.module_name(
            &dep.name,
            &dep.version,
            &dep.versionsuffix,
            &dep.toolchain,
            dep.hidden,
        );
        if !self.targets.contains_key(&module) {
            let label = self.settings.naming.label(
                &dep.name,
                &dep.version,
                &dep.versionsuffix,
                &dep.toolchain,
            );
            debug!("external module {}", module);
            self.targets.insert(
                module.clone(),
                BuildTarget {
                    name: dep.name.clone(),
                    version: dep.version.clone(),
                    versionsuffix: dep.versionsuffix.clone(),
                    toolchain: dep.toolchain.clone(),
                    module: module.clone(),
                    label,
                    hidden: dep.hidden,
                    external: true,
                    metadata: dep.metadata.clone(),
                    handler: None,
                    dependencies: Vec::new(),
                },
            );
        }
        self.edges.insert((parent.to_string(), module.clone()));
        DepRef {
            module,
            name: dep.name.clone(),
            build_only: dep.build_only,
            hidden: dep.hidden,
            external: true,
        }
    }

    /// Bottom-most toolchain of the parent hierarchy that can satisfy the
    /// dependency, either with a recipe or with an installed module.
    fn minimal_toolchain_for(&self, dep: &NormalizedDep) -> ResolveResult<ToolchainRef> {
        let hierarchy =
            toolchain_hierarchy(&dep.toolchain, self.toolchains, self.registry, self.settings)?;
        for toolchain in &hierarchy {
            if self
                .registry
                .lookup(&dep.name, &dep.version, &dep.versionsuffix, toolchain)
                .is_some()
            {
                debug!("minimal toolchain for {}: {}", dep.name, toolchain);
                return Ok(toolchain.clone());
            }
            let module = self.settings.naming.module_name(
                &dep.name,
                &dep.version,
                &dep.versionsuffix,
                toolchain,
                dep.hidden,
            );
            if self.settings.installed_modules.contains(&module) {
                debug!("minimal toolchain for {} via installed {}", dep.name, module);
                return Ok(toolchain.clone());
            }
        }
        Err(ResolveError::NoMinimalToolchain {
            name: dep.name.clone(),
            version: dep.version.clone(),
            toolchain: dep.toolchain.to_string(),
        })
    }
}

/// Fan a recipe with multi-version dependencies out into one variant per
/// version index. Variant `i` pins list entry `i` of every multi-version
/// software as an extra build dependency and extends the version suffix
/// accordingly.
fn fan_out(recipe: &Recipe) -> Vec<Recipe> {
    if recipe.multi_deps.is_empty() {
        return vec![recipe.clone()];
    }

    (0..recipe.variant_count())
        .map(|index| {
            let mut variant = recipe.clone();
            variant.multi_deps = BTreeMap::new();

            let mut suffix = recipe.versionsuffix.clone();
            let mut pinned = Vec::new();
            for (name, versions) in &recipe.multi_deps {
                let version = &versions[index];
                suffix.push_str(&format!("-{name}-{version}"));
                pinned.push(Dependency::new(name.clone(), version.clone()).build_only());
            }
            pinned.append(&mut variant.build_dependencies);
            variant.build_dependencies = pinned;
            variant.versionsuffix = suffix;
            variant
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_recipe::{CpuArch, MemoryRegistry};

    fn settings() -> ResolveSettings {
        ResolveSettings {
            arch: CpuArch::X86_64,
            ..ResolveSettings::default()
        }
    }

    fn resolve_with(
        registry: &MemoryRegistry,
        settings: &ResolveSettings,
        requests: &[TargetSpec],
    ) -> ResolveResult<BuildPlan> {
        let table = ToolchainTable::builtin();
        Resolver::new(registry, &table, settings).resolve(requests)
    }

    fn system() -> ToolchainRef {
        ToolchainRef::system()
    }

    #[test]
    fn test_chain_of_three_yields_two_edges() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("a", "1.0", system()),
            Recipe::new("b", "1.0", system()).with_dependencies(vec![Dependency::new("a", "1.0")]),
            Recipe::new("c", "1.0", system()).with_dependencies(vec![Dependency::new("b", "1.0")]),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("c", "1.0", system())],
        )
        .unwrap();

        assert_eq!(plan.modules().collect::<Vec<_>>(), vec!["a/1.0", "b/1.0", "c/1.0"]);
        assert_eq!(plan.edges().len(), 2);
    }

    #[test]
    fn test_shared_dependencies_are_deduplicated() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("zlib", "1.2.8", system()),
            Recipe::new("gzip", "1.5", system())
                .with_dependencies(vec![Dependency::new("zlib", "1.2.8")]),
            Recipe::new("pigz", "2.4", system())
                .with_dependencies(vec![Dependency::new("zlib", "1.2.8")]),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[
                TargetSpec::new("gzip", "1.5", system()),
                TargetSpec::new("pigz", "2.4", system()),
            ],
        )
        .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.position("zlib/1.2.8"), Some(0));
    }

    #[test]
    fn test_dependency_cycles_are_reported_with_the_chain() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("a", "1.0", system()).with_dependencies(vec![Dependency::new("b", "1.0")]),
            Recipe::new("b", "1.0", system()).with_dependencies(vec![Dependency::new("a", "1.0")]),
        ]);
        let err = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("a", "1.0", system())],
        )
        .unwrap_err();
        match err {
            ResolveError::DependencyCycle { chain } => {
                assert_eq!(chain, "a/1.0 -> b/1.0 -> a/1.0");
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_recipe_is_reported_with_identity() {
        let registry = MemoryRegistry::new();
        let err = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("toy", "0.0", system())],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Recipe for toy-0.0 with toolchain system not found"
        );
    }

    #[test]
    fn test_non_system_toolchain_becomes_an_implicit_dependency() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("GCC", "6.4.0-2.28", system()),
            Recipe::new("gzip", "1.4", ToolchainRef::new("GCC", "6.4.0-2.28")),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new(
                "gzip",
                "1.4",
                ToolchainRef::new("GCC", "6.4.0-2.28"),
            )],
        )
        .unwrap();

        assert_eq!(
            plan.modules().collect::<Vec<_>>(),
            vec!["GCC/6.4.0-2.28", "gzip/1.4-GCC-6.4.0-2.28"]
        );
        let gzip = plan.get("gzip/1.4-GCC-6.4.0-2.28").unwrap();
        assert_eq!(gzip.dependencies.len(), 1);
        assert_eq!(gzip.dependencies[0].module, "GCC/6.4.0-2.28");
    }

    #[test]
    fn test_installed_modules_are_not_expanded() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("gzip", "1.5", system())
                .with_dependencies(vec![Dependency::new("zlib", "1.2.8")]),
        ]);
        let mut cfg = settings();
        cfg.installed_modules = BTreeSet::from(["zlib/1.2.8".to_string()]);

        let plan = resolve_with(
            &registry,
            &cfg,
            &[TargetSpec::new("gzip", "1.5", system())],
        )
        .unwrap();

        // The reference survives, the node does not.
        assert_eq!(plan.len(), 1);
        let gzip = plan.get("gzip/1.5").unwrap();
        assert_eq!(gzip.dependencies[0].module, "zlib/1.2.8");
        assert!(plan.edges().is_empty());
    }

    #[test]
    fn test_retain_all_deps_expands_installed_modules_too() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("zlib", "1.2.8", system()),
            Recipe::new("gzip", "1.5", system())
                .with_dependencies(vec![Dependency::new("zlib", "1.2.8")]),
        ]);
        let mut cfg = settings();
        cfg.installed_modules = BTreeSet::from(["zlib/1.2.8".to_string()]);
        cfg.retain_all_deps = true;

        let plan = resolve_with(
            &registry,
            &cfg,
            &[TargetSpec::new("gzip", "1.5", system())],
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.edges().len(), 1);
    }

    #[test]
    fn test_external_dependencies_become_leaf_nodes() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("toy", "0.0", system())
                .with_dependencies(vec![Dependency::external("pi", "3.14")]),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("toy", "0.0", system())],
        )
        .unwrap();

        assert_eq!(plan.modules().collect::<Vec<_>>(), vec!["pi/3.14", "toy/0.0"]);
        let external = plan.get("pi/3.14").unwrap();
        assert!(external.external);
        assert!(external.dependencies.is_empty());
        assert_eq!(plan.edges().len(), 1);
    }

    struct PrefixProbe;

    impl ModuleProbe for PrefixProbe {
        fn probe(&self, name: &str, _version: &str) -> Option<ExternalModuleMetadata> {
            Some(ExternalModuleMetadata {
                name: vec![name.to_string()],
                version: vec![],
                prefix: Some(format!("{}_ROOT", name.to_uppercase())),
            })
        }
    }

    #[test]
    fn test_probe_fills_external_node_metadata() {
        let registry = MemoryRegistry::with_recipes([Recipe::new("toy", "0.0", system())
            .with_dependencies(vec![Dependency::external("cray-libsci", "17.12.1")])]);
        let table = ToolchainTable::builtin();
        let cfg = settings();
        let plan = Resolver::new(&registry, &table, &cfg)
            .with_probe(&PrefixProbe)
            .resolve(&[TargetSpec::new("toy", "0.0", system())])
            .unwrap();

        let external = plan.get("cray-libsci/17.12.1").unwrap();
        assert_eq!(external.metadata.name, vec!["cray-libsci".to_string()]);
        assert_eq!(external.metadata.prefix.as_deref(), Some("CRAY-LIBSCI_ROOT"));
    }

    #[test]
    fn test_hidden_dependency_produces_a_hidden_node() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("toy", "0.0", system()).with_versionsuffix("-deps"),
            Recipe::new("gzip", "1.4", system()).with_hidden_dependencies(vec![
                Dependency::new("toy", "0.0").with_versionsuffix("-deps"),
            ]),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("gzip", "1.4", system())],
        )
        .unwrap();

        let toy = plan.get("toy/.0.0-deps").unwrap();
        assert!(toy.hidden);

        let gzip = plan.get("gzip/1.4").unwrap();
        assert_eq!(
            gzip.visible_dependencies(false).count(),
            0,
            "hidden deps stay out of the visible projection"
        );
        assert_eq!(gzip.visible_dependencies(true).count(), 1);
        assert_eq!(gzip.dependencies.len(), 1);
    }

    #[test]
    fn test_multi_deps_fan_out_into_variants() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("Python", "3.7.2", system()),
            Recipe::new("Python", "2.7.15", system()),
            Recipe::new("toy", "0.0", system()).with_multi_deps(BTreeMap::from([(
                "Python".to_string(),
                vec!["3.7.2".to_string(), "2.7.15".to_string()],
            )])),
        ]);
        let plan = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("toy", "0.0", system())],
        )
        .unwrap();

        assert_eq!(
            plan.modules().collect::<Vec<_>>(),
            vec![
                "Python/2.7.15",
                "Python/3.7.2",
                "toy/0.0-Python-3.7.2",
                "toy/0.0-Python-2.7.15",
            ]
        );
        let first = plan.get("toy/0.0-Python-3.7.2").unwrap();
        assert_eq!(first.dependencies[0].module, "Python/3.7.2");
        assert!(first.dependencies[0].build_only);
        // the pinned version is a build dependency, not part of the
        // runtime closure
        assert_eq!(first.runtime_dependencies().count(), 0);
    }

    #[test]
    fn test_mismatched_multi_dep_lists_fail_resolution() {
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("toy", "0.0", system()).with_multi_deps(BTreeMap::from([
                ("Python".to_string(), vec!["3.7.2".to_string()]),
                (
                    "Java".to_string(),
                    vec!["11".to_string(), "8".to_string()],
                ),
            ])),
        ]);
        let err = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("toy", "0.0", system())],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Recipe(strata_recipe::RecipeError::MultiDepArityMismatch { .. })
        ));
    }

    #[test]
    fn test_minimal_toolchains_substitute_the_lowest_sufficient_level() {
        let gcc = ToolchainRef::new("GCC", "6.4.0-2.28");
        let gcccore = ToolchainRef::new("GCCcore", "6.4.0");
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("GCCcore", "6.4.0", system()),
            Recipe::new("GCC", "6.4.0-2.28", system())
                .with_dependencies(vec![Dependency::new("GCCcore", "6.4.0")]),
            // zlib has a recipe at the GCCcore level only.
            Recipe::new("zlib", "1.2.8", gcccore.clone()),
            Recipe::new("gzip", "1.5", gcc.clone())
                .with_dependencies(vec![Dependency::new("zlib", "1.2.8")]),
        ]);

        let mut cfg = settings();
        cfg.minimal_toolchains = true;
        let plan = resolve_with(
            &registry,
            &cfg,
            &[TargetSpec::new("gzip", "1.5", gcc.clone())],
        )
        .unwrap();

        let gzip = plan.get("gzip/1.5-GCC-6.4.0-2.28").unwrap();
        let zlib_ref = gzip
            .dependencies
            .iter()
            .find(|dep| dep.name == "zlib")
            .unwrap();
        assert_eq!(zlib_ref.module, "zlib/1.2.8-GCCcore-6.4.0");

        // Without the policy the declared toolchain is kept, and gzip's
        // zlib dependency cannot be resolved at the GCC level.
        let err = resolve_with(
            &registry,
            &settings(),
            &[TargetSpec::new("gzip", "1.5", gcc)],
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::RecipeNotFound { .. }));
    }

    #[test]
    fn test_minimal_toolchains_never_touch_explicit_dep_toolchains() {
        let gcc = ToolchainRef::new("GCC", "6.4.0-2.28");
        let gcccore = ToolchainRef::new("GCCcore", "6.4.0");
        let registry = MemoryRegistry::with_recipes([
            Recipe::new("GCCcore", "6.4.0", system()),
            Recipe::new("GCC", "6.4.0-2.28", system())
                .with_dependencies(vec![Dependency::new("GCCcore", "6.4.0")]),
            Recipe::new("zlib", "1.2.8", gcccore.clone()),
            Recipe::new("zlib", "1.2.8", gcc.clone()),
            Recipe::new("gzip", "1.5", gcc.clone()).with_dependencies(vec![
                Dependency::new("zlib", "1.2.8").with_toolchain(gcc.clone()),
            ]),
        ]);

        let mut cfg = settings();
        cfg.minimal_toolchains = true;
        let plan = resolve_with(
            &registry,
            &cfg,
            &[TargetSpec::new("gzip", "1.5", gcc)],
        )
        .unwrap();
        let gzip = plan.get("gzip/1.5-GCC-6.4.0-2.28").unwrap();
        let zlib_ref = gzip
            .dependencies
            .iter()
            .find(|dep| dep.name == "zlib")
            .unwrap();
        assert_eq!(zlib_ref.module, "zlib/1.2.8-GCC-6.4.0-2.28");
    }
}
