//! Deterministic topological ordering of resolved targets.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::fmt;

use serde::Serialize;

use crate::robot::BuildTarget;
use crate::{ResolveError, ResolveResult};

/// `dependent` needs `dependency` built first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DependencyEdge {
    pub dependent: String,
    pub dependency: String,
}

/// An ordered build plan: every target appears after all of its
/// dependencies. Plans are immutable once created and meant to be handed
/// to the orchestrator as a whole.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    targets: Vec<BuildTarget>,
    edges: Vec<DependencyEdge>,
}

impl BuildPlan {
    /// Targets in build order.
    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Module names in build order.
    pub fn modules(&self) -> impl Iterator<Item = &str> + '_ {
        self.targets.iter().map(|target| target.module.as_str())
    }

    pub fn get(&self, module: &str) -> Option<&BuildTarget> {
        self.targets.iter().find(|target| target.module == module)
    }

    pub fn position(&self, module: &str) -> Option<usize> {
        self.targets.iter().position(|target| target.module == module)
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for target in &self.targets {
            writeln!(f, " * {}", target.module)?;
        }
        Ok(())
    }
}

/// Emission key: requested targets in request order first, everything
/// else after, lexicographic within a rank.
type RankKey = (usize, String, String, String, String, String);

fn rank_key(target: &BuildTarget, request_index: &BTreeMap<String, usize>) -> RankKey {
    (
        request_index
            .get(&target.module)
            .copied()
            .unwrap_or(usize::MAX),
        target.name.clone(),
        target.version.clone(),
        target.toolchain.name.clone(),
        target.toolchain.version.clone(),
        target.module.clone(),
    )
}

/// Order `targets` topologically along `edges`.
///
/// Among simultaneously eligible targets the rank key decides, so equal
/// inputs always produce the identical order. Remaining targets after the
/// walk indicate a cycle.
pub(crate) fn order_targets(
    mut targets: BTreeMap<String, BuildTarget>,
    edges: BTreeSet<(String, String)>,
    request_index: BTreeMap<String, usize>,
) -> ResolveResult<BuildPlan> {
    let mut in_degree: BTreeMap<String, usize> =
        targets.keys().map(|module| (module.clone(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (dependent, dependency) in &edges {
        if let Some(degree) = in_degree.get_mut(dependent) {
            *degree += 1;
        }
        dependents
            .entry(dependency.clone())
            .or_default()
            .push(dependent.clone());
    }

    let mut ready: BinaryHeap<Reverse<RankKey>> = BinaryHeap::new();
    for (module, degree) in &in_degree {
        if *degree == 0 {
            if let Some(target) = targets.get(module) {
                ready.push(Reverse(rank_key(target, &request_index)));
            }
        }
    }

    let mut ordered: Vec<BuildTarget> = Vec::with_capacity(targets.len());
    while let Some(Reverse(key)) = ready.pop() {
        let module = key.5;
        for dependent in dependents.get(&module).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    if let Some(target) = targets.get(dependent) {
                        ready.push(Reverse(rank_key(target, &request_index)));
                    }
                }
            }
        }
        if let Some(target) = targets.remove(&module) {
            ordered.push(target);
        }
    }

    if !targets.is_empty() {
        let chain = targets.keys().cloned().collect::<Vec<_>>().join(", ");
        return Err(ResolveError::DependencyCycle { chain });
    }

    Ok(BuildPlan {
        targets: ordered,
        edges: edges
            .into_iter()
            .map(|(dependent, dependency)| DependencyEdge {
                dependent,
                dependency,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_recipe::{ExternalModuleMetadata, ToolchainRef};

    fn target(module: &str) -> BuildTarget {
        let (name, version) = module.split_once('/').unwrap_or((module, "1.0"));
        BuildTarget {
            name: name.to_string(),
            version: version.to_string(),
            versionsuffix: String::new(),
            toolchain: ToolchainRef::system(),
            module: module.to_string(),
            label: format!("{name}-{version}"),
            hidden: false,
            external: false,
            metadata: ExternalModuleMetadata::default(),
            handler: None,
            dependencies: Vec::new(),
        }
    }

    fn graph(
        modules: &[&str],
        edges: &[(&str, &str)],
        requests: &[&str],
    ) -> (
        BTreeMap<String, BuildTarget>,
        BTreeSet<(String, String)>,
        BTreeMap<String, usize>,
    ) {
        let targets = modules
            .iter()
            .map(|m| (m.to_string(), target(m)))
            .collect();
        let edges = edges
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let request_index = requests
            .iter()
            .enumerate()
            .map(|(i, m)| (m.to_string(), i))
            .collect();
        (targets, edges, request_index)
    }

    #[test]
    fn test_dependencies_come_before_dependents() {
        let (targets, edges, requests) = graph(
            &["a/1", "b/1", "c/1"],
            &[("c/1", "b/1"), ("b/1", "a/1")],
            &["c/1"],
        );
        let plan = order_targets(targets, edges, requests).unwrap();
        assert_eq!(plan.modules().collect::<Vec<_>>(), vec!["a/1", "b/1", "c/1"]);
    }

    #[test]
    fn test_requested_order_breaks_ties() {
        let (targets, edges, requests) = graph(
            &["x/1", "m/1", "a/1"],
            &[],
            &["x/1", "m/1", "a/1"],
        );
        let plan = order_targets(targets, edges, requests).unwrap();
        assert_eq!(plan.modules().collect::<Vec<_>>(), vec!["x/1", "m/1", "a/1"]);
    }

    #[test]
    fn test_unrequested_targets_order_lexicographically() {
        let (targets, edges, requests) = graph(&["x/1", "m/1", "a/1"], &[], &[]);
        let plan = order_targets(targets, edges, requests).unwrap();
        assert_eq!(plan.modules().collect::<Vec<_>>(), vec!["a/1", "m/1", "x/1"]);
    }

    #[test]
    fn test_diamond_is_deterministic() {
        let (targets, edges, requests) = graph(
            &["base/1", "left/1", "right/1", "top/1"],
            &[
                ("left/1", "base/1"),
                ("right/1", "base/1"),
                ("top/1", "left/1"),
                ("top/1", "right/1"),
            ],
            &["top/1"],
        );
        let plan = order_targets(targets, edges, requests).unwrap();
        assert_eq!(
            plan.modules().collect::<Vec<_>>(),
            vec!["base/1", "left/1", "right/1", "top/1"]
        );
    }

    #[test]
    fn test_residual_targets_are_a_cycle_error() {
        let (targets, edges, requests) =
            graph(&["a/1", "b/1"], &[("a/1", "b/1"), ("b/1", "a/1")], &[]);
        let err = order_targets(targets, edges, requests).unwrap_err();
        assert!(matches!(err, ResolveError::DependencyCycle { .. }));
    }

    #[test]
    fn test_display_lists_modules_in_order() {
        let (targets, edges, requests) =
            graph(&["a/1", "b/1"], &[("b/1", "a/1")], &["b/1"]);
        let plan = order_targets(targets, edges, requests).unwrap();
        assert_eq!(plan.to_string(), " * a/1\n * b/1\n");
        insta::assert_snapshot!(
            plan.modules().collect::<Vec<_>>().join(", "),
            @"a/1, b/1"
        );
    }

    proptest! {
        /// Random DAGs (edges always point from higher to lower index)
        /// must order with every dependency before its dependent.
        #[test]
        fn test_topological_invariant_holds(
            node_count in 1usize..12,
            edge_seeds in proptest::collection::vec((0usize..12, 0usize..12), 0..30),
        ) {
            let modules: Vec<String> =
                (0..node_count).map(|i| format!("n{i}/1.0")).collect();
            let mut targets = BTreeMap::new();
            for module in &modules {
                targets.insert(module.clone(), target(module));
            }
            let mut edges = BTreeSet::new();
            for (a, b) in edge_seeds {
                let (a, b) = (a % node_count, b % node_count);
                if a != b {
                    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
                    edges.insert((modules[hi].clone(), modules[lo].clone()));
                }
            }

            let plan = order_targets(targets, edges.clone(), BTreeMap::new()).unwrap();
            prop_assert_eq!(plan.len(), node_count);
            for edge in plan.edges() {
                let dependency = plan.position(&edge.dependency).unwrap();
                let dependent = plan.position(&edge.dependent).unwrap();
                prop_assert!(dependency < dependent);
            }
        }
    }
}
