//! Toolchain hierarchy walks: which ancestor toolchains a build can fall
//! back to, and at which versions.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use strata_config::ResolveSettings;
use strata_recipe::{
    RecipeRegistry, SubtoolchainSpec, ToolchainRef, ToolchainTable, SYSTEM_TOOLCHAIN_NAME,
};

use crate::{ResolveError, ResolveResult};

/// Determine the version of one subtoolchain layer of `current`.
///
/// `candidates` are the `(name, version)` pairs found among the
/// dependencies of the current-level toolchain. For an alternation spec
/// the first listed name with a match wins. Returns:
///
/// - `Some(version)` when exactly one candidate version matches,
/// - `Some("")` for the `system` layer when the "add system to minimal
///   toolchains" policy is active,
/// - `None` when no version applies (system layer without the policy, or
///   an optional subtoolchain absent from the candidates).
///
/// Several distinct candidate versions of one subtoolchain are an error,
/// as is an absent subtoolchain that is neither optional nor `system`.
pub fn subtoolchain_version(
    current: &ToolchainRef,
    spec: &SubtoolchainSpec,
    table: &ToolchainTable,
    candidates: &[ToolchainRef],
    settings: &ResolveSettings,
) -> ResolveResult<Option<String>> {
    Ok(resolve_spec(current, spec, table, candidates, settings)?.map(|(_, version)| version))
}

/// Like [`subtoolchain_version`], but keeps the matched name so the
/// hierarchy walk knows which alternative to descend into.
fn resolve_spec(
    current: &ToolchainRef,
    spec: &SubtoolchainSpec,
    table: &ToolchainTable,
    candidates: &[ToolchainRef],
    settings: &ResolveSettings,
) -> ResolveResult<Option<(String, String)>> {
    let add_system = settings.add_system_to_minimal_toolchains;

    if current.is_system() {
        // The system toolchain has nothing below it.
        let names_system = spec.names().iter().any(|n| n == SYSTEM_TOOLCHAIN_NAME);
        if add_system && names_system {
            return Ok(Some((SYSTEM_TOOLCHAIN_NAME.to_string(), String::new())));
        }
        return Ok(None);
    }

    let mut resolved: Option<(String, String)> = None;
    let mut saw_system = false;

    for name in spec.names() {
        if name == SYSTEM_TOOLCHAIN_NAME {
            saw_system = true;
            if add_system {
                resolved = Some((name.clone(), String::new()));
            }
        } else {
            let versions: BTreeSet<&str> = candidates
                .iter()
                .filter(|c| &c.name == name)
                .map(|c| c.version.as_str())
                .collect();
            match versions.len() {
                0 => {}
                1 => {
                    let version = versions.into_iter().next().unwrap_or_default();
                    resolved = Some((name.clone(), version.to_string()));
                }
                _ => {
                    return Err(ResolveError::MultipleSubtoolchainVersions {
                        subtoolchain: name.clone(),
                        toolchain: current.name.clone(),
                        versions: versions.into_iter().collect::<Vec<_>>().join(", "),
                    });
                }
            }
        }
        if resolved.is_some() {
            break;
        }
    }

    if resolved.is_none() && !saw_system {
        let all_optional = spec.names().iter().all(|name| table.is_optional(name));
        if !all_optional {
            return Err(ResolveError::NoSubtoolchainVersion {
                subtoolchain: spec.primary().to_string(),
                toolchain: current.name.clone(),
            });
        }
    }

    Ok(resolved)
}

/// Walk the ancestor chain of `toolchain`, most minimal first.
///
/// Each level's subtoolchain versions are read from the dependencies of
/// that level's own recipe. The system toolchain appears at the front
/// only when the "add system to minimal toolchains" policy is active.
/// Parallel subtoolchains are each descended breadth-first; an ancestor
/// reachable through several branches appears once, where first
/// discovered.
pub fn toolchain_hierarchy(
    toolchain: &ToolchainRef,
    table: &ToolchainTable,
    registry: &dyn RecipeRegistry,
    settings: &ResolveSettings,
) -> ResolveResult<Vec<ToolchainRef>> {
    if toolchain.is_system() {
        return Ok(vec![ToolchainRef::system()]);
    }

    let mut chain: Vec<ToolchainRef> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut include_system = false;
    // Each frontier entry carries the names on its path from the root,
    // so a converging branch can be told apart from a definition loop.
    let mut frontier: VecDeque<(ToolchainRef, BTreeSet<String>)> = VecDeque::new();
    seen.insert(toolchain.name.clone());
    frontier.push_back((toolchain.clone(), BTreeSet::new()));

    while let Some((current, ancestors)) = frontier.pop_front() {
        let def = table
            .get(&current.name)
            .ok_or_else(|| ResolveError::UnknownToolchain(current.name.clone()))?;
        chain.push(current.clone());

        if def.subtoolchains.is_empty() {
            continue;
        }

        // Subtoolchain versions come from the dependencies of this
        // level's own recipe.
        let recipe = registry
            .lookup(&current.name, &current.version, "", &ToolchainRef::system())
            .ok_or_else(|| ResolveError::RecipeNotFound {
                name: current.name.clone(),
                version: current.version.clone(),
                toolchain: ToolchainRef::system().to_string(),
            })?;
        let mut candidates = Vec::new();
        for dep in recipe.all_dependencies() {
            if let Some(version) = dep.version.select(&dep.name, settings.arch)? {
                candidates.push(ToolchainRef::new(dep.name.clone(), version));
            }
        }

        let mut path = ancestors;
        path.insert(current.name.clone());
        for spec in &def.subtoolchains {
            match resolve_spec(&current, spec, table, &candidates, settings)? {
                Some((name, _)) if name == SYSTEM_TOOLCHAIN_NAME => {
                    include_system = true;
                }
                Some((name, version)) => {
                    if path.contains(&name) {
                        return Err(ResolveError::ToolchainCycle(toolchain.name.clone()));
                    }
                    // A name seen before converged from another branch
                    // and is walked just once.
                    if seen.insert(name.clone()) {
                        frontier.push_back((ToolchainRef::new(name, version), path.clone()));
                    }
                }
                None => {}
            }
        }
    }

    chain.reverse();
    if include_system {
        chain.insert(0, ToolchainRef::system());
    }
    debug!(
        "toolchain hierarchy of {}: {}",
        toolchain,
        chain
            .iter()
            .map(ToolchainRef::to_string)
            .collect::<Vec<_>>()
            .join(" < ")
    );
    Ok(chain)
}
