//! End-to-end orchestration tests over the local backend

use std::fs;
use std::path::Path;

use strata_config::{JobSettings, ResolveSettings};
use strata_jobs::{JobError, JobState, LocalBackend, Orchestrator};
use strata_recipe::{Dependency, MemoryRegistry, Recipe, ToolchainRef, ToolchainTable};
use strata_resolver::{BuildPlan, Resolver, TargetSpec};

// Test helper: resolve requested name/version pairs against a registry.
fn resolve(recipes: Vec<Recipe>, requests: &[(&str, &str)]) -> BuildPlan {
    let registry = MemoryRegistry::with_recipes(recipes);
    let toolchains = ToolchainTable::builtin();
    let settings = ResolveSettings::default();
    let specs: Vec<TargetSpec> = requests
        .iter()
        .map(|(name, version)| TargetSpec::new(*name, *version, ToolchainRef::system()))
        .collect();
    Resolver::new(&registry, &toolchains, &settings)
        .resolve(&specs)
        .unwrap()
}

// Test helper: local-backend settings writing job output under a directory.
fn job_settings(template: &str, output_dir: &Path) -> JobSettings {
    JobSettings {
        command_template: template.to_string(),
        output_dir: Some(output_dir.to_path_buf()),
        poll_interval_secs: 0,
        ..JobSettings::default()
    }
}

#[test]
fn test_resolved_plan_builds_end_to_end() {
    let recipes = vec![
        Recipe::new("zlib", "1.2.11", ToolchainRef::system()),
        Recipe::new("gzip", "1.5", ToolchainRef::system())
            .with_dependencies(vec![Dependency::new("zlib", "1.2.11")]),
    ];
    let plan = resolve(recipes, &[("gzip", "1.5")]);
    assert_eq!(plan.position("zlib/1.2.11"), Some(0));
    assert_eq!(plan.position("gzip/1.5"), Some(1));

    let dir = tempfile::tempdir().unwrap();
    let settings = job_settings("echo building {module}", dir.path());
    let mut backend = LocalBackend::new(&settings);
    let report = Orchestrator::new(&mut backend, settings).run(plan).unwrap();

    assert!(report.is_success());
    assert_eq!(report.jobs.len(), 2);
    let log = fs::read_to_string(dir.path().join("zlib-1.2.11.out")).unwrap();
    assert_eq!(log.trim(), "building zlib/1.2.11");
}

#[test]
fn test_failures_cascade_through_the_plan() {
    let recipes = vec![
        Recipe::new("zlib", "1.2.11", ToolchainRef::system()),
        Recipe::new("gzip", "1.5", ToolchainRef::system())
            .with_dependencies(vec![Dependency::new("zlib", "1.2.11")]),
        Recipe::new("bzip2", "1.0.6", ToolchainRef::system()),
    ];
    let plan = resolve(recipes, &[("gzip", "1.5"), ("bzip2", "1.0.6")]);

    let dir = tempfile::tempdir().unwrap();
    // the command fails for zlib and only zlib
    let settings = job_settings("test {name} != zlib", dir.path());
    let mut backend = LocalBackend::new(&settings);
    let err = Orchestrator::new(&mut backend, settings).run(plan).unwrap_err();

    assert_eq!(err.to_string(), "2 jobs failed: zlib-1.2.11, gzip-1.5");
    match err {
        JobError::JobsFailed { report, .. } => {
            assert_eq!(report.states.get("zlib/1.2.11"), Some(&JobState::Failed));
            assert_eq!(report.states.get("gzip/1.5"), Some(&JobState::Failed));
            assert_eq!(report.states.get("bzip2/1.0.6"), Some(&JobState::Succeeded));
        }
        other => panic!("unexpected error: {other}"),
    }
    // gzip never ran, so it wrote no output
    assert!(!dir.path().join("gzip-1.5.out").exists());
}

#[test]
fn test_hidden_flags_and_external_modules_flow_through() {
    let app = Recipe::new("app", "0.1", ToolchainRef::system()).with_dependencies(vec![
        Dependency::new("zlib", "1.2.11").hidden(),
        Dependency::external("cray-mpich", "7.7.0"),
    ]);
    let recipes = vec![Recipe::new("zlib", "1.2.11", ToolchainRef::system()), app];
    let plan = resolve(recipes, &[("app", "0.1")]);

    let dir = tempfile::tempdir().unwrap();
    let settings = job_settings("echo {label}", dir.path());
    let mut backend = LocalBackend::new(&settings);
    let report = Orchestrator::new(&mut backend, settings).run(plan).unwrap();

    assert!(report.is_success());
    assert_eq!(report.external, vec!["cray-mpich/7.7.0".to_string()]);
    let log = fs::read_to_string(dir.path().join("zlib-1.2.11.out")).unwrap();
    assert_eq!(log.trim(), "zlib-1.2.11 --hidden");
    let log = fs::read_to_string(dir.path().join("app-0.1.out")).unwrap();
    assert_eq!(log.trim(), "app-0.1");
}
