// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use rstest::rstest;

use super::*;

#[rstest]
#[case("nodejs.org@^20", "nodejs.org", "^20")]
#[case("python.org", "python.org", "*")]
#[case("@scope/pkg@1.2", "@scope/pkg", "1.2")]
#[case("@scope/pkg", "@scope/pkg", "*")]
#[case("go.dev@", "go.dev", "*")]
fn test_dependency_parse(#[case] spec: &str, #[case] name: &str, #[case] constraint: &str) {
    let dep = Dependency::parse(spec);
    assert_eq!(dep.name, name);
    assert_eq!(dep.constraint, constraint);
}

#[rstest]
fn test_registry_is_ordered_by_category() {
    let categories: Vec<_> = REGISTRY.iter().map(|(_, k)| k.category()).collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted, "registry must list categories in priority order");
}

#[rstest]
fn test_registry_has_no_duplicate_filenames() {
    let mut names: Vec<_> = REGISTRY.iter().map(|(n, _)| *n).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), REGISTRY.len());
}

#[rstest]
fn test_merge_first_declaration_wins() {
    let mut high = ParsedManifest::new(ManifestKind::Dependencies, PathBuf::from("/p/deps.yaml"));
    high.require("nodejs.org", "^20");
    high.env.insert("MODE".into(), "high".into());

    let mut low = ParsedManifest::new(ManifestKind::NodeVersion, PathBuf::from("/p/.nvmrc"));
    low.require("nodejs.org", "18");
    low.require("pnpm.io", "*");
    low.env.insert("MODE".into(), "low".into());
    low.env.insert("EXTRA".into(), "1".into());

    let record = merge_manifests(vec![high, low]).expect("record");
    assert_eq!(record.kind, ManifestKind::Dependencies);
    assert_eq!(record.file_path, PathBuf::from("/p/deps.yaml"));
    assert_eq!(
        record.declared_dependencies,
        vec![
            Dependency::new("nodejs.org", "^20"),
            Dependency::new("pnpm.io", "*"),
        ]
    );
    assert_eq!(record.declared_env.get("MODE").map(String::as_str), Some("high"));
    assert_eq!(record.declared_env.get("EXTRA").map(String::as_str), Some("1"));
    assert_eq!(record.sources.len(), 2);
}

#[rstest]
fn test_merge_nothing() {
    assert!(merge_manifests(Vec::new()).is_none());
}

#[rstest]
fn test_require_ignores_repeats() {
    let mut parsed = ParsedManifest::new(ManifestKind::PackageJson, PathBuf::from("package.json"));
    parsed.require("nodejs.org", ">=18");
    parsed.require("nodejs.org", "*");
    assert_eq!(parsed.dependencies, vec![Dependency::new("nodejs.org", ">=18")]);
}
