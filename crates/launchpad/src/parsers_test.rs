// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use rstest::rstest;

use super::*;

fn deps(kind: ManifestKind, content: &str) -> Vec<String> {
    parse(kind, Path::new("/project/manifest"), content)
        .expect("manifest should parse")
        .dependencies
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[rstest]
fn test_dependency_file_map() {
    let content = r#"
dependencies:
  nodejs.org: ^20
  python.org: 3.12
  gnu.org/make:
env:
  NODE_ENV: development
  PORT: 3000
"#;
    let parsed = parse(ManifestKind::Dependencies, Path::new("deps.yaml"), content).unwrap();
    let names: Vec<_> = parsed.dependencies.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["nodejs.org@^20", "python.org@3.12", "gnu.org/make@*"]);
    assert_eq!(parsed.env.get("NODE_ENV").map(String::as_str), Some("development"));
    assert_eq!(parsed.env.get("PORT").map(String::as_str), Some("3000"));
}

#[rstest]
fn test_dependency_file_list() {
    let content = "dependencies:\n  - nodejs.org@18\n  - bun.sh\n";
    assert_eq!(
        deps(ManifestKind::Dependencies, content),
        vec!["nodejs.org@18", "bun.sh@*"]
    );
}

#[rstest]
fn test_dependency_file_inline() {
    let content = "dependencies: nodejs.org@20 deno.land\n";
    assert_eq!(
        deps(ManifestKind::Dependencies, content),
        vec!["nodejs.org@20", "deno.land@*"]
    );
}

#[rstest]
#[case("")]
#[case("# nothing here\n")]
#[case("dependencies:\n")]
fn test_dependency_file_empty(#[case] content: &str) {
    assert!(deps(ManifestKind::Dependencies, content).is_empty());
}

#[rstest]
fn test_dependency_file_invalid() {
    let result = parse(
        ManifestKind::Dependencies,
        Path::new("deps.yaml"),
        "dependencies: [unclosed",
    );
    assert!(matches!(result, Err(Error::InvalidManifest { .. })));
}

#[rstest]
fn test_package_json() {
    let content = r#"{
        "name": "web",
        "engines": { "node": ">=18", "pnpm": ">=8" },
        "packageManager": "pnpm@8.6.0+sha256.abcdef"
    }"#;
    assert_eq!(
        deps(ManifestKind::PackageJson, content),
        vec!["nodejs.org@>=18", "pnpm.io@8.6.0"]
    );
}

#[rstest]
fn test_package_json_volta() {
    let content = r#"{ "volta": { "node": "20.11.0", "yarn": "1.22.19" } }"#;
    assert_eq!(
        deps(ManifestKind::PackageJson, content),
        vec!["nodejs.org@20.11.0", "yarnpkg.com@1.22.19"]
    );
}

#[rstest]
fn test_package_json_bare() {
    assert_eq!(deps(ManifestKind::PackageJson, "{}"), vec!["nodejs.org@*"]);
}

#[rstest]
fn test_package_json_malformed() {
    let result = parse(ManifestKind::PackageJson, Path::new("package.json"), "{ nope");
    assert!(matches!(result, Err(Error::InvalidManifest { .. })));
}

#[rstest]
fn test_deno_jsonc() {
    let content = r#"{
        // tasks
        "tasks": { "dev": "deno run main.ts", },
        /* imports */
        "imports": { "std/": "https://deno.land/std/" },
    }"#;
    assert_eq!(deps(ManifestKind::DenoJson, content), vec!["deno.land@*"]);
}

#[rstest]
fn test_strip_jsonc_keeps_strings() {
    let content = r#"{ "url": "https://example.com/*x*/", "a": [1, 2,], }"#;
    let stripped = strip_jsonc(content);
    let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
    assert_eq!(value["url"], "https://example.com/*x*/");
    assert_eq!(value["a"], serde_json::json!([1, 2]));
}

#[rstest]
fn test_pyproject_requires_python() {
    let content = "[project]\nname = \"x\"\nrequires-python = \">=3.11\"\n";
    assert_eq!(deps(ManifestKind::PyProject, content), vec!["python.org@>=3.11"]);
}

#[rstest]
fn test_pyproject_poetry() {
    let content = "[tool.poetry]\nname = \"x\"\n\n[tool.poetry.dependencies]\npython = \"^3.10\"\n";
    assert_eq!(
        deps(ManifestKind::PyProject, content),
        vec!["python.org@^3.10", "python-poetry.org@*"]
    );
}

#[rstest]
fn test_cargo_toml() {
    let content = "[package]\nname = \"x\"\nrust-version = \"1.75\"\n";
    assert_eq!(deps(ManifestKind::CargoToml, content), vec!["rust-lang.org@>=1.75"]);
}

#[rstest]
fn test_go_mod() {
    let content = "module example.com/x\n\ngo 1.22 // minimum\n\nrequire golang.org/x/mod v0.14.0\n";
    assert_eq!(deps(ManifestKind::GoMod, content), vec!["go.dev@>=1.22"]);
}

#[rstest]
fn test_composer_json() {
    let content = r#"{ "require": { "php": "^8.2", "monolog/monolog": "^3" } }"#;
    assert_eq!(
        deps(ManifestKind::ComposerJson, content),
        vec!["php.net@^8.2", "getcomposer.org@*"]
    );
}

#[rstest]
fn test_gemfile() {
    let content = "source 'https://rubygems.org'\nruby '3.2.2'\ngem 'rails'\n";
    assert_eq!(
        deps(ManifestKind::Gemfile, content),
        vec!["ruby-lang.org@3.2.2", "bundler.io@*"]
    );
}

#[rstest]
fn test_pipfile() {
    let content = "[packages]\nrequests = \"*\"\n\n[requires]\npython_version = \"3.11\"\n";
    assert_eq!(
        deps(ManifestKind::Pipfile, content),
        vec!["python.org@3.11", "pipenv.pypa.io@*"]
    );
}

#[rstest]
#[case(ManifestKind::PnpmLock, vec!["nodejs.org@*", "pnpm.io@*"])]
#[case(ManifestKind::BunLock, vec!["bun.sh@*"])]
#[case(ManifestKind::GoSum, vec!["go.dev@*"])]
#[case(ManifestKind::Justfile, vec!["just.systems@*"])]
fn test_presence_only(#[case] kind: ManifestKind, #[case] expected: Vec<&str>) {
    assert!(!kind.reads_content());
    assert_eq!(deps(kind, ""), expected);
}

#[rstest]
#[case("20.11.0\n", Some("20.11.0"))]
#[case("v18\n", Some("18"))]
#[case("# pinned\n\n  3.12.1  \n", Some("3.12.1"))]
#[case("lts/hydrogen\n", Some("*"))]
#[case("stable", Some("*"))]
#[case("vim", Some("vim"))]
#[case("# only a comment\n\n", None)]
#[case("", None)]
fn test_pinned_version(#[case] content: &str, #[case] expected: Option<&str>) {
    assert_eq!(pinned_version(content).as_deref(), expected);
}

#[rstest]
fn test_empty_pin_is_invalid() {
    let result = parse(ManifestKind::NodeVersion, Path::new(".nvmrc"), "\n# nothing\n");
    assert!(matches!(result, Err(Error::InvalidManifest { .. })));
}

#[rstest]
fn test_python_pin() {
    assert_eq!(
        deps(ManifestKind::PythonVersion, "3.12.2\n"),
        vec!["python.org@3.12.2"]
    );
}

#[rstest]
fn test_python_pin_with_comments() {
    assert_eq!(
        deps(ManifestKind::PythonVersion, "# comment\n3.11.0\n# 3.10.0"),
        vec!["python.org@3.11.0"]
    );
}
