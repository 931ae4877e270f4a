// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Per-format manifest parsers.
//!
//! Every parser turns the content of one file into a [`ParsedManifest`].
//! Parsers never touch the filesystem, so a failure in one manifest only
//! ever affects that manifest.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::manifest::{Dependency, ManifestKind, ParsedManifest};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./parsers_test.rs"]
mod parsers_test;

pub const NODE: &str = "nodejs.org";
pub const NPM: &str = "npmjs.com";
pub const PNPM: &str = "pnpm.io";
pub const YARN: &str = "yarnpkg.com";
pub const BUN: &str = "bun.sh";
pub const DENO: &str = "deno.land";
pub const PYTHON: &str = "python.org";
pub const POETRY: &str = "python-poetry.org";
pub const PIPENV: &str = "pipenv.pypa.io";
pub const UV: &str = "astral.sh/uv";
pub const RUST: &str = "rust-lang.org";
pub const GO: &str = "go.dev";
pub const PHP: &str = "php.net";
pub const COMPOSER: &str = "getcomposer.org";
pub const RUBY: &str = "ruby-lang.org";
pub const BUNDLER: &str = "bundler.io";
pub const MAKE: &str = "gnu.org/make";
pub const JUST: &str = "just.systems";
pub const TASK: &str = "taskfile.dev";
pub const TERRAFORM: &str = "terraform.io";

/// Parse the content of a manifest of the given kind.
pub fn parse(kind: ManifestKind, path: &Path, content: &str) -> Result<ParsedManifest> {
    let mut parsed = ParsedManifest::new(kind, path.to_path_buf());
    let invalid = |message: String| Error::InvalidManifest {
        path: path.to_path_buf(),
        message,
    };

    use ManifestKind::*;
    match kind {
        Dependencies => parse_dependency_file(content, &mut parsed).map_err(invalid)?,
        PackageJson => parse_package_json(content, &mut parsed).map_err(invalid)?,
        DenoJson => parse_deno_json(content, &mut parsed).map_err(invalid)?,
        PyProject => parse_pyproject(content, &mut parsed).map_err(invalid)?,
        CargoToml => parse_cargo_toml(content, &mut parsed).map_err(invalid)?,
        GoMod => parse_go_mod(content, &mut parsed),
        ComposerJson => parse_composer_json(content, &mut parsed).map_err(invalid)?,
        Gemfile => parse_gemfile(content, &mut parsed),
        Pipfile => parse_pipfile(content, &mut parsed).map_err(invalid)?,
        PnpmLock => {
            parsed.require(NODE, Dependency::ANY);
            parsed.require(PNPM, Dependency::ANY);
        }
        YarnLock => {
            parsed.require(NODE, Dependency::ANY);
            parsed.require(YARN, Dependency::ANY);
        }
        NpmLock => {
            parsed.require(NODE, Dependency::ANY);
            parsed.require(NPM, Dependency::ANY);
        }
        BunLock => parsed.require(BUN, Dependency::ANY),
        CargoLock => parsed.require(RUST, Dependency::ANY),
        PoetryLock => {
            parsed.require(PYTHON, Dependency::ANY);
            parsed.require(POETRY, Dependency::ANY);
        }
        UvLock => {
            parsed.require(PYTHON, Dependency::ANY);
            parsed.require(UV, Dependency::ANY);
        }
        Requirements => parsed.require(PYTHON, Dependency::ANY),
        GemfileLock => {
            parsed.require(RUBY, Dependency::ANY);
            parsed.require(BUNDLER, Dependency::ANY);
        }
        GoSum => parsed.require(GO, Dependency::ANY),
        Makefile => parsed.require(MAKE, Dependency::ANY),
        Justfile => parsed.require(JUST, Dependency::ANY),
        Taskfile => parsed.require(TASK, Dependency::ANY),
        NodeVersion => parse_pin(NODE, content, &mut parsed).map_err(invalid)?,
        PythonVersion => parse_pin(PYTHON, content, &mut parsed).map_err(invalid)?,
        RubyVersion => parse_pin(RUBY, content, &mut parsed).map_err(invalid)?,
        GoVersion => parse_pin(GO, content, &mut parsed).map_err(invalid)?,
        TerraformVersion => parse_pin(TERRAFORM, content, &mut parsed).map_err(invalid)?,
        BunVersion => parse_pin(BUN, content, &mut parsed).map_err(invalid)?,
        RustToolchain => parse_pin(RUST, content, &mut parsed).map_err(invalid)?,
    }

    Ok(parsed)
}

/// Dedicated dependency file, as found on disk.
#[derive(Debug, Default, Deserialize)]
struct DependencyFile {
    #[serde(default)]
    dependencies: Option<DependencyList>,
    #[serde(default)]
    env: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyList {
    /// `nodejs.org: ^20`
    Map(IndexMap<String, serde_yaml::Value>),
    /// `- nodejs.org@^20`
    List(Vec<String>),
    /// `nodejs.org@^20 python.org@3`
    Inline(String),
}

fn parse_dependency_file(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    // comment-only and empty documents declare nothing
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|err| err.to_string())?;
    if value.is_null() {
        return Ok(());
    }
    let file: DependencyFile = serde_yaml::from_value(value).map_err(|err| err.to_string())?;

    match file.dependencies {
        None => {}
        Some(DependencyList::Map(map)) => {
            for (name, value) in map {
                let constraint = yaml_scalar(&value)
                    .ok_or_else(|| format!("constraint for {name} must be a scalar"))?
                    .unwrap_or_else(|| Dependency::ANY.to_string());
                parsed.require(name, constraint);
            }
        }
        Some(DependencyList::List(items)) => {
            for item in items {
                let dep = Dependency::parse(&item);
                parsed.require(dep.name, dep.constraint);
            }
        }
        Some(DependencyList::Inline(line)) => {
            for item in line.split_whitespace() {
                let dep = Dependency::parse(item);
                parsed.require(dep.name, dep.constraint);
            }
        }
    }

    for (name, value) in file.env {
        let value = yaml_scalar(&value)
            .ok_or_else(|| format!("env value for {name} must be a scalar"))?
            .unwrap_or_default();
        parsed.env.insert(name, value);
    }
    Ok(())
}

/// `Some(None)` for null, `None` for non-scalars.
fn yaml_scalar(value: &serde_yaml::Value) -> Option<Option<String>> {
    match value {
        serde_yaml::Value::Null => Some(None),
        serde_yaml::Value::String(s) => Some(Some(s.clone())),
        serde_yaml::Value::Number(n) => Some(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Some(Some(b.to_string())),
        _ => None,
    }
}

/// Maps a JavaScript engine or package manager name to its tool.
fn node_tool(name: &str) -> Option<&'static str> {
    match name {
        "node" => Some(NODE),
        "npm" => Some(NPM),
        "pnpm" => Some(PNPM),
        "yarn" => Some(YARN),
        "bun" => Some(BUN),
        "deno" => Some(DENO),
        _ => None,
    }
}

fn parse_package_json(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let json: serde_json::Value = serde_json::from_str(content).map_err(|err| err.to_string())?;
    let engines = json.get("engines").and_then(|v| v.as_object());
    let volta = json.get("volta").and_then(|v| v.as_object());

    let node = engines
        .and_then(|e| e.get("node"))
        .or_else(|| volta.and_then(|v| v.get("node")))
        .and_then(|v| v.as_str())
        .unwrap_or(Dependency::ANY);
    parsed.require(NODE, node);

    // pnpm@8.6.0+sha256.abc
    if let Some(manager) = json.get("packageManager").and_then(|v| v.as_str()) {
        let manager = manager.split('+').next().unwrap_or(manager);
        let dep = Dependency::parse(manager);
        if let Some(tool) = node_tool(&dep.name) {
            parsed.require(tool, dep.constraint);
        }
    }

    for table in [engines, volta].into_iter().flatten() {
        for (name, value) in table {
            if let (Some(tool), Some(constraint)) = (node_tool(name), value.as_str()) {
                parsed.require(tool, constraint);
            }
        }
    }
    Ok(())
}

fn parse_deno_json(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let stripped = strip_jsonc(content);
    let _: serde_json::Value = serde_json::from_str(&stripped).map_err(|err| err.to_string())?;
    parsed.require(DENO, Dependency::ANY);
    Ok(())
}

fn parse_pyproject(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let doc: toml::Table = content.parse().map_err(|err: toml::de::Error| err.message().to_string())?;
    let tool = doc.get("tool").and_then(|t| t.as_table());
    let poetry = tool.and_then(|t| t.get("poetry")).and_then(|p| p.as_table());

    let python = doc
        .get("project")
        .and_then(|p| p.get("requires-python"))
        .or_else(|| {
            poetry
                .and_then(|p| p.get("dependencies"))
                .and_then(|d| d.get("python"))
        })
        .and_then(|v| v.as_str())
        .unwrap_or(Dependency::ANY);
    parsed.require(PYTHON, python);

    if poetry.is_some() {
        parsed.require(POETRY, Dependency::ANY);
    }
    if tool.and_then(|t| t.get("uv")).is_some() {
        parsed.require(UV, Dependency::ANY);
    }
    Ok(())
}

fn parse_pipfile(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let doc: toml::Table = content.parse().map_err(|err: toml::de::Error| err.message().to_string())?;
    let python = doc
        .get("requires")
        .and_then(|r| r.get("python_full_version").or_else(|| r.get("python_version")))
        .and_then(|v| v.as_str())
        .unwrap_or(Dependency::ANY);
    parsed.require(PYTHON, python);
    parsed.require(PIPENV, Dependency::ANY);
    Ok(())
}

fn parse_cargo_toml(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let doc: toml::Table = content.parse().map_err(|err: toml::de::Error| err.message().to_string())?;
    let rust_version = doc
        .get("package")
        .and_then(|p| p.get("rust-version"))
        .or_else(|| {
            doc.get("workspace")
                .and_then(|w| w.get("package"))
                .and_then(|p| p.get("rust-version"))
        })
        .and_then(|v| v.as_str());

    match rust_version {
        Some(version) => parsed.require(RUST, format!(">={version}")),
        None => parsed.require(RUST, Dependency::ANY),
    }
    Ok(())
}

fn parse_go_mod(content: &str, parsed: &mut ParsedManifest) {
    let version = content
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default().trim())
        .find_map(|line| line.strip_prefix("go "))
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match version {
        Some(version) => parsed.require(GO, format!(">={version}")),
        None => parsed.require(GO, Dependency::ANY),
    }
}

fn parse_composer_json(content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let json: serde_json::Value = serde_json::from_str(content).map_err(|err| err.to_string())?;
    let php = json
        .get("require")
        .and_then(|r| r.get("php"))
        .and_then(|v| v.as_str())
        .unwrap_or(Dependency::ANY);
    parsed.require(PHP, php);
    parsed.require(COMPOSER, Dependency::ANY);
    Ok(())
}

static GEMFILE_RUBY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*ruby\s+["']([^"']+)["']"#).expect("valid Gemfile ruby pattern")
});

fn parse_gemfile(content: &str, parsed: &mut ParsedManifest) {
    let ruby = GEMFILE_RUBY
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(Dependency::ANY);
    parsed.require(RUBY, ruby);
    parsed.require(BUNDLER, Dependency::ANY);
}

fn parse_pin(tool: &str, content: &str, parsed: &mut ParsedManifest) -> std::result::Result<(), String> {
    let version = pinned_version(content).ok_or_else(|| "no version found".to_string())?;
    parsed.require(tool, version);
    Ok(())
}

/// Extract the version from the content of a version pin file.
///
/// Blank lines and `#` comments are skipped and a leading `v` is dropped.
/// Aliases such as `lts/*`, `node` or `stable` accept any version.
pub fn pinned_version(content: &str) -> Option<String> {
    let token = content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .find(|line| !line.is_empty())?
        .split_whitespace()
        .next()?;

    if token.starts_with("lts") || matches!(token, "node" | "stable" | "latest" | "system") {
        return Some(Dependency::ANY.to_string());
    }
    let token = match token.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => token,
    };
    Some(token.to_string())
}

/// Remove comments and trailing commas from JSONC text.
pub fn strip_jsonc(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.get(i + 1) {
                    out.push(*escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}
