// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Manifest kinds, the priority registry, and the normalized manifest record.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Version-control markers. They bound the upward project search but are
/// never parsed for dependencies.
pub const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

/// Every recognized manifest filename, highest priority first.
///
/// When several of these exist in one directory they are all parsed and
/// merged; an earlier entry wins any conflict with a later one.
pub const REGISTRY: &[(&str, ManifestKind)] = &[
    // Dedicated dependency files
    ("dependencies.yaml", ManifestKind::Dependencies),
    ("dependencies.yml", ManifestKind::Dependencies),
    ("deps.yaml", ManifestKind::Dependencies),
    ("deps.yml", ManifestKind::Dependencies),
    ("pkgx.yaml", ManifestKind::Dependencies),
    ("pkgx.yml", ManifestKind::Dependencies),
    (".pkgx.yaml", ManifestKind::Dependencies),
    (".pkgx.yml", ManifestKind::Dependencies),
    ("launchpad.yaml", ManifestKind::Dependencies),
    (".launchpad.yaml", ManifestKind::Dependencies),
    // Package descriptors
    ("package.json", ManifestKind::PackageJson),
    ("deno.jsonc", ManifestKind::DenoJson),
    ("deno.json", ManifestKind::DenoJson),
    ("pyproject.toml", ManifestKind::PyProject),
    ("Cargo.toml", ManifestKind::CargoToml),
    ("go.mod", ManifestKind::GoMod),
    ("composer.json", ManifestKind::ComposerJson),
    ("Gemfile", ManifestKind::Gemfile),
    // Lockfiles and ecosystem manifests
    ("pnpm-lock.yaml", ManifestKind::PnpmLock),
    ("yarn.lock", ManifestKind::YarnLock),
    ("bun.lockb", ManifestKind::BunLock),
    ("bun.lock", ManifestKind::BunLock),
    ("package-lock.json", ManifestKind::NpmLock),
    ("Cargo.lock", ManifestKind::CargoLock),
    ("Pipfile", ManifestKind::Pipfile),
    ("poetry.lock", ManifestKind::PoetryLock),
    ("uv.lock", ManifestKind::UvLock),
    ("requirements.txt", ManifestKind::Requirements),
    ("Gemfile.lock", ManifestKind::GemfileLock),
    ("go.sum", ManifestKind::GoSum),
    // Task runners
    ("Makefile", ManifestKind::Makefile),
    ("justfile", ManifestKind::Justfile),
    ("Taskfile.yml", ManifestKind::Taskfile),
    // Version pins
    (".nvmrc", ManifestKind::NodeVersion),
    (".node-version", ManifestKind::NodeVersion),
    (".python-version", ManifestKind::PythonVersion),
    (".ruby-version", ManifestKind::RubyVersion),
    (".go-version", ManifestKind::GoVersion),
    (".terraform-version", ManifestKind::TerraformVersion),
    (".bun-version", ManifestKind::BunVersion),
    ("rust-toolchain", ManifestKind::RustToolchain),
];

/// Broad family a manifest kind belongs to, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Dependencies,
    PackageDescriptor,
    Lockfile,
    TaskRunner,
    VersionPin,
}

/// Every manifest format launchpad understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
    Dependencies,
    PackageJson,
    DenoJson,
    PyProject,
    CargoToml,
    GoMod,
    ComposerJson,
    Gemfile,
    PnpmLock,
    YarnLock,
    BunLock,
    NpmLock,
    CargoLock,
    Pipfile,
    PoetryLock,
    UvLock,
    Requirements,
    GemfileLock,
    GoSum,
    Makefile,
    Justfile,
    Taskfile,
    NodeVersion,
    PythonVersion,
    RubyVersion,
    GoVersion,
    TerraformVersion,
    BunVersion,
    RustToolchain,
}

impl ManifestKind {
    pub fn category(&self) -> Category {
        use ManifestKind::*;
        match self {
            Dependencies => Category::Dependencies,
            PackageJson | DenoJson | PyProject | CargoToml | GoMod | ComposerJson | Gemfile => {
                Category::PackageDescriptor
            }
            PnpmLock | YarnLock | BunLock | NpmLock | CargoLock | Pipfile | PoetryLock | UvLock
            | Requirements | GemfileLock | GoSum => Category::Lockfile,
            Makefile | Justfile | Taskfile => Category::TaskRunner,
            NodeVersion | PythonVersion | RubyVersion | GoVersion | TerraformVersion
            | BunVersion | RustToolchain => Category::VersionPin,
        }
    }

    /// The ecosystem this manifest describes, for display.
    pub fn ecosystem(&self) -> &'static str {
        use ManifestKind::*;
        match self {
            Dependencies => "launchpad",
            PackageJson | PnpmLock | YarnLock | NpmLock | NodeVersion => "node",
            BunLock | BunVersion => "bun",
            DenoJson => "deno",
            PyProject | Pipfile | PoetryLock | UvLock | Requirements | PythonVersion => "python",
            CargoToml | CargoLock | RustToolchain => "rust",
            GoMod | GoSum | GoVersion => "go",
            ComposerJson => "php",
            Gemfile | GemfileLock | RubyVersion => "ruby",
            Makefile => "make",
            Justfile => "just",
            Taskfile => "task",
            TerraformVersion => "terraform",
        }
    }

    /// Whether the file content carries information, or only its presence.
    pub fn reads_content(&self) -> bool {
        use ManifestKind::*;
        !matches!(
            self,
            PnpmLock
                | YarnLock
                | BunLock
                | NpmLock
                | CargoLock
                | PoetryLock
                | UvLock
                | Requirements
                | GemfileLock
                | GoSum
                | Makefile
                | Justfile
                | Taskfile
        )
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ManifestKind::*;
        let name = match self {
            Dependencies => "dependencies",
            PackageJson => "package.json",
            DenoJson => "deno.json",
            PyProject => "pyproject.toml",
            CargoToml => "Cargo.toml",
            GoMod => "go.mod",
            ComposerJson => "composer.json",
            Gemfile => "Gemfile",
            PnpmLock => "pnpm-lock.yaml",
            YarnLock => "yarn.lock",
            BunLock => "bun.lock",
            NpmLock => "package-lock.json",
            CargoLock => "Cargo.lock",
            Pipfile => "Pipfile",
            PoetryLock => "poetry.lock",
            UvLock => "uv.lock",
            Requirements => "requirements.txt",
            GemfileLock => "Gemfile.lock",
            GoSum => "go.sum",
            Makefile => "Makefile",
            Justfile => "justfile",
            Taskfile => "Taskfile.yml",
            NodeVersion => "node version pin",
            PythonVersion => "python version pin",
            RubyVersion => "ruby version pin",
            GoVersion => "go version pin",
            TerraformVersion => "terraform version pin",
            BunVersion => "bun version pin",
            RustToolchain => "rust-toolchain",
        };
        f.write_str(name)
    }
}

/// One required tool and the version constraint placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: String,
}

impl Dependency {
    /// Constraint used when a manifest only implies a tool by its presence.
    pub const ANY: &'static str = "*";

    pub fn new<N: Into<String>, C: Into<String>>(name: N, constraint: C) -> Self {
        let constraint = constraint.into();
        let constraint = if constraint.trim().is_empty() {
            Self::ANY.to_string()
        } else {
            constraint.trim().to_string()
        };
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Parse `name@constraint`, `name` or `@scope/name@constraint`.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        match spec.rfind('@') {
            Some(0) | None => Self::new(spec, Self::ANY),
            Some(at) => Self::new(&spec[..at], &spec[at + 1..]),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.constraint)
    }
}

/// The contribution of a single manifest file before merging.
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub kind: ManifestKind,
    pub path: PathBuf,
    pub dependencies: Vec<Dependency>,
    pub env: IndexMap<String, String>,
}

impl ParsedManifest {
    pub fn new(kind: ManifestKind, path: PathBuf) -> Self {
        Self {
            kind,
            path,
            dependencies: Vec::new(),
            env: IndexMap::new(),
        }
    }

    /// Add a dependency unless one with the same name is already declared.
    pub fn require<N: Into<String>, C: Into<String>>(&mut self, name: N, constraint: C) {
        let dep = Dependency::new(name, constraint);
        if !self.dependencies.iter().any(|d| d.name == dep.name) {
            self.dependencies.push(dep);
        }
    }
}

/// Normalized dependency declaration of one project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Kind of the highest-priority manifest found.
    pub kind: ManifestKind,

    /// Absolute path of the highest-priority manifest.
    pub file_path: PathBuf,

    /// Merged dependencies, in priority then declaration order.
    pub declared_dependencies: Vec<Dependency>,

    /// Merged environment variables.
    pub declared_env: IndexMap<String, String>,

    /// Every manifest that contributed, highest priority first.
    pub sources: Vec<PathBuf>,
}

impl ManifestRecord {
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.declared_dependencies.iter().find(|d| d.name == name)
    }

    pub fn ecosystem(&self) -> &'static str {
        self.kind.ecosystem()
    }
}

/// A manifest that was present but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFailure {
    pub kind: ManifestKind,
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of scanning one directory.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub record: Option<ManifestRecord>,
    pub failures: Vec<ManifestFailure>,
}

/// Merge per-file contributions into a single record.
///
/// Input is expected in priority order; the first declaration of a tool or
/// variable wins.
pub fn merge_manifests(parsed: Vec<ParsedManifest>) -> Option<ManifestRecord> {
    let first = parsed.first()?;
    let mut record = ManifestRecord {
        kind: first.kind,
        file_path: first.path.clone(),
        declared_dependencies: Vec::new(),
        declared_env: IndexMap::new(),
        sources: Vec::new(),
    };

    for manifest in parsed {
        for dep in manifest.dependencies {
            if record.dependency(&dep.name).is_none() {
                record.declared_dependencies.push(dep);
            }
        }
        for (name, value) in manifest.env {
            record.declared_env.entry(name).or_insert(value);
        }
        record.sources.push(manifest.path);
    }

    Some(record)
}
