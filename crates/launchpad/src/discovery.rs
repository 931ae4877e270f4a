// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Discovery of project roots and their dependency manifests.

use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

use crate::manifest::{
    Detection, ManifestFailure, ManifestKind, ManifestRecord, REGISTRY, VCS_MARKERS, merge_manifests,
};
use crate::{Error, parsers};

/// Resolve starting path, preferring $PWD to preserve symlinks.
pub fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        return start_path.to_owned();
    }
    let pwd = std::env::var_os("PWD").map(PathBuf::from);
    let cwd = std::env::current_dir().ok();
    working_dir(pwd, cwd).unwrap_or_default().join(start_path)
}

/// The working directory as the user sees it.
///
/// `$PWD` keeps symlinked components but is inherited verbatim by child
/// processes started elsewhere, so it is only trusted while it still names
/// the real working directory.
fn working_dir(pwd: Option<PathBuf>, cwd: Option<PathBuf>) -> Option<PathBuf> {
    let Some(cwd) = cwd else {
        return pwd.filter(|p| p.is_absolute());
    };
    match pwd {
        Some(pwd) if pwd.is_absolute() && same_dir(&pwd, &cwd) => Some(pwd),
        _ => Some(cwd),
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// List the recognized manifests present in `dir`, highest priority first.
pub fn manifests_in(dir: &Path) -> Vec<(ManifestKind, PathBuf)> {
    REGISTRY
        .iter()
        .map(|(name, kind)| (*kind, dir.join(name)))
        .filter(|(_, path)| path.is_file())
        .collect()
}

fn has_vcs_marker(dir: &Path) -> bool {
    VCS_MARKERS.iter().any(|marker| dir.join(marker).exists())
}

/// Find the project root for `start_path`.
///
/// Walks up from the starting directory. The first directory holding any
/// recognized manifest is the root. A version-control marker without a
/// manifest ends the search, as does the filesystem root.
pub fn find_project_root<P: AsRef<Path>>(start_path: P) -> Option<PathBuf> {
    let mut current = resolve_start_path(start_path.as_ref());
    loop {
        if !manifests_in(&current).is_empty() {
            tracing::debug!(root = ?current, "found project root");
            return Some(current);
        }
        if has_vcs_marker(&current) {
            tracing::debug!(boundary = ?current, "stopped at repository boundary");
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Like [`find_project_root`], but an error when nothing is found.
pub fn require_project_root<P: AsRef<Path>>(start_path: P) -> crate::Result<PathBuf> {
    let start = resolve_start_path(start_path.as_ref());
    find_project_root(&start).ok_or(Error::NotFoundInTree(start))
}

/// Detect the normalized manifest record of `dir`.
///
/// Manifests that fail to parse are logged and skipped; see
/// [`detect_with_report`] to inspect them.
pub fn detect<P: AsRef<Path>>(dir: P) -> Option<ManifestRecord> {
    detect_with_report(dir).record
}

/// Parse and merge every manifest in `dir`, reporting the ones that failed.
pub fn detect_with_report<P: AsRef<Path>>(dir: P) -> Detection {
    let dir = resolve_start_path(dir.as_ref());
    let mut parsed = Vec::new();
    let mut failures = Vec::new();

    for (kind, path) in manifests_in(&dir) {
        match load_manifest(kind, &path) {
            Ok(manifest) => parsed.push(manifest),
            Err(err) => {
                tracing::warn!("skipping {}: {err}", path.display());
                failures.push(ManifestFailure {
                    kind,
                    path,
                    message: err.to_string(),
                });
            }
        }
    }

    Detection {
        record: merge_manifests(parsed),
        failures,
    }
}

fn load_manifest(kind: ManifestKind, path: &Path) -> crate::Result<crate::manifest::ParsedManifest> {
    let content = if kind.reads_content() {
        std::fs::read_to_string(path).map_err(|error| Error::ManifestRead {
            path: path.to_owned(),
            error,
        })?
    } else {
        String::new()
    };
    parsers::parse(kind, path, &content)
}
