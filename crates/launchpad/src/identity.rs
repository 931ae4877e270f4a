// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Stable, reversible identifiers for project directories.
//!
//! A [`ProjectKey`] is the URL-safe base64 encoding of the canonical project
//! path. The alphabet contains neither `/`, `+` nor `=`, so the key is always
//! a single valid directory name, and distinct paths always produce distinct
//! keys because the encoding can be reversed.

use std::fmt;
use std::path::{Path, PathBuf};

use data_encoding::BASE64URL_NOPAD;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./identity_test.rs"]
mod identity_test;

/// Keys shorter than this are padded with [`KEY_PADDING`].
pub const MIN_KEY_LEN: usize = 17;

/// Padding character; never part of the encoding alphabet.
pub const KEY_PADDING: char = '.';

/// Identifier of a project environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Encode an already canonical path.
    pub fn encode(path: &Path) -> Self {
        let mut key = BASE64URL_NOPAD.encode(path.as_os_str().as_encoded_bytes());
        while key.len() < MIN_KEY_LEN {
            key.push(KEY_PADDING);
        }
        Self(key)
    }

    /// Recover the path this key was encoded from.
    pub fn decode(&self) -> Result<PathBuf> {
        decode_key(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn decode_key(key: &str) -> Result<PathBuf> {
    let encoded = key.trim_end_matches(KEY_PADDING);
    let bytes = BASE64URL_NOPAD
        .decode(encoded.as_bytes())
        .map_err(|err| Error::InvalidKey(format!("{key}: {err}")))?;
    let path = String::from_utf8(bytes)
        .map_err(|_| Error::InvalidKey(format!("{key}: path is not valid UTF-8")))?;
    Ok(PathBuf::from(path))
}

impl TryFrom<String> for ProjectKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        if value.len() < MIN_KEY_LEN {
            return Err(Error::InvalidKey(format!("{value}: too short")));
        }
        decode_key(&value)?;
        Ok(Self(value))
    }
}

impl std::str::FromStr for ProjectKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s.to_string())
    }
}

impl From<ProjectKey> for String {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a project path.
///
/// Symlinks are resolved when the path exists; otherwise the absolute path
/// is used as given.
pub fn canonical_project_path(path: &Path) -> PathBuf {
    match dunce::canonicalize(path) {
        Ok(path) => path,
        Err(_) => crate::discovery::resolve_start_path(path),
    }
}

/// Compute the key of the project at `path`.
pub fn identify<P: AsRef<Path>>(path: P) -> ProjectKey {
    ProjectKey::encode(&canonical_project_path(path.as_ref()))
}
