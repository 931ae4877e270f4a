// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Per-project environment directories and their records.
//!
//! Every project owns `<root>/<key>/`, which doubles as the install prefix
//! for its tools. Next to the tools sits `environment.yaml`, recording what
//! was installed and when the environment was last used.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs4::FileExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::identity::ProjectKey;
use crate::manifest::Dependency;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./store_test.rs"]
mod store_test;

pub const RECORD_FILENAME: &str = "environment.yaml";

/// Lock file serializing updates of the record.
pub const LOCK_FILENAME: &str = ".environment.lock";

/// Directories inside an environment that are put on `PATH`.
pub const TOOL_DIRS: &[&str] = &["bin", "sbin"];

/// Environment record API version.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum RecordApiVersion {
    #[default]
    #[serde(rename = "launchpad/v0/environment")]
    V0,
}

/// One installed tool.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InstalledTool {
    /// Constraint the tool was installed for.
    pub requested: String,

    /// Version reported by the installer, or the constraint when unknown.
    pub version: String,

    pub installed_at: DateTime<Utc>,
}

/// Persistent state of one project environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnvironmentRecord {
    pub api: RecordApiVersion,
    pub key: ProjectKey,
    pub project_path: PathBuf,
    #[serde(default)]
    pub installed_tools: IndexMap<String, InstalledTool>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl EnvironmentRecord {
    fn new(key: ProjectKey, project_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            api: RecordApiVersion::V0,
            key,
            project_path,
            installed_tools: IndexMap::new(),
            created_at: now,
            last_used_at: now,
        }
    }

    /// Whether `dep` is installed for the same constraint.
    pub fn satisfies(&self, dep: &Dependency) -> bool {
        self.installed_tools
            .get(&dep.name)
            .is_some_and(|tool| tool.requested == dep.constraint)
    }
}

/// Result of resolving a project's environment.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: EnvironmentRecord,

    /// Environment directory, also the install prefix.
    pub env_dir: PathBuf,

    /// Required tools not yet installed, in declaration order.
    pub missing: Vec<Dependency>,

    /// Whether the environment was created by this resolution.
    pub created: bool,
}

/// Outcome of a prune run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedEnvironment {
    pub env_dir: PathBuf,
    pub project_path: Option<PathBuf>,
    pub last_used_at: DateTime<Utc>,
}

/// The directory holding every project environment.
#[derive(Debug, Clone)]
pub struct EnvironmentStore {
    root: PathBuf,
}

impl EnvironmentStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.env_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env_dir(&self, key: &ProjectKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Directories of an environment that belong on `PATH`.
    pub fn tool_dirs(&self, key: &ProjectKey) -> Vec<PathBuf> {
        let env_dir = self.env_dir(key);
        TOOL_DIRS.iter().map(|d| env_dir.join(d)).collect()
    }

    /// Ensure the environment for `key` exists and diff its tools.
    ///
    /// Creating the directory and its first record is safe against a
    /// concurrent resolution of the same key: both end up sharing one
    /// environment. Resolving an existing environment refreshes its
    /// last-used time without losing tools recorded in the meantime.
    pub fn resolve(
        &self,
        key: &ProjectKey,
        project_path: &Path,
        required: &[Dependency],
    ) -> Result<Resolution> {
        let env_dir = self.env_dir(key);
        std::fs::create_dir_all(&self.root).map_err(|error| Error::StoreCreate {
            path: self.root.clone(),
            error,
        })?;
        let created = match std::fs::create_dir(&env_dir) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => false,
            Err(error) => {
                return Err(Error::StoreCreate {
                    path: env_dir,
                    error,
                });
            }
        };

        let _lock = self.lock(key)?;
        let record = match self.load(key)? {
            Some(record) => self.refresh(record, project_path)?,
            None => {
                let record = EnvironmentRecord::new(key.clone(), project_path.to_owned());
                if self.write_record(&record, true)? {
                    tracing::debug!(?env_dir, "created environment");
                    record
                } else {
                    // written by a process that does not take the lock
                    let existing = self.load(key)?.ok_or_else(|| Error::StoreIo {
                        path: self.record_path(key),
                        error: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "environment record vanished",
                        ),
                    })?;
                    self.refresh(existing, project_path)?
                }
            }
        };

        let missing = required
            .iter()
            .filter(|dep| !record.satisfies(dep))
            .cloned()
            .collect();

        Ok(Resolution {
            record,
            env_dir,
            missing,
            created,
        })
    }

    /// Record freshly installed tools as `(dependency, resolved version)`.
    pub fn record_installed(
        &self,
        key: &ProjectKey,
        installed: &[(Dependency, String)],
    ) -> Result<EnvironmentRecord> {
        let path = self.record_path(key);
        let _lock = self.lock(key)?;
        let mut record = self.load(key)?.ok_or_else(|| Error::StoreIo {
            path,
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "environment has no record"),
        })?;

        let now = Utc::now();
        for (dep, version) in installed {
            record.installed_tools.insert(
                dep.name.clone(),
                InstalledTool {
                    requested: dep.constraint.clone(),
                    version: version.clone(),
                    installed_at: now,
                },
            );
        }
        record.last_used_at = now;
        self.write_record(&record, false)?;
        Ok(record)
    }

    /// Read the record of `key`, if the environment has one.
    pub fn load(&self, key: &ProjectKey) -> Result<Option<EnvironmentRecord>> {
        read_record(&self.record_path(key))
    }

    /// All environments, sorted by project path.
    ///
    /// An environment left without a record (an interrupted first
    /// activation) is listed with the path decoded from its key and no tools.
    pub fn list(&self) -> Result<Vec<EnvironmentRecord>> {
        let mut records = Vec::new();
        for env_dir in self.env_dirs()? {
            match read_record(&env_dir.join(RECORD_FILENAME)) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => match unrecorded(&env_dir) {
                    Some(record) => records.push(record),
                    None => tracing::debug!(?env_dir, "not an environment directory"),
                },
                Err(err) => tracing::warn!("{err}"),
            }
        }
        records.sort_by(|a, b| a.project_path.cmp(&b.project_path));
        Ok(records)
    }

    /// Remove environments last used before `cutoff`.
    ///
    /// Environments without a readable record are judged by the
    /// modification time of their directory.
    pub fn prune(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<Vec<PrunedEnvironment>> {
        let mut pruned = Vec::new();
        for env_dir in self.env_dirs()? {
            let record = read_record(&env_dir.join(RECORD_FILENAME)).ok().flatten();
            let last_used_at = match &record {
                Some(record) => record.last_used_at,
                None => match modified_time(&env_dir) {
                    Some(time) => time,
                    None => continue,
                },
            };
            if last_used_at >= cutoff {
                continue;
            }

            if !dry_run {
                tracing::info!(?env_dir, "removing environment");
                std::fs::remove_dir_all(&env_dir).map_err(|error| Error::StoreIo {
                    path: env_dir.clone(),
                    error,
                })?;
            }
            pruned.push(PrunedEnvironment {
                env_dir,
                project_path: record.map(|r| r.project_path),
                last_used_at,
            });
        }
        Ok(pruned)
    }

    /// Check ownership of `record` and refresh its last-used time.
    fn refresh(
        &self,
        mut record: EnvironmentRecord,
        project_path: &Path,
    ) -> Result<EnvironmentRecord> {
        if record.project_path != project_path {
            return Err(Error::KeyCollision {
                key: record.key.to_string(),
                existing: record.project_path,
                requested: project_path.to_owned(),
            });
        }
        record.last_used_at = Utc::now();
        self.write_record(&record, false)?;
        Ok(record)
    }

    /// Take the exclusive lock guarding the record of `key`.
    ///
    /// Every read-modify-write of a record happens while holding it, so
    /// concurrent shells never drop each other's updates. The lock is
    /// released when the returned file is dropped.
    fn lock(&self, key: &ProjectKey) -> Result<File> {
        let path = self.env_dir(key).join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|error| Error::StoreIo {
                path: path.clone(),
                error,
            })?;
        file.lock_exclusive()
            .map_err(|error| Error::StoreIo { path, error })?;
        Ok(file)
    }

    fn record_path(&self, key: &ProjectKey) -> PathBuf {
        self.env_dir(key).join(RECORD_FILENAME)
    }

    fn env_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(Error::StoreIo {
                    path: self.root.clone(),
                    error,
                });
            }
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Write `record` atomically. With `create_new`, an existing record is
    /// left in place and `false` is returned.
    fn write_record(&self, record: &EnvironmentRecord, create_new: bool) -> Result<bool> {
        let env_dir = self.env_dir(&record.key);
        let path = env_dir.join(RECORD_FILENAME);
        let io_err = |error| Error::StoreIo {
            path: path.clone(),
            error,
        };

        let yaml = serde_yaml::to_string(record)
            .map_err(|err| io_err(std::io::Error::other(err)))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&env_dir).map_err(io_err)?;
        tmp.write_all(yaml.as_bytes()).map_err(io_err)?;

        if create_new {
            match tmp.persist_noclobber(&path) {
                Ok(_) => Ok(true),
                Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
                Err(err) => Err(io_err(err.error)),
            }
        } else {
            tmp.persist(&path).map_err(|err| io_err(err.error))?;
            Ok(true)
        }
    }
}

fn read_record(path: &Path) -> Result<Option<EnvironmentRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(Error::StoreIo {
                path: path.to_owned(),
                error,
            });
        }
    };
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|error| Error::InvalidRecord {
            path: path.to_owned(),
            error,
        })
}

fn unrecorded(env_dir: &Path) -> Option<EnvironmentRecord> {
    let name = env_dir.file_name()?.to_str()?;
    let key: ProjectKey = name.parse().ok()?;
    let project_path = key.decode().ok()?;
    let mut record = EnvironmentRecord::new(key, project_path);
    if let Some(modified) = modified_time(env_dir) {
        record.created_at = modified;
        record.last_used_at = modified;
    }
    Some(record)
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
