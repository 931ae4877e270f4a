// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! A discovered project and the preparation of its environment.

use std::path::{Path, PathBuf};

use crate::activation::Activation;
use crate::discovery::{detect_with_report, find_project_root};
use crate::identity::{ProjectKey, canonical_project_path, identify};
use crate::install::{InstallBackend, InstallReport};
use crate::manifest::{Dependency, Detection, ManifestRecord};
use crate::store::{EnvironmentRecord, EnvironmentStore};

#[cfg(test)]
#[path = "./project_test.rs"]
mod project_test;

/// A project root together with what was detected there.
#[derive(Debug, Clone)]
pub struct Project {
    /// Canonical project root.
    pub root: PathBuf,
    pub key: ProjectKey,
    pub detection: Detection,
}

/// An environment made ready for activation.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub activation: Activation,
    pub record: EnvironmentRecord,
    pub report: InstallReport,
}

impl Project {
    /// Find the project enclosing `start`, if any.
    pub fn discover<P: AsRef<Path>>(start: P) -> Option<Self> {
        find_project_root(start).map(Self::at)
    }

    /// Load the project rooted exactly at `root`.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        let root = canonical_project_path(root.as_ref());
        let key = identify(&root);
        let detection = detect_with_report(&root);
        Self {
            root,
            key,
            detection,
        }
    }

    pub fn manifest(&self) -> Option<&ManifestRecord> {
        self.detection.record.as_ref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.manifest()
            .map(|m| m.declared_dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Make sure the environment exists and holds every declared tool.
    ///
    /// Tools that fail to install are reported but do not prevent
    /// activation with the tools that are available.
    pub async fn prepare<B: InstallBackend>(
        &self,
        store: &EnvironmentStore,
        backend: &B,
    ) -> crate::Result<Prepared> {
        let resolution = store.resolve(&self.key, &self.root, self.dependencies())?;

        let (record, report) = if resolution.missing.is_empty() {
            (resolution.record, InstallReport::default())
        } else {
            tracing::info!(
                project = ?self.root,
                missing = resolution.missing.len(),
                "installing tools"
            );
            let report = backend.install(&resolution.missing, &resolution.env_dir).await;
            let installed = report.succeeded();
            let record = if installed.is_empty() {
                resolution.record
            } else {
                store.record_installed(&self.key, &installed)?
            };
            (record, report)
        };

        let activation = Activation {
            project_root: self.root.clone(),
            key: self.key.clone(),
            tool_dirs: store.tool_dirs(&self.key),
            env: self
                .manifest()
                .map(|m| m.declared_env.clone())
                .unwrap_or_default(),
        };

        Ok(Prepared {
            activation,
            record,
            report,
        })
    }
}
