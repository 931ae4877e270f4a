// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for launchpad operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with launchpad Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during launchpad operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No recognized manifest found in directory tree
    #[error("No dependency manifest found in {0:?} or any parent directory")]
    #[diagnostic(
        code(launchpad::not_found_in_tree),
        help("Create a dependencies.yaml file or add a version pin such as .node-version")
    )]
    NotFoundInTree(PathBuf),

    /// Failed to read a manifest file
    #[error("Failed to read manifest: {path:?}")]
    #[diagnostic(code(launchpad::manifest_read_failed))]
    ManifestRead {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Manifest content could not be parsed
    #[error("Invalid manifest {path:?}: {message}")]
    #[diagnostic(
        code(launchpad::invalid_manifest),
        help("Fix the syntax of this file; other manifests in the directory are still used")
    )]
    InvalidManifest { path: PathBuf, message: String },

    /// Environment directory could not be created
    #[error("Failed to create environment directory {path:?}")]
    #[diagnostic(
        code(launchpad::store_create_failed),
        help("Check the permissions and free space of the launchpad data directory")
    )]
    StoreCreate {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Environment record could not be read or written
    #[error("Failed to access environment record {path:?}")]
    #[diagnostic(code(launchpad::store_io_failed))]
    StoreIo {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Environment record is not valid YAML
    #[error("Invalid environment record {path:?}")]
    #[diagnostic(
        code(launchpad::invalid_record),
        help("Remove the environment with 'launchpad prune' and activate the project again")
    )]
    InvalidRecord {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Two project paths map onto the same environment directory
    #[error("Environment {key} belongs to {existing:?}, refusing to reuse it for {requested:?}")]
    #[diagnostic(
        code(launchpad::key_collision),
        help("This should never happen; please report it along with both paths")
    )]
    KeyCollision {
        key: String,
        existing: PathBuf,
        requested: PathBuf,
    },

    /// Key is not a valid encoded path
    #[error("Invalid project key: {0}")]
    #[diagnostic(code(launchpad::invalid_key))]
    InvalidKey(String),

    /// The session state variable could not be decoded
    #[error("Invalid session state: {0}")]
    #[diagnostic(
        code(launchpad::invalid_state),
        help("Open a new shell, or unset LAUNCHPAD_STATE to reset the session")
    )]
    InvalidState(String),

    /// Home directory could not be determined
    #[error("Cannot determine the home directory")]
    #[diagnostic(code(launchpad::no_home), help("Set the HOME environment variable"))]
    NoHomeDirectory,

    /// Configuration error passthrough
    #[error(transparent)]
    #[diagnostic(code(launchpad::config_error))]
    Config(#[from] ::config::ConfigError),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(launchpad::io_error))]
    Io(#[from] std::io::Error),
}
