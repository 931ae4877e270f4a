// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! launchpad - Per-directory Tool Environments
//!
//! This crate provides the core library for giving every project directory its
//! own set of tools, activated when a shell enters the project and removed
//! again when it leaves.
//!
//! # Overview
//!
//! A project is any directory holding one of the recognized dependency
//! manifests (a `dependencies.yaml`, a `package.json`, a `.python-version`
//! pin, ...). Its canonical path is encoded into a [`ProjectKey`] which names
//! the project's environment directory under
//! `<user data dir>/launchpad/envs/<key>`.
//!
//! The shell integration generated by [`hook::shell_init`] calls back into the
//! `launchpad` binary on every directory change. The binary computes a pure
//! [`activation::transition`] from the session's current [`PathState`] to the
//! newly discovered project and prints the shell commands that apply it.
//!
//! # Example
//!
//! ```yaml
//! # dependencies.yaml
//! dependencies:
//!   nodejs.org: ^20
//!   python.org: ~3.12
//!
//! env:
//!   NODE_ENV: development
//! ```

pub mod activation;
pub mod config;
pub mod discovery;
pub mod error;
pub mod hook;
pub mod identity;
pub mod install;
pub mod manifest;
pub mod parsers;
pub mod path;
pub mod project;
pub mod shell;
pub mod store;

pub use activation::{Activation, PathState, SessionEnv, ShellCommand, Transition, transition};
pub use config::Config;
pub use discovery::{detect, detect_with_report, find_project_root};
pub use error::{Error, Result};
pub use identity::{ProjectKey, identify};
pub use install::{CommandBackend, InstallBackend, InstallReport, ToolOutcome};
pub use manifest::{Dependency, Detection, ManifestFailure, ManifestKind, ManifestRecord};
pub use path::{ShellConfigEdit, add_to_path, is_in_path, standard_path};
pub use project::Project;
pub use shell::Shell;
pub use store::{EnvironmentRecord, EnvironmentStore, Resolution};

/// Name of the directory (under the user data dir) that holds all launchpad state.
pub const LAUNCHPAD_DIRNAME: &str = "launchpad";

/// Name of the directory (under [`LAUNCHPAD_DIRNAME`]) holding project environments.
pub const ENVS_DIRNAME: &str = "envs";

/// Session variable holding the encoded [`PathState`] of the active project.
pub const STATE_VAR: &str = "LAUNCHPAD_STATE";

/// Session variable holding the `PATH` value captured before activation.
pub const ORIGINAL_PATH_VAR: &str = "LAUNCHPAD_ORIGINAL_PATH";

/// Session variable naming the root of the active project.
pub const CURRENT_PROJECT_VAR: &str = "LAUNCHPAD_CURRENT_PROJECT";

/// Prefix shared by every shell function the integration defines.
pub const HOOK_FUNCTION_PREFIX: &str = "_launchpad_";
