// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Activation state of a shell session and transitions between projects.
//!
//! Nothing here touches the process environment. The caller captures the
//! session into a [`SessionEnv`], computes a [`Transition`], and hands its
//! commands to the shell.

use std::collections::HashMap;
use std::path::PathBuf;

use data_encoding::BASE64URL_NOPAD;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ShellSettings;
use crate::identity::ProjectKey;
use crate::{CURRENT_PROJECT_VAR, Error, ORIGINAL_PATH_VAR, Result, STATE_VAR};

#[cfg(test)]
#[path = "./activation_test.rs"]
mod activation_test;

/// Variables a project manifest may not override.
fn is_reserved(name: &str) -> bool {
    name == "PATH" || name.starts_with("LAUNCHPAD_")
}

/// One change to apply in the user's shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Export { name: String, value: String },
    Unset { name: String },
    Status { message: String },
}

impl ShellCommand {
    pub fn export<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        ShellCommand::Export {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn unset<N: Into<String>>(name: N) -> Self {
        ShellCommand::Unset { name: name.into() }
    }

    pub fn status<M: Into<String>>(message: M) -> Self {
        ShellCommand::Status {
            message: message.into(),
        }
    }
}

/// What an active project changed in the session, so it can be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathState {
    pub project_root: PathBuf,
    pub key: ProjectKey,

    /// `PATH` before activation; `None` when it was unset.
    pub original_path: Option<String>,

    /// Directories prepended to `PATH`.
    pub injected_dirs: Vec<String>,

    /// Variables set by the project, with the value each had before.
    pub injected_env: IndexMap<String, Option<String>>,
}

impl PathState {
    /// Encode for storage in a single environment variable.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self).map_err(|err| Error::InvalidState(err.to_string()))?;
        Ok(BASE64URL_NOPAD.encode(&json))
    }

    pub fn decode(value: &str) -> Result<Self> {
        let json = BASE64URL_NOPAD
            .decode(value.trim().as_bytes())
            .map_err(|err| Error::InvalidState(err.to_string()))?;
        serde_json::from_slice(&json).map_err(|err| Error::InvalidState(err.to_string()))
    }
}

/// A project ready to be activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub project_root: PathBuf,
    pub key: ProjectKey,

    /// Directories to prepend to `PATH`, highest precedence first.
    pub tool_dirs: Vec<PathBuf>,

    /// Variables declared by the project manifest.
    pub env: IndexMap<String, String>,
}

/// A snapshot of the session environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    vars: HashMap<String, String>,
}

impl SessionEnv {
    /// Capture the current process environment, skipping non-UTF-8 entries.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn with<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The session's active project, if any.
    pub fn state(&self) -> Result<Option<PathState>> {
        match self.get(STATE_VAR) {
            None | Some("") => Ok(None),
            Some(value) => PathState::decode(value).map(Some),
        }
    }

    /// Apply commands as the shell would.
    pub fn apply(&mut self, commands: &[ShellCommand]) {
        for command in commands {
            match command {
                ShellCommand::Export { name, value } => {
                    self.vars.insert(name.clone(), value.clone());
                }
                ShellCommand::Unset { name } => {
                    self.vars.remove(name);
                }
                ShellCommand::Status { .. } => {}
            }
        }
    }
}

/// The result of moving a session from one project to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the commands are applied.
    pub next: Option<PathState>,
    pub commands: Vec<ShellCommand>,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Compute the commands taking the session from `current` to `target`.
///
/// A transition to the already active project changes nothing. Otherwise the
/// active project is fully undone before the target is applied, so `PATH`
/// and every variable a project touched return to their values from before
/// activation, including being unset when they were unset.
pub fn transition(
    current: Option<&PathState>,
    target: Option<&Activation>,
    env: &SessionEnv,
    messages: &ShellSettings,
) -> Transition {
    match (current, target) {
        (None, None) => {
            return Transition {
                next: None,
                commands: Vec::new(),
            };
        }
        (Some(current), Some(target)) if current.project_root == target.project_root => {
            return Transition {
                next: Some(current.clone()),
                commands: Vec::new(),
            };
        }
        _ => {}
    }

    let mut env = env.clone();
    let mut commands = Vec::new();

    if let Some(current) = current {
        let undo = deactivate(current);
        env.apply(&undo);
        commands.extend(undo);
    }

    let next = match target {
        Some(target) => {
            let (state, apply) = activate(target, &env);
            commands.extend(apply);
            if messages.show_messages {
                commands.push(ShellCommand::status(
                    messages.activation_line(&target.project_root),
                ));
            }
            Some(state)
        }
        None => {
            if messages.show_messages {
                commands.push(ShellCommand::status(&messages.deactivation_message));
            }
            None
        }
    };

    Transition { next, commands }
}

/// Commands that undo everything `state` applied.
pub fn deactivate(state: &PathState) -> Vec<ShellCommand> {
    let mut commands = Vec::new();
    commands.push(match &state.original_path {
        Some(path) => ShellCommand::export("PATH", path),
        None => ShellCommand::unset("PATH"),
    });
    for (name, original) in &state.injected_env {
        commands.push(match original {
            Some(value) => ShellCommand::export(name, value),
            None => ShellCommand::unset(name),
        });
    }
    for name in [STATE_VAR, ORIGINAL_PATH_VAR, CURRENT_PROJECT_VAR] {
        commands.push(ShellCommand::unset(name));
    }
    commands
}

fn activate(target: &Activation, env: &SessionEnv) -> (PathState, Vec<ShellCommand>) {
    let original_path = env.get("PATH").map(String::from);
    let injected_dirs: Vec<String> = target
        .tool_dirs
        .iter()
        .map(|d| d.to_string_lossy().into_owned())
        .collect();

    let mut entries = injected_dirs.clone();
    if let Some(path) = original_path.as_deref().filter(|p| !p.is_empty()) {
        entries.push(path.to_string());
    }

    let mut commands = vec![ShellCommand::export("PATH", entries.join(":"))];
    let mut injected_env = IndexMap::new();
    for (name, value) in &target.env {
        if is_reserved(name) {
            tracing::warn!("ignoring reserved variable {name} declared by the project");
            continue;
        }
        injected_env.insert(name.clone(), env.get(name).map(String::from));
        commands.push(ShellCommand::export(name, value));
    }

    let state = PathState {
        project_root: target.project_root.clone(),
        key: target.key.clone(),
        original_path,
        injected_dirs,
        injected_env,
    };

    commands.push(ShellCommand::export(
        ORIGINAL_PATH_VAR,
        state.original_path.clone().unwrap_or_default(),
    ));
    commands.push(ShellCommand::export(
        CURRENT_PROJECT_VAR,
        state.project_root.to_string_lossy(),
    ));
    match state.encode() {
        Ok(encoded) => commands.push(ShellCommand::export(STATE_VAR, encoded)),
        Err(err) => tracing::error!("failed to encode session state: {err}"),
    }

    (state, commands)
}
