// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! User configuration.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `$XDG_CONFIG_HOME/launchpad/config.yaml` (or `~/.config/...`)
//! 3. `LAUNCHPAD_*` environment variables, with `__` separating nested keys
//!    (for example `LAUNCHPAD_INSTALL__TIMEOUT_SECS=60`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ENVS_DIRNAME, Error, LAUNCHPAD_DIRNAME, Result};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

pub const CONFIG_FILENAME: &str = "config.yaml";
pub const ENV_PREFIX: &str = "LAUNCHPAD";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Override for the directory holding project environments.
    pub env_dir: Option<PathBuf>,
    pub install: InstallSettings,
    pub shell: ShellSettings,
}

/// How missing tools are installed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallSettings {
    /// Program invoked once per tool.
    pub command: String,

    /// Arguments; `{tool}` and `{prefix}` are substituted.
    pub args: Vec<String>,

    pub timeout_secs: u64,

    /// Retries after the first failed attempt.
    pub max_retries: usize,

    pub retry_delay_ms: u64,

    /// Run the command through `sudo` when the prefix is not writable.
    pub allow_sudo: bool,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            command: "pkgx".to_string(),
            args: ["install", "--prefix", "{prefix}", "{tool}"]
                .map(String::from)
                .to_vec(),
            timeout_secs: 300,
            max_retries: 2,
            retry_delay_ms: 500,
            allow_sudo: true,
        }
    }
}

impl InstallSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Status lines printed by the shell integration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellSettings {
    pub show_messages: bool,

    /// `{path}` is replaced with the project root.
    pub activation_message: String,

    pub deactivation_message: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            show_messages: true,
            activation_message: "✅ Environment activated for {path}".to_string(),
            deactivation_message: "⚪ Environment deactivated".to_string(),
        }
    }
}

impl ShellSettings {
    pub fn activation_line(&self, project_root: &Path) -> String {
        self.activation_message
            .replace("{path}", &project_root.display().to_string())
    }
}

impl Config {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_file().as_deref())
    }

    /// Load using `file` (which may be missing) and the process environment.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(file) = file {
            tracing::debug!(?file, "reading configuration");
            builder = builder.add_source(::config::File::from(file).required(false));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("install.args"),
        );
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Directory holding one subdirectory per project environment.
    pub fn env_dir(&self) -> Result<PathBuf> {
        match &self.env_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_env_dir(),
        }
    }
}

/// `$XDG_CONFIG_HOME/launchpad/config.yaml`, or `~/.config/...`.
pub fn default_config_file() -> Option<PathBuf> {
    let base = xdg_dir("XDG_CONFIG_HOME").or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
    Some(base.join(LAUNCHPAD_DIRNAME).join(CONFIG_FILENAME))
}

/// `$XDG_DATA_HOME/launchpad/envs`, or `~/.local/share/...`.
pub fn default_env_dir() -> Result<PathBuf> {
    let base = match xdg_dir("XDG_DATA_HOME") {
        Some(dir) => dir,
        None => dirs::home_dir()
            .ok_or(Error::NoHomeDirectory)?
            .join(".local")
            .join("share"),
    };
    Ok(base.join(LAUNCHPAD_DIRNAME).join(ENVS_DIRNAME))
}

/// XDG variables are only honored when absolute.
fn xdg_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
}
