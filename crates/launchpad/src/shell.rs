// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Supported shells and rendering of environment changes for them.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::activation::ShellCommand;

#[cfg(test)]
#[path = "./shell_test.rs"]
mod shell_test;

/// Shells with a directory-change integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    /// Detect the user's shell from `$SHELL`.
    pub fn detect() -> Option<Self> {
        std::env::var("SHELL").ok().and_then(|s| Self::from_path(&s))
    }

    /// Identify a shell from its program path or name.
    pub fn from_path(shell: &str) -> Option<Self> {
        let name = Path::new(shell)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();
        match name.as_str() {
            "zsh" => Some(Shell::Zsh),
            "bash" => Some(Shell::Bash),
            "fish" => Some(Shell::Fish),
            // login shells show up as "-zsh", versioned ones as "bash5"
            _ if name.contains("zsh") => Some(Shell::Zsh),
            _ if name.contains("bash") => Some(Shell::Bash),
            _ if name.contains("fish") => Some(Shell::Fish),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        }
    }

    /// Startup files consulted for persistent configuration, preferred first.
    pub fn startup_files(&self, home: &Path) -> Vec<PathBuf> {
        match self {
            Shell::Zsh => vec![home.join(".zshrc"), home.join(".zprofile")],
            Shell::Bash => vec![
                home.join(".bashrc"),
                home.join(".bash_profile"),
                home.join(".profile"),
            ],
            Shell::Fish => vec![home.join(".config").join("fish").join("config.fish")],
        }
    }

    /// Quote `value` as a single literal word.
    pub fn quote(&self, value: &str) -> String {
        match self {
            Shell::Fish => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
            Shell::Bash | Shell::Zsh => format!("'{}'", value.replace('\'', r#"'\''"#)),
        }
    }

    /// A startup-file line putting `dir` in front of `PATH`.
    pub fn prepend_path_line(&self, dir: &Path) -> String {
        let dir = dir.display().to_string();
        match self {
            Shell::Fish => format!("set -gx PATH {} $PATH", self.quote(&dir)),
            Shell::Bash | Shell::Zsh => {
                let escaped: String = dir
                    .chars()
                    .flat_map(|c| match c {
                        '"' | '\\' | '$' | '`' => vec!['\\', c],
                        _ => vec![c],
                    })
                    .collect();
                format!("export PATH=\"{escaped}:$PATH\"")
            }
        }
    }

    /// The line that loads the integration from a startup file.
    pub fn init_line(&self, program: &str) -> String {
        match self {
            Shell::Fish => format!("{program} shell-init --shell fish | source"),
            Shell::Bash | Shell::Zsh => {
                format!("eval \"$({program} shell-init --shell {})\"", self.as_str())
            }
        }
    }

    fn export(&self, name: &str, value: &str) -> String {
        match self {
            Shell::Fish if name == "PATH" => {
                format!("set -gx PATH (string split -- ':' {})", self.quote(value))
            }
            Shell::Fish => format!("set -gx {name} {}", self.quote(value)),
            Shell::Bash | Shell::Zsh => format!("export {name}={}", self.quote(value)),
        }
    }

    fn unset(&self, names: &[&str]) -> String {
        match self {
            Shell::Fish => format!("set -e {}", names.join(" ")),
            Shell::Bash | Shell::Zsh => format!("unset {}", names.join(" ")),
        }
    }

    fn status(&self, message: &str) -> String {
        match self {
            Shell::Fish => format!("echo {} >&2", self.quote(message)),
            Shell::Bash | Shell::Zsh => format!("printf '%s\\n' {} >&2", self.quote(message)),
        }
    }

    /// Render commands as one script for the shell to evaluate.
    ///
    /// Only the net effect per variable is emitted, so a variable that is
    /// unset and then exported again is simply exported. Status lines come
    /// last, after every variable has been applied.
    pub fn render(&self, commands: &[ShellCommand]) -> String {
        let mut vars: IndexMap<&str, Option<&str>> = IndexMap::new();
        let mut messages = Vec::new();
        for command in commands {
            match command {
                ShellCommand::Export { name, value } => {
                    vars.shift_remove(name.as_str());
                    vars.insert(name.as_str(), Some(value.as_str()));
                }
                ShellCommand::Unset { name } => {
                    vars.shift_remove(name.as_str());
                    vars.insert(name.as_str(), None);
                }
                ShellCommand::Status { message } => messages.push(message.as_str()),
            }
        }

        let mut lines = Vec::new();
        let unset: Vec<&str> = vars
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !unset.is_empty() {
            lines.push(self.unset(&unset));
        }
        for (name, value) in &vars {
            if let Some(value) = value {
                lines.push(self.export(name, value));
            }
        }
        for message in messages {
            lines.push(self.status(message));
        }

        if lines.is_empty() {
            String::new()
        } else {
            lines.join("\n") + "\n"
        }
    }
}

impl std::str::FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            other => Err(format!("unsupported shell '{other}', expected bash, zsh or fish")),
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
