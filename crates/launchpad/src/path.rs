// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Inspection of `PATH` and persistent additions to it.

use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::shell::Shell;

#[cfg(test)]
#[path = "./path_test.rs"]
mod path_test;

/// Marker written above lines this crate adds to startup files.
pub const EDIT_MARKER: &str = "# Added by launchpad";

/// Directory patterns that never belong in a persistent `PATH`.
static TRANSIENT_DIRS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(^|/)tmp(/|$)|^/private/tmp(/|$)|^(/private)?/var/folders/[^/]+/[^/]+/T(/|$)|(^|/)launchpad-test-[^/]*",
    )
    .expect("valid transient directory pattern")
});

/// Operating systems with a distinct standard `PATH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }
}

const SYSTEM_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin", "/usr/sbin", "/sbin"];

/// The standard executable search directories of this platform.
pub fn standard_path() -> Vec<PathBuf> {
    standard_path_for(HostOs::current(), |p| p.is_dir())
}

/// The standard search directories for `os`, in order.
///
/// `exists` decides whether optional package-manager prefixes are included.
pub fn standard_path_for<F: Fn(&Path) -> bool>(os: HostOs, exists: F) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    match os {
        HostOs::MacOs => {
            dirs.push(PathBuf::from("/opt/homebrew/bin"));
            dirs.push(PathBuf::from("/opt/homebrew/sbin"));
        }
        HostOs::Linux => {
            let linuxbrew = Path::new("/home/linuxbrew/.linuxbrew/bin");
            if exists(linuxbrew) {
                dirs.push(linuxbrew.to_path_buf());
            }
        }
        HostOs::Other => {}
    }
    dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));
    dirs
}

/// Whether `dir` is an exact entry of the current `PATH`.
pub fn is_in_path<P: AsRef<Path>>(dir: P) -> bool {
    let path = std::env::var("PATH").unwrap_or_default();
    is_in_path_value(dir.as_ref(), &path)
}

/// Whether `dir` is an exact entry of the `PATH` value `path`.
pub fn is_in_path_value(dir: &Path, path: &str) -> bool {
    let Some(dir) = dir.to_str() else {
        return false;
    };
    !dir.is_empty() && path.split(':').any(|entry| entry == dir)
}

/// Whether `dir` looks temporary and must not be persisted.
pub fn is_transient(dir: &Path) -> bool {
    let text = dir.to_string_lossy();
    if TRANSIENT_DIRS.is_match(&text) {
        return true;
    }
    let tmp = std::env::temp_dir();
    tmp.parent().is_some() && dir.starts_with(&tmp)
}

/// What [`add_to_path`] needs to know about the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellContext {
    pub home: Option<PathBuf>,
    pub shell: Option<Shell>,
    pub windows: bool,
}

impl ShellContext {
    pub fn from_env() -> Self {
        Self {
            home: std::env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from),
            shell: Shell::detect(),
            windows: cfg!(windows),
        }
    }

    /// The first existing startup file of the user's shell.
    pub fn startup_file(&self) -> Option<PathBuf> {
        let home = self.home.as_ref()?;
        self.shell?
            .startup_files(home)
            .into_iter()
            .find(|f| f.is_file())
    }

    /// Like [`ShellContext::startup_file`], but names the preferred file of
    /// the shell when none exists yet.
    pub fn startup_file_or_default(&self) -> Option<PathBuf> {
        let home = self.home.as_ref()?;
        let shell = self.shell?;
        self.startup_file()
            .or_else(|| shell.startup_files(home).into_iter().next())
    }
}

/// Whether [`ShellConfigEdit::apply`] changed the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Appended,
    AlreadyPresent,
}

/// An idempotent append of one line to a shell startup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfigEdit {
    pub file: PathBuf,
    pub line: String,
}

impl ShellConfigEdit {
    pub fn new<P: Into<PathBuf>, L: Into<String>>(file: P, line: L) -> Self {
        Self {
            file: file.into(),
            line: line.into(),
        }
    }

    /// Whether the file already holds the line.
    pub fn is_applied(&self) -> std::io::Result<bool> {
        match std::fs::read_to_string(&self.file) {
            Ok(content) => Ok(content.lines().any(|l| l.trim() == self.line.trim())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Append the line unless it is already present.
    pub fn apply(&self) -> std::io::Result<EditOutcome> {
        if self.is_applied()? {
            return Ok(EditOutcome::AlreadyPresent);
        }
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let needs_newline = std::fs::read(&self.file)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        if needs_newline {
            writeln!(file)?;
        }
        writeln!(file, "\n{EDIT_MARKER}")?;
        writeln!(file, "{}", self.line)?;
        Ok(EditOutcome::Appended)
    }
}

/// Persistently add `dir` to the user's `PATH`.
///
/// Returns whether the directory is (now) configured.
pub fn add_to_path<P: AsRef<Path>>(dir: P) -> bool {
    add_to_path_with(&ShellContext::from_env(), dir.as_ref())
}

/// [`add_to_path`] against an explicit context.
///
/// Nothing is written on Windows, without a home directory, for an unknown
/// shell, when the shell has no startup file yet, or for temporary
/// directories.
pub fn add_to_path_with(ctx: &ShellContext, dir: &Path) -> bool {
    if ctx.windows {
        tracing::debug!("not editing startup files on windows");
        return false;
    }
    if is_transient(dir) {
        tracing::debug!(?dir, "refusing to persist a temporary directory");
        return false;
    }
    let (Some(shell), Some(file)) = (ctx.shell, ctx.startup_file()) else {
        tracing::debug!("no existing shell startup file to edit");
        return false;
    };

    let edit = ShellConfigEdit::new(file, shell.prepend_path_line(dir));
    match edit.apply() {
        Ok(outcome) => {
            tracing::debug!(file = ?edit.file, ?outcome, "updated PATH configuration");
            true
        }
        Err(err) => {
            tracing::warn!("failed to update {}: {err}", edit.file.display());
            false
        }
    }
}
