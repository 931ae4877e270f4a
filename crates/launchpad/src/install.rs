// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Installation of missing tools into an environment prefix.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::config::InstallSettings;
use crate::manifest::Dependency;

#[cfg(test)]
#[path = "./install_test.rs"]
mod install_test;

/// Upper bound for the wait between two attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Result of installing one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub dependency: Dependency,
    /// Installed version, or the failure message.
    pub result: std::result::Result<String, String>,
    pub attempts: usize,
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-tool results of an installation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub outcomes: Vec<ToolOutcome>,
}

impl InstallReport {
    /// Installed tools with their versions.
    pub fn succeeded(&self) -> Vec<(Dependency, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| Some((o.dependency.clone(), o.result.clone().ok()?)))
            .collect()
    }

    pub fn failed(&self) -> Vec<&ToolOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ToolOutcome::is_success)
    }
}

/// Something that can put tools into an environment prefix.
pub trait InstallBackend {
    /// Install every tool of `tools` into `prefix`.
    ///
    /// A tool that fails does not stop the others from being installed.
    fn install(&self, tools: &[Dependency], prefix: &Path) -> impl Future<Output = InstallReport>;
}

/// Installs tools by running an external command once per tool.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    max_retries: usize,
    retry_delay: Duration,
    allow_sudo: bool,
}

impl CommandBackend {
    pub fn from_config(settings: &InstallSettings) -> Self {
        Self {
            program: settings.command.clone(),
            args: settings.args.clone(),
            timeout: settings.timeout(),
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            allow_sudo: settings.allow_sudo,
        }
    }

    /// The arguments for installing `dep` into `prefix`.
    pub fn args_for(&self, dep: &Dependency, prefix: &Path) -> Vec<String> {
        let tool = dep.to_string();
        let prefix = prefix.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{tool}", &tool).replace("{prefix}", &prefix))
            .collect()
    }

    async fn install_one(&self, dep: &Dependency, prefix: &Path, sudo: bool) -> ToolOutcome {
        let strategy = backoff(self.retry_delay, self.max_retries).map(jitter);

        let mut attempts = 0;
        let result = Retry::spawn(strategy, || {
            attempts += 1;
            tracing::debug!(tool = %dep, attempt = attempts, "installing");
            self.run_once(dep, prefix, sudo)
        })
        .await;

        if let Err(err) = &result {
            tracing::warn!("failed to install {dep}: {err}");
        }
        ToolOutcome {
            dependency: dep.clone(),
            result,
            attempts,
        }
    }

    async fn run_once(
        &self,
        dep: &Dependency,
        prefix: &Path,
        sudo: bool,
    ) -> std::result::Result<String, String> {
        let mut cmd = if sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(self.args_for(dep, prefix))
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(format!("timed out after {}s", self.timeout.as_secs_f32())),
            Ok(Err(err)) => return Err(format!("failed to run {}: {err}", self.program)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(match output.status.code() {
                Some(code) => format!("{} exited with status {code}: {detail}", self.program),
                None => format!("{} was terminated: {detail}", self.program),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(reported_version(&dep.name, &stdout).unwrap_or_else(|| dep.constraint.clone()))
    }
}

impl InstallBackend for CommandBackend {
    async fn install(&self, tools: &[Dependency], prefix: &Path) -> InstallReport {
        let sudo = self.allow_sudo && !is_writable(prefix);
        if sudo {
            tracing::info!(?prefix, "prefix is not writable, installing with sudo");
        }
        let mut report = InstallReport::default();
        for dep in tools {
            report.outcomes.push(self.install_one(dep, prefix, sudo).await);
        }
        report
    }
}

/// Waits before each retry: `retry_delay`, doubling every time, capped at
/// [`MAX_RETRY_DELAY`].
fn backoff(retry_delay: Duration, max_retries: usize) -> impl Iterator<Item = Duration> {
    let delay_ms = u64::try_from(retry_delay.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    // yields factor * 2^n for n = 1, 2, ...
    ExponentialBackoff::from_millis(2)
        .factor(delay_ms.div_ceil(2))
        .max_delay(MAX_RETRY_DELAY)
        .take(max_retries)
}

/// The last `name@version` the installer printed for `name`.
fn reported_version(name: &str, output: &str) -> Option<String> {
    let needle = format!("{name}@");
    output
        .split_whitespace()
        .filter_map(|word| word.rsplit_once(&needle).map(|(_, v)| v))
        .filter(|v| v.starts_with(|c: char| c.is_ascii_digit()))
        .last()
        .map(String::from)
}

fn is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}
