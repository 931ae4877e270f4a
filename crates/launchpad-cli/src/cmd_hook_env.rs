// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad hook-env` command.
//!
//! Called by the shell integration on every directory change. Everything
//! printed to stdout is evaluated by the shell.

use std::path::PathBuf;

use clap::Args;
use launchpad::activation::ShellCommand;
use launchpad::identity::canonical_project_path;
use launchpad::{
    CURRENT_PROJECT_VAR, CommandBackend, Config, EnvironmentStore, ORIGINAL_PATH_VAR, Project,
    STATE_VAR, SessionEnv, Shell, find_project_root, transition,
};
use miette::{Result, miette};

/// Print the commands that move the shell into the current directory's environment
#[derive(Debug, Args)]
pub struct CmdHookEnv {
    /// Shell to print commands for (bash, zsh, fish)
    #[clap(long)]
    shell: Option<Shell>,

    /// Directory to activate for, instead of the working directory
    #[clap(long)]
    dir: Option<PathBuf>,
}

impl CmdHookEnv {
    pub async fn run(&mut self) -> Result<i32> {
        let shell = self
            .shell
            .or_else(Shell::detect)
            .ok_or_else(|| miette!("Cannot detect your shell, pass --shell bash|zsh|fish"))?;

        let config = Config::load().unwrap_or_else(|err| {
            tracing::warn!("ignoring invalid configuration: {err}");
            Config::default()
        });

        let mut session = SessionEnv::from_process();
        let mut commands = Vec::new();
        let current = match session.state() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!("resetting session: {err}");
                commands = reset_session(&session);
                session.apply(&commands);
                None
            }
        };

        // a vanished working directory counts as leaving every project
        let dir = match &self.dir {
            Some(dir) => Some(dir.clone()),
            None => std::env::current_dir().ok(),
        };
        let root = dir.and_then(find_project_root).map(|r| canonical_project_path(&r));

        if let (Some(current), Some(root)) = (&current, &root) {
            if current.project_root == *root {
                print!("{}", shell.render(&commands));
                return Ok(0);
            }
        }

        let mut failures = Vec::new();
        let target = match root {
            None => None,
            Some(root) => {
                let project = Project::at(&root);
                if project.manifest().is_none() {
                    failures.push(format!(
                        "❌ No usable dependency manifest in {}",
                        root.display()
                    ));
                    None
                } else {
                    match self.prepare(&project, &config).await {
                        Ok((activation, failed)) => {
                            failures.extend(failed);
                            Some(activation)
                        }
                        Err(err) => {
                            tracing::debug!("{err:?}");
                            failures.push(format!(
                                "❌ Failed to activate environment for {}: {err}",
                                root.display()
                            ));
                            None
                        }
                    }
                }
            }
        };

        let change = transition(current.as_ref(), target.as_ref(), &session, &config.shell);
        commands.extend(change.commands);
        commands.extend(failures.into_iter().map(ShellCommand::status));

        print!("{}", shell.render(&commands));
        Ok(0)
    }

    /// Prepare the environment; returns the activation and per-tool failures.
    async fn prepare(
        &self,
        project: &Project,
        config: &Config,
    ) -> launchpad::Result<(launchpad::Activation, Vec<String>)> {
        let store = EnvironmentStore::from_config(config)?;
        let backend = CommandBackend::from_config(&config.install);
        let prepared = project.prepare(&store, &backend).await?;

        let failed = prepared
            .report
            .failed()
            .into_iter()
            .map(|outcome| {
                let reason = outcome.result.clone().err().unwrap_or_default();
                format!("⚠️  Failed to install {}: {reason}", outcome.dependency)
            })
            .collect();
        Ok((prepared.activation, failed))
    }
}

/// Commands recovering a session whose state cannot be decoded.
///
/// Only the saved `PATH` survives; variables the project exported stay set.
fn reset_session(session: &SessionEnv) -> Vec<ShellCommand> {
    let mut commands = Vec::new();
    if let Some(path) = session.get(ORIGINAL_PATH_VAR) {
        commands.push(ShellCommand::export("PATH", path));
    }
    for name in [STATE_VAR, ORIGINAL_PATH_VAR, CURRENT_PROJECT_VAR] {
        commands.push(ShellCommand::unset(name));
    }
    commands.push(ShellCommand::status(
        "⚠️  launchpad session state was unreadable, PATH has been reset",
    ));
    commands
}
