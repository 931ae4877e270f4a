// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad install` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use launchpad::{CommandBackend, Config, EnvironmentStore, Project};
use miette::Result;

/// Install the tools of a project without activating it
#[derive(Debug, Args)]
pub struct CmdInstall {
    /// Start discovery from DIR
    #[clap(default_value = ".")]
    dir: PathBuf,
}

impl CmdInstall {
    pub async fn run(&mut self) -> Result<i32> {
        let root = launchpad::discovery::require_project_root(&self.dir)?;
        let project = Project::at(root);
        if project.manifest().is_none() {
            for failure in &project.detection.failures {
                eprintln!("{} {}: {}", "error:".red(), failure.path.display(), failure.message);
            }
            return Ok(1);
        }

        let config = Config::load()?;
        let store = EnvironmentStore::from_config(&config)?;
        let backend = CommandBackend::from_config(&config.install);
        let prepared = project.prepare(&store, &backend).await?;

        if prepared.report.outcomes.is_empty() {
            println!(
                "All {} tool(s) of {} are installed",
                project.dependencies().len(),
                project.root.display().to_string().cyan()
            );
            return Ok(0);
        }

        for outcome in &prepared.report.outcomes {
            match &outcome.result {
                Ok(version) => println!(
                    "  {} {} ({})",
                    "✓".green(),
                    outcome.dependency.name.cyan(),
                    version
                ),
                Err(reason) => println!(
                    "  {} {} {}",
                    "✗".red(),
                    outcome.dependency.to_string().cyan(),
                    reason.red()
                ),
            }
        }

        let failed = prepared.report.failed();
        if failed.is_empty() {
            return Ok(0);
        }
        let names: Vec<_> = failed.iter().map(|o| o.dependency.name.as_str()).collect();
        eprintln!("{} failed to install: {}", "error:".red(), names.join(", "));
        Ok(1)
    }
}
