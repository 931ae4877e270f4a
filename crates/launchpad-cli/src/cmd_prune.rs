// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad prune` command.

use clap::Args;
use colored::Colorize;
use launchpad::{Config, EnvironmentStore};
use miette::{Result, miette};

/// Remove environments that have not been used recently
#[derive(Debug, Args)]
pub struct CmdPrune {
    /// Remove environments unused for more than DAYS days
    #[clap(long, value_name = "DAYS", default_value_t = 30)]
    older_than: u32,

    /// Only report what would be removed
    #[clap(long)]
    dry_run: bool,
}

impl CmdPrune {
    pub async fn run(&mut self) -> Result<i32> {
        let config = Config::load()?;
        let store = EnvironmentStore::from_config(&config)?;
        let age = chrono::Duration::try_days(i64::from(self.older_than))
            .ok_or_else(|| miette!("--older-than is out of range"))?;
        let cutoff = chrono::Utc::now() - age;

        let pruned = store.prune(cutoff, self.dry_run)?;
        let verb = if self.dry_run { "Would remove" } else { "Removed" };
        for env in &pruned {
            let project = env
                .project_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| env.env_dir.display().to_string());
            println!(
                "  {} {} (last used {})",
                verb.yellow(),
                project.cyan(),
                env.last_used_at.format("%Y-%m-%d")
            );
        }
        println!("{verb} {} environment(s)", pruned.len());
        Ok(0)
    }
}
