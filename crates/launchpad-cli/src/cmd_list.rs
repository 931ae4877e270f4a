// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad list` command.

use clap::Args;
use colored::Colorize;
use launchpad::{Config, EnvironmentStore};
use miette::{IntoDiagnostic, Result};

/// List all project environments
#[derive(Debug, Args)]
pub struct CmdList {
    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdList {
    pub async fn run(&mut self) -> Result<i32> {
        let config = Config::load()?;
        let store = EnvironmentStore::from_config(&config)?;
        let records = store.list()?;

        match self.format.as_str() {
            "yaml" => print!("{}", serde_yaml::to_string(&records).into_diagnostic()?),
            "json" => println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?),
            _ => {
                if records.is_empty() {
                    println!("{}", "(no environments)".dimmed());
                    return Ok(0);
                }
                println!("{}", "Environments:".bold());
                println!();
                for record in &records {
                    let missing = if record.project_path.exists() {
                        ""
                    } else {
                        " [missing]"
                    };
                    let tools: Vec<_> = record
                        .installed_tools
                        .iter()
                        .map(|(name, tool)| format!("{name}@{}", tool.version))
                        .collect();
                    println!(
                        "  {}{}",
                        record.project_path.display().to_string().cyan(),
                        missing.yellow()
                    );
                    println!(
                        "     last used {}  {}",
                        record.last_used_at.format("%Y-%m-%d"),
                        tools.join(" ").dimmed()
                    );
                }
                println!();
                println!("Total: {} environment(s) in {}", records.len(), store.root().display());
            }
        }
        Ok(0)
    }
}
