// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad show` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use launchpad::store::EnvironmentRecord;
use launchpad::{Config, EnvironmentStore, Project};
use miette::{IntoDiagnostic, Result};

/// Display the detected project and its environment
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Start discovery from DIR
    #[clap(default_value = ".")]
    dir: PathBuf,

    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdShow {
    pub async fn run(&mut self) -> Result<i32> {
        let root = launchpad::discovery::require_project_root(&self.dir)?;
        let project = Project::at(root);

        let config = Config::load()?;
        let store = EnvironmentStore::from_config(&config)?;
        let environment = store.load(&project.key)?;

        match self.format.as_str() {
            "yaml" => self.show_yaml(&project, &store, environment.as_ref())?,
            "json" => self.show_json(&project, &store, environment.as_ref())?,
            _ => self.show_table(&project, &store, environment.as_ref()),
        }

        Ok(0)
    }

    fn show_table(
        &self,
        project: &Project,
        store: &EnvironmentStore,
        environment: Option<&EnvironmentRecord>,
    ) {
        println!("{}", "Project:".bold());
        println!();
        println!("  root:        {}", project.root.display().to_string().cyan());
        println!("  environment: {}", store.env_dir(&project.key).display());

        if let Some(manifest) = project.manifest() {
            println!(
                "  detected:    {} ({})",
                manifest.kind.to_string().green(),
                manifest.ecosystem()
            );
            println!();
            println!("{}", "Manifests:".bold());
            println!();
            for (i, source) in manifest.sources.iter().enumerate() {
                println!("  {}. {}", i + 1, source.display().to_string().cyan());
            }

            println!();
            println!("{}", "Dependencies:".bold());
            println!();
            if manifest.declared_dependencies.is_empty() {
                println!("  {}", "(no dependencies)".dimmed());
            }
            for dep in &manifest.declared_dependencies {
                let installed = environment
                    .and_then(|e| e.installed_tools.get(&dep.name))
                    .filter(|tool| tool.requested == dep.constraint);
                let status = match installed {
                    Some(tool) => format!("installed {}", tool.version).green(),
                    None => "not installed".yellow(),
                };
                println!("  - {} {}", dep.to_string().cyan(), status);
            }

            if !manifest.declared_env.is_empty() {
                println!();
                println!("{}", "Environment Variables:".bold());
                println!();
                for (name, value) in &manifest.declared_env {
                    println!("  {} = {}", name.cyan(), value.green());
                }
            }
        } else {
            println!("  detected:    {}", "(no usable manifest)".dimmed());
        }

        if !project.detection.failures.is_empty() {
            println!();
            println!("{}", "Skipped Manifests:".bold());
            println!();
            for failure in &project.detection.failures {
                println!(
                    "  - {}: {}",
                    failure.path.display().to_string().red(),
                    failure.message
                );
            }
        }

        if let Some(environment) = environment {
            println!();
            println!(
                "Last used: {}",
                environment.last_used_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    fn summary(
        &self,
        project: &Project,
        store: &EnvironmentStore,
        environment: Option<&EnvironmentRecord>,
    ) -> serde_json::Value {
        let failures: Vec<_> = project
            .detection
            .failures
            .iter()
            .map(|f| serde_json::json!({ "path": f.path, "message": f.message }))
            .collect();
        serde_json::json!({
            "root": project.root,
            "key": project.key.as_str(),
            "environment_dir": store.env_dir(&project.key),
            "manifest": project.manifest(),
            "failures": failures,
            "environment": environment,
        })
    }

    fn show_yaml(
        &self,
        project: &Project,
        store: &EnvironmentStore,
        environment: Option<&EnvironmentRecord>,
    ) -> Result<()> {
        let summary = self.summary(project, store, environment);
        print!("{}", serde_yaml::to_string(&summary).into_diagnostic()?);
        Ok(())
    }

    fn show_json(
        &self,
        project: &Project,
        store: &EnvironmentStore,
        environment: Option<&EnvironmentRecord>,
    ) -> Result<()> {
        let summary = self.summary(project, store, environment);
        println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
        Ok(())
    }
}
