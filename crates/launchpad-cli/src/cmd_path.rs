// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad path` command.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use launchpad::path::{add_to_path, is_in_path, standard_path};
use miette::Result;

/// Inspect or extend the executable search path
#[derive(Debug, Args)]
pub struct CmdPath {
    #[clap(subcommand)]
    cmd: PathCommand,
}

#[derive(Debug, Subcommand)]
enum PathCommand {
    /// Print the standard search path of this platform
    Standard,

    /// Exit successfully when DIR is on PATH
    Check { dir: PathBuf },

    /// Persistently add DIR to PATH in the shell startup file
    Add { dir: PathBuf },
}

impl CmdPath {
    pub async fn run(&mut self) -> Result<i32> {
        match &self.cmd {
            PathCommand::Standard => {
                let dirs: Vec<_> = standard_path()
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect();
                println!("{}", dirs.join(":"));
                Ok(0)
            }
            PathCommand::Check { dir } => {
                if is_in_path(dir) {
                    println!("{} is in PATH", dir.display());
                    Ok(0)
                } else {
                    println!("{} is not in PATH", dir.display());
                    Ok(1)
                }
            }
            PathCommand::Add { dir } => {
                if add_to_path(dir) {
                    println!("{} {}", "Added to PATH:".green(), dir.display());
                    Ok(0)
                } else {
                    eprintln!(
                        "{} could not add {} to PATH: no existing shell startup file, or a temporary directory",
                        "error:".red(),
                        dir.display()
                    );
                    Ok(1)
                }
            }
        }
    }
}
