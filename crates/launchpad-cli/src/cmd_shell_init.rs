// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchpad shell-init` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use launchpad::Shell;
use launchpad::path::{EditOutcome, ShellConfigEdit, ShellContext};
use miette::{IntoDiagnostic, Result, miette};

/// Print the shell integration script
#[derive(Debug, Args)]
pub struct CmdShellInit {
    /// Shell to integrate with (bash, zsh, fish); detected from $SHELL by default
    #[clap(long)]
    shell: Option<Shell>,

    /// Add the integration to the shell startup file instead of printing it
    #[clap(long)]
    install: bool,
}

impl CmdShellInit {
    pub async fn run(&mut self) -> Result<i32> {
        let shell = self
            .shell
            .or_else(Shell::detect)
            .ok_or_else(|| miette!("Cannot detect your shell, pass --shell bash|zsh|fish"))?;

        let program = std::env::current_exe()
            .ok()
            .and_then(strip_deleted_suffix)
            .unwrap_or_else(|| PathBuf::from("launchpad"));

        if !self.install {
            print!("{}", launchpad::hook::shell_init(shell, &program));
            return Ok(0);
        }

        let ctx = ShellContext {
            shell: Some(shell),
            ..ShellContext::from_env()
        };
        let file = ctx
            .startup_file_or_default()
            .ok_or_else(|| miette!("Cannot determine the startup file for {shell}"))?;
        let line = shell.init_line(&shell.quote(&program.to_string_lossy()));
        let edit = ShellConfigEdit::new(&file, line);

        match edit.apply().into_diagnostic()? {
            EditOutcome::Appended => {
                println!("{} {}", "Added launchpad to".green(), file.display());
                println!("Open a new shell to start using it.");
            }
            EditOutcome::AlreadyPresent => {
                println!("launchpad is already set up in {}", file.display());
            }
        }
        Ok(0)
    }
}

/// Executables deleted while running show up with a " (deleted)" suffix.
fn strip_deleted_suffix(path: PathBuf) -> Option<PathBuf> {
    let text = path.to_str()?;
    Some(PathBuf::from(text.trim_end_matches(" (deleted)")))
}
