// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! launchpad - Per-directory Tool Environments CLI

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_hook_env;
mod cmd_install;
mod cmd_list;
mod cmd_path;
mod cmd_prune;
mod cmd_shell_init;
mod cmd_show;

use cmd_hook_env::CmdHookEnv;
use cmd_install::CmdInstall;
use cmd_list::CmdList;
use cmd_path::CmdPath;
use cmd_prune::CmdPrune;
use cmd_shell_init::CmdShellInit;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "launchpad",
    about = "Per-directory Tool Environments",
    version,
    long_about = "Give every project directory its own tools, activated when your shell enters it"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the shell integration script
    ShellInit(CmdShellInit),

    /// Print the commands that move the shell into the current directory's environment
    #[clap(hide = true)]
    HookEnv(CmdHookEnv),

    /// Display the detected project and its environment
    Show(CmdShow),

    /// Install the tools of a project without activating it
    Install(CmdInstall),

    /// List all project environments
    List(CmdList),

    /// Remove environments that have not been used recently
    Prune(CmdPrune),

    /// Inspect or extend the executable search path
    Path(CmdPath),
}

impl Opt {
    async fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        // stdout of hook-env and shell-init is evaluated by the shell
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::ShellInit(mut cmd) => cmd.run().await,
            Command::HookEnv(mut cmd) => cmd.run().await,
            Command::Show(mut cmd) => cmd.run().await,
            Command::Install(mut cmd) => cmd.run().await,
            Command::List(mut cmd) => cmd.run().await,
            Command::Prune(mut cmd) => cmd.run().await,
            Command::Path(mut cmd) => cmd.run().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run().await?;
    std::process::exit(code);
}
