//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

pub mod profiles;
pub mod run;
pub mod selection;

/// Campaign wizard automation across managed browser profiles.
#[derive(Debug, Parser)]
#[command(name = "adpilot", version, about)]
pub struct Cli {
    /// Path to the configuration file (defaults to the platform config dir).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List profiles known to the profile manager.
    Profiles(profiles::ProfilesArgs),
    /// Run the campaign wizard across a set of profiles.
    Run(run::RunArgs),
    /// Manage named profile selection sets.
    Selection {
        #[command(subcommand)]
        command: selection::SelectionCommand,
    },
}

/// Dispatch a parsed command; returns the process exit code.
pub async fn dispatch(command: Command, config: AppConfig) -> anyhow::Result<i32> {
    match command {
        Command::Profiles(args) => profiles::execute(args, &config).await,
        Command::Run(args) => run::execute(args, &config).await,
        Command::Selection { command } => selection::execute(command, &config),
    }
}
