// modman/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use modman_common::config::Config;
use modman_common::error::Result;

pub mod cleanup;
pub mod deploy;
pub mod deployed;
pub mod download;
pub mod init;
pub mod list;
pub mod paths;
pub mod run;
pub mod runner;
pub mod show;
pub mod stage;

use crate::cli::cleanup::Cleanup;
use crate::cli::deploy::Deploy;
use crate::cli::deployed::Deployed;
use crate::cli::download::Download;
use crate::cli::init::Init;
use crate::cli::list::List;
use crate::cli::paths::Paths;
use crate::cli::run::Run;
use crate::cli::show::Show;
use crate::cli::stage::Stage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "modman", bin_name = "modman")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(Init),
    List(List),
    Show(Show),
    Deployed(Deployed),
    Paths(Paths),
    Run(Run),
    Download(Download),
    Stage(Stage),
    Deploy(Deploy),
    Cleanup(Cleanup),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Init(command) => command.run(config),
            Self::List(command) => command.run(config),
            Self::Show(command) => command.run(config),
            Self::Deployed(command) => command.run(config),
            Self::Paths(command) => command.run(config),
            // Commands that drive the pipeline
            Self::Run(command) => command.run(config).await,
            Self::Download(command) => command.run(config).await,
            Self::Stage(command) => command.run(config),
            Self::Deploy(command) => command.run(config),
            Self::Cleanup(command) => command.run(config),
        }
    }
}
