//! CLI argument parsing with clap derive.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::application::ports::PrivilegedShell as _;
use crate::commands;

/// Manage the frida-server lifecycle on a rooted device
#[derive(Parser)]
#[command(
    name = "fridactl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List available server releases
    Releases(commands::releases::ReleasesArgs),

    /// Download and install a server build
    Install(commands::install::InstallArgs),

    /// Start the installed server
    Start(commands::start::StartArgs),

    /// Stop the running server
    Stop,

    /// Show installed/running state and recorded version
    Status,

    /// Remove the server binary and version marker
    Uninstall,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            json,
            quiet,
            no_color,
        });

        let result = match &command {
            Command::Releases(args) => commands::releases::run(args, &app),
            Command::Install(args) => commands::install::run(args, &app).await,
            Command::Start(args) => commands::start::run(args, &app).await,
            Command::Stop => commands::stop::run(&app).await,
            Command::Status => commands::status::run(&app).await,
            Command::Uninstall => commands::uninstall::run(&app).await,
        };

        // Tear down the elevated session before reporting the outcome.
        app.session.close().await;
        result
    }
}
