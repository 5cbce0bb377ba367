//! CLI argument definitions using clap derive macros.

use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{CheckCommand, ResolveCommand, RunCommand};
use crate::error::CliError;

/// Reqflow - structured requirement authoring and validation
///
/// Parse requirement documents, resolve cross-document references,
/// and score candidate implementations against acceptance criteria.
#[derive(Debug, Parser)]
#[command(
    name = "reqflow",
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse requirement files and report every violation
    Check(CheckCommand),

    /// Load a corpus and resolve cross-document references
    Resolve(ResolveCommand),

    /// Score a candidate implementation against a document's
    /// acceptance criteria
    Run(RunCommand),
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(self) -> Result<(), CliError> {
        let ctx = CommandContext {
            format: self.format,
        };

        match self.command {
            Command::Check(cmd) => cmd.execute(&ctx).await,
            Command::Resolve(cmd) => cmd.execute(&ctx).await,
            Command::Run(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub format: OutputFormat,
}
