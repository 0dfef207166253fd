use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dpatch",
    about = "Document patch generator for diagram documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate the patch between two document snapshots
    Diff(DiffArgs),
    /// Summarize what a patch file changes
    Stats(StatsArgs),
    /// Print the default document schema or the built-in item types
    Schema(SchemaArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Original document (JSON, or TOML with a .toml extension)
    pub origin: PathBuf,
    /// Modified document
    pub modified: PathBuf,
    /// Document schema overriding the defaults
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Extra item types, merged over the built-in ones
    #[arg(long)]
    pub types: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Patch file in JSON
    pub patch: PathBuf,
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Print the built-in item type registry instead
    #[arg(long)]
    pub types: bool,
}
