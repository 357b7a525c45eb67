//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Forge - extract worldbuilding entities and relationships from text.
#[derive(Debug, Parser)]
#[command(name = "forge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction pipeline over a source file
    Extract(ExtractArgs),

    /// List stored entities (and optionally relationships)
    List(ListArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Source file (plain text or markdown; convert other formats first)
    pub file: PathBuf,

    /// Content genre: historical, fantasy, scifi, modern, generic
    #[arg(short, long, default_value = "generic")]
    pub genre: String,

    /// Model to use (overrides the config file)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Approve every checkpoint without prompting
    #[arg(long)]
    pub auto_approve: bool,

    /// Maximum chunk size in bytes
    #[arg(long)]
    pub max_chunk_chars: Option<usize>,

    /// Overlap between consecutive chunks in bytes
    #[arg(long)]
    pub overlap_chars: Option<usize>,

    /// Maximum concurrent extraction calls
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Also list stored relationships
    #[arg(short, long)]
    pub relationships: bool,
}
