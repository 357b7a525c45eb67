//! Forge CLI - command-line front end for the extraction pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod hil;
pub mod output;

pub use cli::{Cli, CliFormat, Command};
pub use config::{Config, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
