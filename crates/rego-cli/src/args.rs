//! Command-line argument definitions for the Rego CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select what to parse (policy files or a query),
//! where to write the JSON, configuration file selection, and logging
//! verbosity.

use clap::Parser;

/// Command-line arguments for the Rego parser tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Paths to the input Rego files
    #[arg(
        help = "Paths to the input policy files",
        required_unless_present = "query",
        conflicts_with = "query"
    )]
    pub inputs: Vec<String>,

    /// Print the raw statement sequence instead of assembled modules
    #[arg(long)]
    pub statements: bool,

    /// Parse this query body instead of files
    #[arg(short, long, conflicts_with = "statements")]
    pub query: Option<String>,

    /// Path to the output JSON file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
