//! Rego CLI library
//!
//! This module contains the core CLI logic for the `rego` tool: read policy
//! files (or a query), parse them, and print the syntax tree as JSON.

pub mod error;
pub mod error_adapter;

mod args;
pub mod config;
mod output;

pub use args::Args;
pub use error::CliError;

use std::{
    fs,
    io::{self, Write},
};

use log::{debug, info};

use rego_parser::{ParseConfig, parse_module, parse_query, parse_statements};

use output::JsonReport;

/// Name reported in locations for a query given on the command line.
const QUERY_NAME: &str = "<query>";

/// Run the Rego CLI application
///
/// Parses every input file as a module (or as a raw statement sequence with
/// `--statements`), or the `--query` text as a query, and writes the JSON
/// result to the output file or stdout.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - JSON serialization errors
pub fn run(args: &Args) -> Result<(), CliError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let parse_config = ParseConfig::default();

    let json = match &args.query {
        Some(query) => {
            info!(bytes = query.len(); "Parsing query");
            let body = parse_query(QUERY_NAME, query, &parse_config)
                .map_err(|err| CliError::new_parse_error(err, QUERY_NAME, query.as_str()))?;
            output::render(serde_json::to_value(&body)?, &app_config.output)?
        }
        None => {
            info!(inputs = args.inputs.len(), statements = args.statements; "Parsing policy files");
            let mut report = JsonReport::default();
            for input in &args.inputs {
                let source = fs::read_to_string(input)?;
                if args.statements {
                    let statements = parse_statements(input, &source, &parse_config)
                        .map_err(|err| CliError::new_parse_error(err, input, source))?;
                    report.insert(input, &statements)?;
                } else {
                    let module = parse_module(input, &source, &parse_config)
                        .map_err(|err| CliError::new_parse_error(err, input, source))?;
                    report.insert(input, &module)?;
                }
                debug!(input = input.as_str(); "Parsed input");
            }
            debug!(entries = report.len(); "Rendering report");
            report.render(&app_config.output)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))?;
            info!(output_file = path.as_str(); "JSON written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}
