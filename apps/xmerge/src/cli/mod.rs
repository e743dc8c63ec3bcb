//! # xmerge CLI Module
//!
//! This module implements the CLI interface for xmerge.
//!
//! ## Available Commands
//!
//! - `merge` - Merge documents left to right
//! - `equals` - Compare two documents
//! - `get` - Read the value at a dotted path
//! - `set` - Write (or merge) a value at a dotted path
//! - `flatten` - Flatten a document to dotted keys

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use xmerge_core::XmergeError;
use xmerge_core::primitives::REMOVE_MARKER_TEXT;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// xmerge - deep merge for JSON and TOML documents
///
/// Documents are merged recursively: mappings by key, sequences as sets,
/// and a marker string deletes keys.
#[derive(Parser, Debug)]
#[command(name = "xmerge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Input format; `auto` picks TOML for `.toml` files and JSON otherwise
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = DocumentFormat::Auto)]
    pub format: DocumentFormat,

    /// Strings equal to this marker delete the key they are merged into
    /// (an empty marker disables removal)
    #[arg(long, global = true, env = "XMERGE_REMOVE_MARKER", default_value = REMOVE_MARKER_TEXT)]
    pub remove_marker: String,

    /// Print single-line JSON
    #[arg(short, long, global = true)]
    pub compact: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge documents left to right and print the result
    Merge {
        /// Input documents; the first is the merge target
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compare two documents; exits with status 1 when they differ
    Equals {
        left: PathBuf,
        right: PathBuf,

        /// Compare without type coercion and with ordered sequences
        #[arg(short, long)]
        strict: bool,
    },

    /// Print the value at a dotted path (`null` when absent)
    Get { file: PathBuf, path: String },

    /// Set a JSON value at a dotted path and print the document
    Set {
        file: PathBuf,
        path: String,

        /// JSON text of the value to store
        value: String,

        /// Merge into the existing value instead of replacing it
        #[arg(short, long)]
        merge: bool,
    },

    /// Print the document flattened to dotted keys
    Flatten { file: PathBuf },
}

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Auto,
    Json,
    Toml,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI command and report the process exit code.
pub fn execute(cli: Cli) -> Result<ExitCode, XmergeError> {
    let input = InputOptions::new(cli.format, &cli.remove_marker);
    let output = OutputOptions {
        compact: cli.compact,
        path: cli.output,
    };

    match cli.command {
        Commands::Merge { files } => {
            let merged = cmd_merge(&files, &input)?;
            emit(&merged, &output)?;
        }
        Commands::Equals {
            left,
            right,
            strict,
        } => {
            let equal = cmd_equals(&left, &right, strict, &input)?;
            emit_text(&equal.to_string(), &output)?;
            if !equal {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Get { file, path } => {
            let found = cmd_get(&file, &path, &input)?;
            emit(&found, &output)?;
        }
        Commands::Set {
            file,
            path,
            value,
            merge,
        } => {
            let document = cmd_set(&file, &path, &value, merge, &input)?;
            emit(&document, &output)?;
        }
        Commands::Flatten { file } => {
            let flat = cmd_flatten(&file, &input)?;
            emit(&flat, &output)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
