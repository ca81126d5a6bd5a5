//! CLI definition for the `formwork` command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formwork_units::Dimension;

/// Formwork - declarative form schemas
///
/// Check definitions, create and migrate instances, and inspect visibility
/// and validation from the shell. Results are printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "formwork")]
#[command(version)]
#[command(about = "Check, migrate and validate declarative form schemas")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Read configuration from this file instead of searching the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a definition and report its fields and root fields
    Check {
        /// Definition JSON file
        definition: PathBuf,
    },
    /// Create a new instance seeded with the definition's defaults
    Instance {
        /// Definition JSON file
        definition: PathBuf,
        /// Name of the new instance
        #[arg(short, long, default_value = "untitled")]
        name: String,
    },
    /// Upgrade an instance to a definition's version
    Migrate {
        /// Instance JSON file
        instance: PathBuf,
        /// Definition JSON file to migrate to
        definition: PathBuf,
        /// Refuse lossy guesses instead of applying fallbacks
        #[arg(long)]
        strict: bool,
        /// Keep values whose field no longer exists
        #[arg(long)]
        preserve_unknown: bool,
    },
    /// Show which fields are visible for a set of values
    Visibility {
        /// Definition JSON file
        definition: PathBuf,
        /// Instance JSON file, or a plain object of field values
        values: PathBuf,
    },
    /// Validate every visible field of an instance
    Validate {
        /// Definition JSON file
        definition: PathBuf,
        /// Instance JSON file, or a plain object of field values
        values: PathBuf,
    },
    /// Convert a value between two units of a dimension
    Convert {
        /// Magnitude to convert
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Unit code to convert from
        from: String,
        /// Unit code to convert to
        to: String,
        /// Dimension the units belong to (length, area, volume, weight, time, temperature, angle)
        #[arg(short = 'D', long)]
        dimension: Dimension,
    },
}
