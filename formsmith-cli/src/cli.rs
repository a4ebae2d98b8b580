use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Parser, Debug)]
#[command(name = "formsmith")]
#[command(version)]
#[command(about = "Manage form schemas and evaluate form data against them")]
#[command(long_about = "
formsmith keeps form schemas as YAML files and evaluates form data against
them: validation rules per field and derived fields computed from others.

Global arguments can be used with any command to control output and behavior:
  --verbose     Show detailed information and trace output
  --format      Set output format (table, json, yaml)
  --debug       Enable debug logging
  --quiet       Suppress all output except errors
  --store       Use a different schema directory

Example usage:
  formsmith import signup.yaml                     # Add a schema
  formsmith list                                   # List stored schemas
  formsmith validate form_01j... data.json         # Check a submission
  formsmith --format=yaml derive form_01j... data.json
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Global output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Schema directory, overriding the configured `store_dir`
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored form schemas
    List,
    /// Show one schema's fields
    Show {
        /// Schema id
        id: String,
    },
    /// Add or replace a schema from a YAML or JSON file
    #[command(long_about = "
Read a form schema from a file and store it. Files ending in .json are read
as JSON, anything else as YAML. A missing id is generated, missing
timestamps default to now. Importing a schema whose id is already stored
replaces it.
")]
    Import {
        /// Schema file
        file: PathBuf,
    },
    /// Delete a stored schema
    Delete {
        /// Schema id
        id: String,
    },
    /// Validate a JSON data bag against a schema
    #[command(long_about = "
Validate a JSON object of field values against a schema. Derived fields are
recomputed first. Exits with status 1 when the data is invalid.
")]
    Validate {
        /// Schema id
        id: String,
        /// JSON file with field values keyed by field id
        data: PathBuf,
    },
    /// Recompute derived fields for a JSON data bag
    Derive {
        /// Schema id
        id: String,
        /// JSON file with field values keyed by field id
        data: PathBuf,
    },
    /// Report dependency problems in a schema
    Check {
        /// Schema id
        id: String,
    },
}
