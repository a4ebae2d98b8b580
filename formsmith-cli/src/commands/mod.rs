//! Subcommand implementations and the output helpers they share.

pub mod check;
pub mod delete;
pub mod derive;
pub mod import;
pub mod list;
pub mod show;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use formsmith_fields::{FormData, FormField, FormSchema, FormStore, FormsError};
use serde::Serialize;

use crate::cli::{Commands, OutputFormat};
use crate::config::FormsmithConfig;

/// Settings every command runs with.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: FormsmithConfig,
    pub format: Option<OutputFormat>,
    pub verbose: bool,
    pub store_dir: PathBuf,
}

impl CliContext {
    pub fn new(config: FormsmithConfig, format: Option<OutputFormat>, verbose: bool) -> Self {
        let store_dir = config.store_dir.clone();
        Self {
            config,
            format,
            verbose,
            store_dir,
        }
    }

    /// Use `dir` instead of the configured store directory.
    pub fn with_store_dir(mut self, dir: PathBuf) -> Self {
        self.store_dir = dir;
        self
    }

    /// The requested output format, or `default` when none was given.
    pub fn format_or(&self, default: OutputFormat) -> OutputFormat {
        self.format.unwrap_or(default)
    }

    /// Open the schema store. Only writing commands create a missing
    /// directory.
    pub async fn open_store(&self, create: bool) -> Result<FormStore> {
        FormStore::open(&self.store_dir)
            .create_missing(create)
            .build()
            .await
            .with_context(|| format!("opening form store {}", self.store_dir.display()))
    }
}

/// Run the parsed subcommand and return its exit code.
pub async fn dispatch(command: Commands, context: &CliContext) -> Result<i32> {
    match command {
        Commands::List => list::execute_list_command(context).await,
        Commands::Show { id } => show::execute_show_command(&id, context).await,
        Commands::Import { file } => import::execute_import_command(&file, context).await,
        Commands::Delete { id } => delete::execute_delete_command(&id, context).await,
        Commands::Validate { id, data } => {
            validate::execute_validate_command(&id, &data, context).await
        }
        Commands::Derive { id, data } => derive::execute_derive_command(&id, &data, context).await,
        Commands::Check { id } => check::execute_check_command(&id, context).await,
    }
}

/// Look up a stored schema, failing with the library's not-found error.
pub fn find_schema<'a>(store: &'a FormStore, id: &str) -> Result<&'a FormSchema> {
    store
        .get_schema(id)
        .ok_or_else(|| FormsError::SchemaNotFound { id: id.to_string() }.into())
}

/// A schema's fields in form order, owned.
pub fn ordered_fields(schema: &FormSchema) -> Vec<FormField> {
    schema.sorted_fields().into_iter().cloned().collect()
}

/// Read a JSON data bag and reshape its values for `fields`.
pub async fn read_data(path: &Path, fields: &[FormField]) -> Result<FormData> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let data = FormData::from_json(&json)
        .with_context(|| format!("parsing form data in {}", path.display()))?;
    Ok(data.normalized(fields))
}

/// Print `value` as JSON or YAML. Table output is handled by each command.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(value)?),
        OutputFormat::Table => anyhow::bail!("table output must be rendered by the command"),
    }
    Ok(())
}

/// Create a table with the shared preset and given headers.
pub fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(headers);
    table
}
