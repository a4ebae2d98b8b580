//! List command implementation

use anyhow::Result;
use chrono::{DateTime, Utc};
use formsmith_fields::{FormSchema, FormsError};
use serde::Serialize;

use super::{create_table, print_structured, CliContext};
use crate::cli::OutputFormat;
use crate::exit_codes::EXIT_SUCCESS;

/// One row of the schema listing.
#[derive(Debug, Serialize)]
struct SchemaRow {
    id: String,
    name: String,
    fields: usize,
    derived: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&FormSchema> for SchemaRow {
    fn from(schema: &FormSchema) -> Self {
        Self {
            id: schema.id.clone(),
            name: schema.name.clone(),
            fields: schema.fields.len(),
            derived: schema.fields.iter().filter(|f| f.is_derived).count(),
            created_at: schema.created_at,
            updated_at: schema.updated_at,
        }
    }
}

/// Execute the list command - shows every stored schema, oldest first
pub async fn execute_list_command(context: &CliContext) -> Result<i32> {
    tracing::debug!("Starting list command");

    let rows: Vec<SchemaRow> = match context.open_store(false).await {
        Ok(store) => store.all_schemas().iter().map(SchemaRow::from).collect(),
        Err(e) if matches!(e.downcast_ref::<FormsError>(), Some(FormsError::NotInitialized { .. })) => {
            tracing::debug!("no form store yet");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    match context.format_or(OutputFormat::Table) {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No form schemas");
                return Ok(EXIT_SUCCESS);
            }
            println!("Form schemas: {}", rows.len());
            println!();

            let mut headers = vec!["Id", "Name", "Fields"];
            if context.verbose {
                headers.extend(["Derived", "Created"]);
            }
            headers.push("Updated");

            let mut table = create_table(headers);
            for row in &rows {
                let mut cells = vec![row.id.clone(), row.name.clone(), row.fields.to_string()];
                if context.verbose {
                    cells.push(row.derived.to_string());
                    cells.push(row.created_at.format("%Y-%m-%d %H:%M").to_string());
                }
                cells.push(row.updated_at.format("%Y-%m-%d %H:%M").to_string());
                table.add_row(cells);
            }
            println!("{table}");
        }
        format => print_structured(&rows, format)?,
    }

    Ok(EXIT_SUCCESS)
}
