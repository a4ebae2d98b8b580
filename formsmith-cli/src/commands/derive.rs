//! Derive command implementation

use std::path::Path;

use anyhow::Result;
use formsmith_fields::{FormField, FormData, NO_VALUE};

use super::{create_table, find_schema, ordered_fields, print_structured, read_data, CliContext};
use crate::cli::OutputFormat;
use crate::exit_codes::{EXIT_SUCCESS, EXIT_WARNING};

/// Execute the derive command - prints the data bag with derived fields
/// recomputed. JSON unless another format is asked for.
pub async fn execute_derive_command(id: &str, data: &Path, context: &CliContext) -> Result<i32> {
    let store = context.open_store(false).await?;
    let schema = find_schema(&store, id)?;
    let fields = ordered_fields(schema);
    let data = read_data(data, &fields).await?;

    let outcome = context.config.engine().refresh(&fields, &data);
    tracing::debug!(
        form = %schema.id,
        passes = outcome.passes,
        converged = outcome.converged,
        "refreshed derived fields"
    );

    match context.format_or(OutputFormat::Json) {
        OutputFormat::Table => print_table(&fields, &outcome.data),
        format => print_structured(&outcome.data, format)?,
    }

    if !outcome.cyclic.is_empty() {
        let ids: Vec<&str> = outcome.cyclic.iter().map(String::as_str).collect();
        eprintln!("Warning: fields depend on themselves: {}", ids.join(", "));
    }
    if !outcome.converged {
        eprintln!(
            "Warning: derived values still changing after {} passes",
            outcome.passes
        );
    }

    Ok(if outcome.converged && outcome.cyclic.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_WARNING
    })
}

fn print_table(fields: &[FormField], data: &FormData) {
    let mut table = create_table(vec!["Field", "Label", "Value"]);
    for field in fields {
        let value = match data.get(&field.id) {
            Some(value) => value.to_string(),
            None if field.is_derived => NO_VALUE.to_string(),
            None => String::new(),
        };
        table.add_row(vec![field.id.clone(), field.label.clone(), value]);
    }
    println!("{table}");
}
