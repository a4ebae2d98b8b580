//! Show command implementation

use anyhow::Result;
use formsmith_fields::{FormField, ValidationRule};

use super::{create_table, find_schema, ordered_fields, print_structured, CliContext};
use crate::cli::OutputFormat;
use crate::exit_codes::EXIT_SUCCESS;

/// Execute the show command - prints one schema's fields in form order
pub async fn execute_show_command(id: &str, context: &CliContext) -> Result<i32> {
    let store = context.open_store(false).await?;
    let schema = find_schema(&store, id)?;

    match context.format_or(OutputFormat::Table) {
        OutputFormat::Table => {
            println!("{} ({})", schema.name, schema.id);
            println!();
            let mut table = create_table(vec![
                "#", "Id", "Label", "Type", "Required", "Rules", "Derived",
            ]);
            for field in ordered_fields(schema) {
                table.add_row(vec![
                    field.order.to_string(),
                    field.id.clone(),
                    field.label.clone(),
                    describe_type(&field),
                    if field.required { "yes" } else { "" }.to_string(),
                    describe_rules(&field.validation_rules),
                    describe_derivation(&field),
                ]);
            }
            println!("{table}");
        }
        format => print_structured(schema, format)?,
    }

    Ok(EXIT_SUCCESS)
}

fn describe_type(field: &FormField) -> String {
    match field.type_.options() {
        Some(options) if !options.is_empty() => {
            let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            format!("{} [{}]", field.type_.name(), values.join(", "))
        }
        _ => field.type_.name().to_string(),
    }
}

fn describe_rules(rules: &[ValidationRule]) -> String {
    rules
        .iter()
        .map(|rule| match &rule.value {
            Some(value) => format!("{}={value}", rule.kind.name()),
            None => rule.kind.name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_derivation(field: &FormField) -> String {
    match field.derivation() {
        Some(config) => format!(
            "{}({})",
            config.computation.name(),
            config.parent_fields.join(", ")
        ),
        None if field.is_derived => "unconfigured".to_string(),
        None => String::new(),
    }
}
