//! Validate command implementation

use std::path::Path;

use anyhow::Result;
use formsmith_fields::{FieldError, FormSchema, FormSession, FormValidation};

use super::{create_table, find_schema, ordered_fields, print_structured, read_data, CliContext};
use crate::cli::OutputFormat;
use crate::config::ErrorDisplay;
use crate::exit_codes::{EXIT_SUCCESS, EXIT_WARNING};

/// Execute the validate command - checks a data bag the way a submit would
///
/// Derived fields are recomputed before the rules run, so derived values in
/// the input are ignored.
pub async fn execute_validate_command(id: &str, data: &Path, context: &CliContext) -> Result<i32> {
    let store = context.open_store(false).await?;
    let schema = find_schema(&store, id)?;
    let data = read_data(data, &ordered_fields(schema)).await?;

    let mut session = FormSession::with_data(schema.clone(), context.config.engine(), &data);
    let validation = session.submit();
    let report = shape_report(&validation, context.config.error_display);

    tracing::debug!(
        form = %schema.id,
        valid = report.is_valid,
        errors = report.errors.len(),
        "validated data"
    );

    match context.format_or(OutputFormat::Table) {
        OutputFormat::Table => print_table(schema, &report),
        format => print_structured(&report, format)?,
    }

    Ok(if report.is_valid {
        EXIT_SUCCESS
    } else {
        EXIT_WARNING
    })
}

/// Every error, or one per field per the configured display mode.
fn shape_report(validation: &FormValidation, display: ErrorDisplay) -> FormValidation {
    match display {
        ErrorDisplay::All => validation.clone(),
        ErrorDisplay::Last => FormValidation::from_errors(
            validation
                .errors_by_field()
                .into_iter()
                .map(|(field_id, message)| FieldError { field_id, message })
                .collect(),
        ),
    }
}

fn print_table(schema: &FormSchema, report: &FormValidation) {
    if report.is_valid {
        println!("✅ Valid");
        return;
    }
    println!("❌ {} error(s)", report.errors.len());
    println!();
    let mut table = create_table(vec!["Field", "Label", "Message"]);
    for error in &report.errors {
        let label = schema
            .get_field(&error.field_id)
            .map_or("", |f| f.label.as_str());
        table.add_row(vec![error.field_id.as_str(), label, error.message.as_str()]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(field_id: &str, message: &str) -> FieldError {
        FieldError {
            field_id: field_id.into(),
            message: message.into(),
        }
    }

    #[test]
    fn last_mode_keeps_final_message_per_field() {
        let validation = FormValidation::from_errors(vec![
            error("email", "Email is required"),
            error("name", "Name is required"),
            error("email", "Please enter a valid email address"),
        ]);
        let report = shape_report(&validation, ErrorDisplay::Last);
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            [
                error("email", "Please enter a valid email address"),
                error("name", "Name is required"),
            ]
        );
    }

    #[test]
    fn all_mode_keeps_everything() {
        let validation = FormValidation::from_errors(vec![error("a", "x"), error("a", "y")]);
        assert_eq!(shape_report(&validation, ErrorDisplay::All), validation);
    }
}
