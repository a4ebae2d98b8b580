//! Check command implementation

use anyhow::Result;
use formsmith_fields::{ComputationKind, DependencyGraph, FormSchema, RuleKind};
use serde::Serialize;

use super::{create_table, find_schema, print_structured, CliContext};
use crate::cli::OutputFormat;
use crate::exit_codes::{EXIT_SUCCESS, EXIT_WARNING};

/// A structural problem found in a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Issue {
    field_id: String,
    problem: String,
}

impl Issue {
    fn new(field_id: &str, problem: impl Into<String>) -> Self {
        Self {
            field_id: field_id.to_string(),
            problem: problem.into(),
        }
    }
}

/// Problems that make derived fields or rules silently do nothing.
fn find_issues(schema: &FormSchema) -> Vec<Issue> {
    let graph = DependencyGraph::from_fields(&schema.fields);
    let mut issues: Vec<Issue> = graph
        .cyclic_fields()
        .iter()
        .map(|id| Issue::new(id, "part of a dependency cycle"))
        .collect();

    issues.extend(
        graph
            .dangling_parents()
            .into_iter()
            .map(|(id, parent)| Issue::new(id, format!("parent field `{parent}` does not exist"))),
    );

    for field in &schema.fields {
        if field.is_derived && field.derived_config.is_none() {
            issues.push(Issue::new(&field.id, "derived without a configuration"));
        }
        if let Some(config) = field.derivation() {
            if config.computation == ComputationKind::Unknown {
                issues.push(Issue::new(&field.id, "unknown computation"));
            }
            if config.parent_fields.is_empty() && config.computation != ComputationKind::Custom {
                issues.push(Issue::new(&field.id, "no parent fields"));
            }
        }
        if field
            .validation_rules
            .iter()
            .any(|rule| rule.kind == RuleKind::Unknown)
        {
            issues.push(Issue::new(&field.id, "unknown validation rule type"));
        }
    }
    issues
}

/// Execute the check command - reports structural problems in a schema
pub async fn execute_check_command(id: &str, context: &CliContext) -> Result<i32> {
    let store = context.open_store(false).await?;
    let schema = find_schema(&store, id)?;
    let issues = find_issues(schema);

    match context.format_or(OutputFormat::Table) {
        OutputFormat::Table => {
            if issues.is_empty() {
                println!("✅ No problems found in {}", schema.id);
            } else {
                println!("⚠️  {} problem(s) in {}", issues.len(), schema.id);
                println!();
                let mut table = create_table(vec!["Field", "Problem"]);
                for issue in &issues {
                    table.add_row(vec![issue.field_id.as_str(), issue.problem.as_str()]);
                }
                println!("{table}");
            }
        }
        format => print_structured(&issues, format)?,
    }

    Ok(if issues.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_WARNING
    })
}
