//! Import command implementation

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use formsmith_fields::{validate_schema_id, DependencyGraph, FormField, FormSchema};
use serde::Deserialize;
use ulid::Ulid;

use super::CliContext;
use crate::exit_codes::{EXIT_SUCCESS, EXIT_WARNING};

/// A schema as a person writes it: id and timestamps may be left out.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    fields: Vec<FormField>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
}

impl SchemaFile {
    fn into_schema(self) -> Result<FormSchema> {
        let now = Utc::now();
        let created_at = self.created_at.unwrap_or(now);
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("form_{}", Ulid::new().to_string().to_lowercase()));
        validate_schema_id(&id)?;

        let mut schema = FormSchema {
            id,
            name: self.name,
            fields: self.fields,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        };
        schema.normalize();
        Ok(schema)
    }
}

/// Parse a schema file, JSON when the extension says so, YAML otherwise.
fn parse_schema_file(path: &Path, content: &str) -> Result<FormSchema> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let file: SchemaFile = if is_json {
        serde_json::from_str(content)?
    } else {
        serde_yaml_ng::from_str(content)?
    };
    file.into_schema()
}

/// Execute the import command - stores a schema read from a file
pub async fn execute_import_command(path: &Path, context: &CliContext) -> Result<i32> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let schema = parse_schema_file(path, &content)
        .with_context(|| format!("parsing form schema in {}", path.display()))?;

    let graph = DependencyGraph::from_fields(&schema.fields);
    let cyclic = graph.cyclic_fields();
    if !cyclic.is_empty() {
        tracing::warn!(fields = ?cyclic, "imported schema has a dependency cycle");
    }

    let mut store = context.open_store(true).await?;
    let replacing = store.get_schema(&schema.id).is_some();
    let saved = store.save_schema(schema).await?;

    let verb = if replacing { "Updated" } else { "Imported" };
    println!("{verb} {} ({})", saved.id, saved.name);

    Ok(if cyclic.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_WARNING
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsmith_fields::{FieldType, FieldValue};

    #[test]
    fn yaml_without_id_gets_one() {
        let yaml = r#"
name: Contact
fields:
  - id: email
    type:
      kind: text
    label: Email
"#;
        let schema = parse_schema_file(Path::new("contact.yaml"), yaml).unwrap();
        assert!(schema.id.starts_with("form_"));
        assert_eq!(schema.name, "Contact");
        assert_eq!(schema.fields[0].type_, FieldType::Text);
        assert_eq!(schema.created_at, schema.updated_at);
    }

    #[test]
    fn json_keeps_given_id_and_normalizes_dates() {
        let json = r#"{
            "id": "form_contact",
            "name": "Contact",
            "fields": [
                {"id": "dob", "type": {"kind": "date"}, "label": "Born", "default_value": "2001-09-09"}
            ]
        }"#;
        let schema = parse_schema_file(Path::new("contact.JSON"), json).unwrap();
        assert_eq!(schema.id, "form_contact");
        assert!(matches!(
            schema.fields[0].default_value,
            Some(FieldValue::Date(_))
        ));
    }

    #[test]
    fn path_like_id_is_rejected() {
        let yaml = "id: ../outside\nname: Sneaky\nfields: []\n";
        let err = parse_schema_file(Path::new("sneaky.yaml"), yaml).unwrap_err();
        assert!(err.to_string().contains("invalid form schema id"));
    }

    #[test]
    fn missing_name_is_an_error() {
        assert!(parse_schema_file(Path::new("x.yaml"), "fields: []\n").is_err());
    }
}
