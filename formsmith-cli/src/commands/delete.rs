//! Delete command implementation

use anyhow::Result;

use super::CliContext;
use crate::exit_codes::EXIT_SUCCESS;

/// Execute the delete command - removes a stored schema and its file
pub async fn execute_delete_command(id: &str, context: &CliContext) -> Result<i32> {
    let mut store = context.open_store(false).await?;
    let removed = store.delete_schema(id).await?;
    println!("Deleted {} ({})", removed.id, removed.name);
    Ok(EXIT_SUCCESS)
}
