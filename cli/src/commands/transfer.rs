use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use vitalog_core::models::ExportData;
use vitalog_core::transfer::{export_to_file, import_from_file};

use super::helpers::print_json;
use crate::backend::Backend;

/// Write a full snapshot into `dir` (or to stdout).
pub(crate) async fn cmd_export(
    backend: &Backend,
    dir: &Path,
    stdout: bool,
    json: bool,
) -> Result<()> {
    let data = backend.export_data().await?;
    let text = serde_json::to_string_pretty(&data)?;

    if stdout {
        println!("{text}");
        return Ok(());
    }

    let path = export_to_file(dir, &text)?;
    if json {
        print_json(&serde_json::json!({
            "path": path,
            "pills": data.pills.len(),
            "drinks": data.drinks.len(),
            "weights": data.weights.len(),
            "goals": data.goals.len(),
            "reminders": data.reminders.len(),
            "saved_messages": data.saved_messages.len(),
        }))
    } else {
        println!("Exported to {}", path.display());
        Ok(())
    }
}

/// Replace all stored data with the snapshot in `file`.
pub(crate) async fn cmd_import(backend: &Backend, file: &Path, json: bool) -> Result<()> {
    let Some(text) = import_from_file(Some(file))? else {
        return Ok(());
    };
    let data: ExportData = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a vitalog export", file.display()))?;
    let summary = backend.import_data(&data).await?;
    info!(file = %file.display(), "imported snapshot");

    if json {
        return print_json(&summary);
    }

    println!("Imported from {}", file.display());
    println!("  Pills:          {}", summary.pills_imported);
    println!("  Drinks:         {}", summary.drinks_imported);
    println!("  Weights:        {}", summary.weights_imported);
    println!("  Goals:          {}", summary.goals_imported);
    println!("  Reminders:      {}", summary.reminders_imported);
    println!("  Saved messages: {}", summary.saved_messages_imported);
    Ok(())
}
