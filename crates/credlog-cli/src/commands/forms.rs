//! Form commands

use super::print_json;
use anyhow::{Context, Result};
use credlog::prelude::*;

pub async fn execute(registry: &Registry, institution_did: &str, json: bool) -> Result<()> {
    let records = registry
        .forms_for_institution(institution_did)
        .await
        .with_context(|| format!("Failed to read forms of {institution_did}"))?;

    if json {
        return print_json(&records);
    }

    println!("\nForms of {} ({})", institution_did, records.len());
    println!("{}", "=".repeat(60));
    for record in &records {
        let form = &record.entity;
        let state = if form.active { "active" } else { "inactive" };
        println!("{:<36} {:<30} {}", record.key, form.name, state);
        for field in &form.fields {
            let required = if field.required { " *" } else { "" };
            println!("    - {} ({:?}){}", field.name, field.field_type, required);
        }
    }

    Ok(())
}
