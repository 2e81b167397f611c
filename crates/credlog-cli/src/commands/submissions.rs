//! Submission commands

use super::print_json;
use anyhow::{Context, Result};
use credlog::prelude::*;

pub async fn execute(registry: &Registry, form_id: &str, json: bool) -> Result<()> {
    let records = registry
        .submissions_for_form(form_id)
        .await
        .with_context(|| format!("Failed to read submissions for {form_id}"))?;

    if json {
        return print_json(&records);
    }

    println!("\nSubmissions for {} ({})", form_id, records.len());
    println!("{}", "=".repeat(60));
    for record in &records {
        let applicant = record.entity.applicant_id.as_deref().unwrap_or("-");
        println!("{:<36} {:<16} {}", record.key, applicant, record.created_at);
    }

    Ok(())
}
