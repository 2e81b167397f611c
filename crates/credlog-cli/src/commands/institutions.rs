//! Institution commands

use super::print_json;
use crate::InstitutionCommands;
use anyhow::{Context, Result};
use credlog::prelude::*;

pub async fn execute(registry: &Registry, cmd: InstitutionCommands, json: bool) -> Result<()> {
    match cmd {
        InstitutionCommands::List { owner } => {
            let records = match &owner {
                Some(owner) => registry
                    .institutions_by_owner(owner)
                    .await
                    .context("Failed to read institutions")?,
                None => registry
                    .list_institutions()
                    .await
                    .context("Failed to read institutions")?,
            };

            if json {
                return print_json(&records);
            }

            println!("\nInstitutions ({})", records.len());
            println!("{}", "=".repeat(60));
            for record in &records {
                print_summary(record);
            }
        }
        InstitutionCommands::Show { key } => {
            let record = registry
                .get_institution(&key)
                .await
                .context("Failed to read institution")?;

            match record {
                Some(record) if json => print_json(&record)?,
                Some(record) => print_details(&record),
                None => println!("Institution not found: {key}"),
            }
        }
    }

    Ok(())
}

fn print_summary(record: &Record<Institution>) {
    let inst = &record.entity;
    println!(
        "{:<40} {:<30} {:<12} {:?}",
        record.key, inst.name, inst.institution_type, inst.status
    );
}

fn print_details(record: &Record<Institution>) {
    let inst = &record.entity;
    println!("\nInstitution");
    println!("{}", "=".repeat(60));
    println!("Key: {}", record.key);
    println!("Name: {}", inst.name);
    println!("Type: {}", inst.institution_type);
    println!("Status: {:?}", inst.status);
    if let Some(creator) = &inst.creator_id {
        println!("Creator: {creator}");
    }
    if let Some(topic) = &inst.topic_id {
        println!("Topic: {topic}");
    }
    if let Some(description) = &inst.description {
        println!("Description: {description}");
    }
    for (field, value) in &inst.extra {
        println!("{field}: {value}");
    }
    println!("\nCreated: {}", format_timestamp(&record.created_at));
    println!("Updated: {} (sequence {})", format_timestamp(&record.updated_at), record.sequence_number);
}

pub(crate) fn format_timestamp(ts: &ConsensusTimestamp) -> String {
    match ts.to_datetime() {
        Some(dt) => format!("{} ({ts})", dt.to_rfc3339()),
        None => ts.to_string(),
    }
}
