//! Topic dump: every message with its decoded event or skip reason

use super::print_json;
use anyhow::{Context, Result};
use credlog::prelude::*;
use credlog::JsonEventDecoder;
use serde_json::json;

pub async fn execute(registry: &Registry, topic: &TopicId, order: Order, json: bool) -> Result<()> {
    let messages = registry
        .reader()
        .read_all(topic, order)
        .await
        .with_context(|| format!("Failed to read topic {topic}"))?;

    let decoder = JsonEventDecoder;

    if json {
        let rows: Vec<_> = messages
            .iter()
            .map(|message| match decoder.decode(message) {
                Ok(decoded) => json!({
                    "sequenceNumber": message.sequence_number,
                    "consensusTimestamp": message.consensus_timestamp,
                    "event": decoded.event,
                }),
                Err(reason) => json!({
                    "sequenceNumber": message.sequence_number,
                    "consensusTimestamp": message.consensus_timestamp,
                    "skipped": reason.as_str(),
                }),
            })
            .collect();
        return print_json(&rows);
    }

    println!("\nTopic {} ({} messages, {})", topic, messages.len(), order.as_str());
    println!("{}", "=".repeat(60));

    let mut skipped = 0usize;
    for message in &messages {
        match decoder.decode(message) {
            Ok(decoded) => {
                let key = decoded.event.subject_key().unwrap_or("-");
                println!(
                    "#{:<6} {}  {:<26} {}",
                    message.sequence_number,
                    message.consensus_timestamp,
                    decoded.kind(),
                    key
                );
            }
            Err(reason) => {
                skipped += 1;
                println!(
                    "#{:<6} {}  (skipped: {})",
                    message.sequence_number,
                    message.consensus_timestamp,
                    reason.as_str()
                );
            }
        }
    }

    if skipped > 0 {
        println!("\n{skipped} message(s) skipped");
    }

    Ok(())
}
