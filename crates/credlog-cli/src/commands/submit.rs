//! Submit command: append one event to a topic

use anyhow::{anyhow, Context, Result};
use credlog::prelude::*;
use serde_json::{json, Value};

pub async fn execute(
    registry: &Registry,
    kind: &str,
    data: &str,
    topic: Option<TopicId>,
    institution: Option<&str>,
) -> Result<()> {
    let receipt = submit(registry, kind, data, topic, institution).await?;
    println!(
        "✓ Submitted {} to {} (sequence {}, consensus {})",
        kind.to_ascii_uppercase(),
        receipt.topic_id,
        receipt.sequence_number,
        receipt.consensus_timestamp
    );
    Ok(())
}

async fn submit(
    registry: &Registry,
    kind: &str,
    data: &str,
    topic: Option<TopicId>,
    institution: Option<&str>,
) -> Result<SubmitReceipt> {
    let kind = EventKind::from_wire(&kind.to_ascii_uppercase())
        .ok_or_else(|| anyhow!("Unknown event kind: {kind}"))?;
    let data: Value = serde_json::from_str(data).context("--data is not valid JSON")?;

    let event: LedgerEvent = serde_json::from_value(json!({ "type": kind.as_str(), "data": data }))
        .with_context(|| format!("--data is not a valid {kind} payload"))?;
    if event.subject_key().is_none() {
        anyhow::bail!("{kind} payload has no key (did, id or formId)");
    }

    let topic = match topic {
        Some(topic) => topic,
        None => default_topic(registry, &event, institution).await?,
    };
    tracing::debug!(kind = %kind, topic = %topic, "Submitting event");

    registry
        .submit_event(&topic, &event)
        .await
        .context("Failed to submit event")
}

/// Topic the registry itself would use for `event`
async fn default_topic(
    registry: &Registry,
    event: &LedgerEvent,
    institution: Option<&str>,
) -> Result<TopicId> {
    let topics = &registry.config().topics;
    let institution_did = match event {
        LedgerEvent::InstitutionRegistration(_) | LedgerEvent::InstitutionUpdate(_) => {
            return Ok(topics.institution_topic)
        }
        LedgerEvent::Submission(_) => return Ok(topics.submission_topic()),
        LedgerEvent::FormCreation(form) => institution.unwrap_or(&form.institution_did),
        LedgerEvent::FormUpdate(_) | LedgerEvent::FormDeletion(_) => institution.ok_or_else(|| {
            anyhow!("{} needs --institution or --topic to find the form's topic", event.kind())
        })?,
    };

    registry
        .forms_topic(institution_did)
        .await
        .with_context(|| format!("Failed to resolve the forms topic of {institution_did}"))
}
