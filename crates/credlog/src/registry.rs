//! Query façade over the registry topics
//!
//! Every read replays its topic from scratch: there is no cache and nothing
//! is shared between calls, so concurrent callers never see each other's
//! partial state.
//!
//! # Consistency
//!
//! Writes are acknowledged by the ledger before the mirror node serves them.
//! A read issued right after [`Registry::submit_event`] may not include the
//! new event. Treat that as expected; use [`Registry::await_institution`] or
//! [`Registry::await_form`] when fresh state is required.

use crate::mirror::MirrorNodeClient;
use crate::reader::LogReader;
use crate::visibility::{await_visible, Visibility};
use crate::writer::ReadOnlyWriter;
use credlog_core::observe;
use credlog_core::{
    CredentialForm, CredlogError, FormDeletion, FormSubmission, FormUpdate, Institution,
    InstitutionUpdate, LedgerEvent, Order, RegistryConfig, Result, SubmitReceipt, TopicId,
    TopicReader, TopicWriter,
};
use credlog_projector::{
    DecodeStats, DecodedEvent, EventDecoder, JsonEventDecoder, Projectable, ProjectionRun,
    Projector, Record,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Read and write access to a credential registry
pub struct Registry {
    reader: LogReader,
    writer: Arc<dyn TopicWriter>,
    projector: Projector,
    config: RegistryConfig,
}

impl Registry {
    /// Build a registry from explicit reader and writer handles
    pub fn new(
        reader: Arc<dyn TopicReader>,
        writer: Arc<dyn TopicWriter>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            reader: LogReader::new(reader, config.reader.clone()),
            writer,
            projector: Projector::new(),
            config,
        }
    }

    /// Read-only registry over the configured mirror node
    pub fn mirror(config: RegistryConfig) -> Result<Self> {
        let client = MirrorNodeClient::new(config.mirror.clone())?;
        Ok(Self::new(Arc::new(client), Arc::new(ReadOnlyWriter), config))
    }

    /// Build a registry over one handle that both reads and writes
    pub fn with_log<L>(log: Arc<L>, config: RegistryConfig) -> Self
    where
        L: TopicReader + TopicWriter + 'static,
    {
        Self::new(log.clone(), log, config)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn reader(&self) -> &LogReader {
        &self.reader
    }

    /// Replay a topic into a projection of `E`
    pub async fn project<E: Projectable>(&self, topic: &TopicId) -> Result<ProjectionRun<E>> {
        let messages = self.reader.read_all(topic, Order::Asc).await?;
        Ok(self.projector.project(&messages))
    }

    /// Read and decode every event on `topic`
    async fn decode_topic(&self, topic: &TopicId) -> Result<(Vec<DecodedEvent>, DecodeStats)> {
        let messages = self.reader.read_all(topic, Order::Asc).await?;
        Ok(self.projector.decode(&messages))
    }

    // Institutions

    pub async fn list_institutions(&self) -> Result<Vec<Record<Institution>>> {
        let run = self
            .project::<Institution>(&self.config.topics.institution_topic)
            .await?;
        Ok(run.projection.into_records())
    }

    /// Current state of one institution, or `None` if it was never registered
    ///
    /// `key` may be the DID or the id. Reads the institution topic
    /// newest-first and stops once a registration for `key` has been seen;
    /// anything older is superseded by it. `created_at` is therefore the time
    /// of the most recent registration. If the institution has a topic of its
    /// own, the `INSTITUTION_UPDATE` events found there are merged in too.
    pub async fn get_institution(&self, key: &str) -> Result<Option<Record<Institution>>> {
        let (mut events, mut decode) = self.latest_registration_events(key).await?;
        let run = self.projector.project_events::<Institution>(&events, decode.clone());
        let Some(record) = run.projection.get(key) else {
            return Ok(None);
        };

        let own_topic = match own_topic(&record.entity) {
            Some(topic) if topic != self.config.topics.institution_topic => topic,
            _ => return Ok(Some(record.clone())),
        };

        let (own_events, own_decode) = self.decode_topic(&own_topic).await?;
        decode.merge(&own_decode);
        events.extend(
            own_events
                .into_iter()
                .filter(|decoded| matches!(decoded.event, LedgerEvent::InstitutionUpdate(_))),
        );
        tracing::debug!(institution = key, topic = %own_topic, "Merging updates from institution topic");

        let run = self.projector.project_events::<Institution>(&events, decode);
        Ok(run.projection.get(key).cloned())
    }

    /// Events on the institution topic back to the latest registration of `key`
    async fn latest_registration_events(
        &self,
        key: &str,
    ) -> Result<(Vec<DecodedEvent>, DecodeStats)> {
        let decoder = JsonEventDecoder;
        let messages = self
            .reader
            .read_until(&self.config.topics.institution_topic, Order::Desc, |page| {
                page.iter()
                    .filter_map(|message| decoder.decode(message).ok())
                    .any(|decoded| {
                        matches!(
                            &decoded.event,
                            LedgerEvent::InstitutionRegistration(inst) if inst.is_named(key)
                        )
                    })
            })
            .await?;
        Ok(self.projector.decode(&messages))
    }

    /// Institutions registered by `owner` (matched on `creatorId`)
    ///
    /// Registrations and updates are gathered from the institution topic and
    /// the app topic, where older clients published them.
    pub async fn institutions_by_owner(&self, owner: &str) -> Result<Vec<Record<Institution>>> {
        let topics = &self.config.topics;
        let (mut events, mut decode) = self.decode_topic(&topics.institution_topic).await?;
        let app_topic = topics.app_topic();
        if app_topic != topics.institution_topic {
            let (app_events, app_decode) = self.decode_topic(&app_topic).await?;
            events.extend(app_events);
            decode.merge(&app_decode);
        }

        let run = self.projector.project_events::<Institution>(&events, decode);
        Ok(run.projection.by_owner(owner).into_iter().cloned().collect())
    }

    pub async fn register_institution(&self, institution: Institution) -> Result<SubmitReceipt> {
        if institution.key().map_or(true, str::is_empty) {
            return Err(CredlogError::InvalidState(
                "institution needs a did or id".to_string(),
            ));
        }
        self.submit_event(
            &self.config.topics.institution_topic,
            &LedgerEvent::InstitutionRegistration(institution),
        )
        .await
    }

    /// Shallow-merge `updates` into the institution
    pub async fn update_institution(
        &self,
        key: &str,
        updates: Map<String, Value>,
    ) -> Result<SubmitReceipt> {
        self.submit_event(
            &self.config.topics.institution_topic,
            &LedgerEvent::InstitutionUpdate(InstitutionUpdate::for_key(key, updates)),
        )
        .await
    }

    pub async fn deactivate_institution(&self, key: &str) -> Result<SubmitReceipt> {
        let mut updates = Map::new();
        updates.insert("status".to_string(), Value::from("inactive"));
        self.update_institution(key, updates).await
    }

    /// Wait until `key` is readable
    pub async fn await_institution(&self, key: &str) -> Result<Visibility<Record<Institution>>> {
        await_visible(&self.config.visibility, || self.get_institution(key)).await
    }

    /// Wait until reads of `key` include the event behind `receipt`
    ///
    /// Use after an update, where [`await_institution`](Self::await_institution)
    /// would return the older state straight away.
    pub async fn await_institution_change(
        &self,
        key: &str,
        receipt: &SubmitReceipt,
    ) -> Result<Visibility<Record<Institution>>> {
        await_visible(&self.config.visibility, || async move {
            Ok(self
                .get_institution(key)
                .await?
                .filter(|record| record.updated_at >= receipt.consensus_timestamp))
        })
        .await
    }

    // Forms

    /// Topic holding an institution's forms: its own topic if it has one,
    /// else the app topic
    pub async fn forms_topic(&self, institution_did: &str) -> Result<TopicId> {
        let (events, decode) = self.latest_registration_events(institution_did).await?;
        let run = self.projector.project_events::<Institution>(&events, decode);
        Ok(run
            .projection
            .get(institution_did)
            .and_then(|record| own_topic(&record.entity))
            .unwrap_or_else(|| self.config.topics.app_topic()))
    }

    pub async fn forms_for_institution(
        &self,
        institution_did: &str,
    ) -> Result<Vec<Record<CredentialForm>>> {
        let topic = self.forms_topic(institution_did).await?;
        let run = self.project::<CredentialForm>(&topic).await?;
        Ok(run
            .projection
            .by_owner(institution_did)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn get_form(
        &self,
        institution_did: &str,
        form_id: &str,
    ) -> Result<Option<Record<CredentialForm>>> {
        let topic = self.forms_topic(institution_did).await?;
        let run = self.project::<CredentialForm>(&topic).await?;
        Ok(run
            .projection
            .get(form_id)
            .filter(|record| record.entity.institution_did == institution_did)
            .cloned())
    }

    pub async fn create_form(&self, form: CredentialForm) -> Result<SubmitReceipt> {
        if form.id.is_empty() || form.institution_did.is_empty() {
            return Err(CredlogError::InvalidState(
                "form needs an id and an institutionDid".to_string(),
            ));
        }
        let topic = self.forms_topic(&form.institution_did).await?;
        self.submit_event(&topic, &LedgerEvent::FormCreation(form)).await
    }

    pub async fn update_form(
        &self,
        institution_did: &str,
        form_id: &str,
        updates: Map<String, Value>,
    ) -> Result<SubmitReceipt> {
        let topic = self.forms_topic(institution_did).await?;
        let event = LedgerEvent::FormUpdate(FormUpdate {
            form_id: form_id.to_string(),
            updates,
        });
        self.submit_event(&topic, &event).await
    }

    pub async fn delete_form(&self, institution_did: &str, form_id: &str) -> Result<SubmitReceipt> {
        let topic = self.forms_topic(institution_did).await?;
        let event = LedgerEvent::FormDeletion(FormDeletion {
            form_id: form_id.to_string(),
            deleted_at: Some(chrono::Utc::now().to_rfc3339()),
        });
        self.submit_event(&topic, &event).await
    }

    /// Wait until a form is readable
    pub async fn await_form(
        &self,
        institution_did: &str,
        form_id: &str,
    ) -> Result<Visibility<Record<CredentialForm>>> {
        await_visible(&self.config.visibility, || {
            self.get_form(institution_did, form_id)
        })
        .await
    }

    /// Wait until reads of a form include the event behind `receipt`
    pub async fn await_form_change(
        &self,
        institution_did: &str,
        form_id: &str,
        receipt: &SubmitReceipt,
    ) -> Result<Visibility<Record<CredentialForm>>> {
        await_visible(&self.config.visibility, || async move {
            Ok(self
                .get_form(institution_did, form_id)
                .await?
                .filter(|record| record.updated_at >= receipt.consensus_timestamp))
        })
        .await
    }

    /// Wait until a deleted form no longer shows up in reads
    pub async fn await_form_removed(
        &self,
        institution_did: &str,
        form_id: &str,
    ) -> Result<Visibility<()>> {
        await_visible(&self.config.visibility, || async move {
            Ok(self
                .get_form(institution_did, form_id)
                .await?
                .is_none()
                .then_some(()))
        })
        .await
    }

    // Submissions

    pub async fn submissions_for_form(&self, form_id: &str) -> Result<Vec<Record<FormSubmission>>> {
        let topic = self.config.topics.submission_topic();
        let run = self.project::<FormSubmission>(&topic).await?;
        Ok(run.projection.by_owner(form_id).into_iter().cloned().collect())
    }

    pub async fn submit_application(&self, submission: FormSubmission) -> Result<SubmitReceipt> {
        if submission.id.is_empty() || submission.form_id.is_empty() {
            return Err(CredlogError::InvalidState(
                "submission needs an id and a formId".to_string(),
            ));
        }
        let topic = self.config.topics.submission_topic();
        self.submit_event(&topic, &LedgerEvent::Submission(submission))
            .await
    }

    /// Append an event to a topic
    ///
    /// Returns once the ledger acknowledges the append. The event is not
    /// necessarily visible to reads yet; see the module docs.
    pub async fn submit_event(&self, topic: &TopicId, event: &LedgerEvent) -> Result<SubmitReceipt> {
        let body = event.to_message_bytes()?;
        let result = self.writer.submit(topic, &body).await;
        observe::record_submit(result.is_ok());

        match &result {
            Ok(receipt) => tracing::info!(
                topic = %topic,
                kind = %event.kind(),
                sequence_number = receipt.sequence_number,
                "Submitted event"
            ),
            Err(e) => tracing::error!(
                topic = %topic,
                kind = %event.kind(),
                error = %e,
                "Failed to submit event"
            ),
        }
        result
    }
}

/// The institution's own topic, if it names a valid one
fn own_topic(institution: &Institution) -> Option<TopicId> {
    let raw = institution.topic_id.as_deref().filter(|raw| !raw.is_empty())?;
    match raw.parse::<TopicId>() {
        Ok(topic) => Some(topic),
        Err(e) => {
            tracing::warn!(
                institution = institution.key().unwrap_or_default(),
                topic_id = raw,
                error = %e,
                "Institution has an invalid topicId, ignoring it"
            );
            None
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
