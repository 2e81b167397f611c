//! Projection map and per-kind merge rules

use crate::decoder::DecodedEvent;
use credlog_core::{
    ConsensusTimestamp, CredentialForm, FormSubmission, Institution, LedgerEvent,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// What an event does to one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<E> {
    /// Establish (or replace, if newer) the baseline record
    Create { key: String, entity: E },

    /// Shallow-merge a field set into an existing record
    Patch { key: String, fields: Map<String, Value> },

    /// Tombstone the record
    Delete { key: String },
}

/// An entity type that can be rebuilt from ledger events
pub trait Projectable: Clone + Serialize + DeserializeOwned {
    /// Map an event to a mutation of this entity type, or `None` if the
    /// event concerns something else
    fn mutation(event: &LedgerEvent) -> Option<Mutation<Self>>;

    /// Projection key carried by the entity itself
    fn key(&self) -> Option<&str>;

    /// Owner used by `by_owner` queries
    fn owner(&self) -> Option<&str>;

    /// Other names the entity answers to besides its key
    fn aliases(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl Projectable for Institution {
    fn mutation(event: &LedgerEvent) -> Option<Mutation<Self>> {
        match event {
            LedgerEvent::InstitutionRegistration(inst) => Some(Mutation::Create {
                key: inst.key()?.to_string(),
                entity: inst.clone(),
            }),
            LedgerEvent::InstitutionUpdate(update) => Some(Mutation::Patch {
                key: update.key()?.to_string(),
                fields: update.updates.clone(),
            }),
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        Institution::key(self)
    }

    fn owner(&self) -> Option<&str> {
        self.creator_id.as_deref()
    }

    /// The id, when the DID is the key
    fn aliases(&self) -> Vec<&str> {
        match (self.did.as_deref(), self.id.as_deref()) {
            (Some(did), Some(id)) if !did.is_empty() && !id.is_empty() && did != id => vec![id],
            _ => Vec::new(),
        }
    }
}

impl Projectable for CredentialForm {
    fn mutation(event: &LedgerEvent) -> Option<Mutation<Self>> {
        match event {
            LedgerEvent::FormCreation(form) => Some(Mutation::Create {
                key: form.id.clone(),
                entity: form.clone(),
            }),
            LedgerEvent::FormUpdate(update) => Some(Mutation::Patch {
                key: update.form_id.clone(),
                fields: update.updates.clone(),
            }),
            LedgerEvent::FormDeletion(deletion) => Some(Mutation::Delete {
                key: deletion.form_id.clone(),
            }),
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn owner(&self) -> Option<&str> {
        Some(&self.institution_did)
    }
}

impl Projectable for FormSubmission {
    fn mutation(event: &LedgerEvent) -> Option<Mutation<Self>> {
        match event {
            LedgerEvent::Submission(submission) => Some(Mutation::Create {
                key: submission.id.clone(),
                entity: submission.clone(),
            }),
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn owner(&self) -> Option<&str> {
        Some(&self.form_id)
    }
}

/// Current state of one entity plus where it came from in the log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
    pub key: String,
    pub entity: E,

    /// Consensus time of the creation event that established the record
    pub created_at: ConsensusTimestamp,

    /// Consensus time of the last applied event
    pub updated_at: ConsensusTimestamp,

    /// Sequence number of the last applied event
    pub sequence_number: u64,
}

impl<E> Record<E> {
    fn position(&self) -> (ConsensusTimestamp, u64) {
        (self.updated_at, self.sequence_number)
    }
}

/// Counters for one fold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    /// Events that targeted this entity type
    pub events_seen: usize,
    pub created: usize,
    pub replaced: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Updates or deletions for keys not in the projection
    pub orphaned: usize,
    /// Events not newer than the record they targeted
    pub stale_skipped: usize,
    /// Updates whose merged result was not a valid entity
    pub rejected_updates: usize,
}

/// `key → Record<E>`, derived by replaying events from empty
///
/// Updates, deletions and lookups may name a record by an alias (an
/// institution's `id` when it is keyed by DID). Aliases are learned from the
/// creation events applied so far.
#[derive(Debug, Clone)]
pub struct Projection<E> {
    records: HashMap<String, Record<E>>,
    aliases: HashMap<String, String>,
    stats: ProjectionStats,
}

impl<E> Default for Projection<E> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            aliases: HashMap::new(),
            stats: ProjectionStats::default(),
        }
    }
}

impl<E: Projectable> Projection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    ///
    /// Callers must apply events oldest-first; [`fold`](crate::fold) sorts
    /// before applying. An event that is not strictly newer than the record
    /// it targets is ignored, which also makes duplicate entries harmless.
    pub fn apply(&mut self, event: &DecodedEvent) {
        let Some(mutation) = E::mutation(&event.event) else {
            return;
        };
        self.stats.events_seen += 1;

        let position = event.position();
        let ts = event.consensus_timestamp;
        let seq = event.sequence_number;

        match mutation {
            Mutation::Create { key, entity } => match self.records.get_mut(&key) {
                None => {
                    self.learn_aliases(&key, &entity);
                    self.records.insert(
                        key.clone(),
                        Record {
                            key,
                            entity,
                            created_at: ts,
                            updated_at: ts,
                            sequence_number: seq,
                        },
                    );
                    self.stats.created += 1;
                }
                Some(record) if position > record.position() => {
                    record.entity = entity;
                    record.updated_at = ts;
                    record.sequence_number = seq;
                    self.stats.replaced += 1;
                    let entity = record.entity.clone();
                    self.learn_aliases(&key, &entity);
                }
                Some(_) => self.stats.stale_skipped += 1,
            },

            Mutation::Patch { key, fields } => {
                let key = self.resolve(&key).to_string();
                match self.records.get_mut(&key) {
                    None => {
                        tracing::debug!(key = %key, sequence_number = seq, "Discarding orphan update");
                        self.stats.orphaned += 1;
                    }
                    Some(record) if position > record.position() => {
                        match merge_fields(&record.entity, &fields) {
                            Ok(merged) if merged.key() == Some(key.as_str()) => {
                                record.entity = merged;
                                record.updated_at = ts;
                                record.sequence_number = seq;
                                self.stats.updated += 1;
                            }
                            Ok(_) => {
                                tracing::warn!(key = %key, sequence_number = seq, "Update tried to change the record key, discarding");
                                self.stats.rejected_updates += 1;
                            }
                            Err(e) => {
                                tracing::warn!(key = %key, sequence_number = seq, error = %e, "Update produced an invalid record, discarding");
                                self.stats.rejected_updates += 1;
                            }
                        }
                    }
                    Some(_) => self.stats.stale_skipped += 1,
                }
            }

            Mutation::Delete { key } => {
                let key = self.resolve(&key).to_string();
                match self.records.get(&key) {
                    None => self.stats.orphaned += 1,
                    Some(record) if position > record.position() => {
                        self.records.remove(&key);
                        self.stats.deleted += 1;
                    }
                    Some(_) => self.stats.stale_skipped += 1,
                }
            }
        }
    }

    /// Look up a record by key or alias
    pub fn get(&self, key: &str) -> Option<&Record<E>> {
        self.records.get(self.resolve(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Key of the record `name` refers to; a real key wins over an alias
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        if self.records.contains_key(name) {
            return name;
        }
        self.aliases.get(name).map_or(name, String::as_str)
    }

    fn learn_aliases(&mut self, key: &str, entity: &E) {
        for alias in entity.aliases() {
            self.aliases.insert(alias.to_string(), key.to_string());
        }
    }

    /// All records, oldest creation first (ties by key)
    pub fn list(&self) -> Vec<&Record<E>> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| (a.created_at, &a.key).cmp(&(b.created_at, &b.key)));
        records
    }

    /// Records whose owner matches
    pub fn by_owner(&self, owner: &str) -> Vec<&Record<E>> {
        self.list()
            .into_iter()
            .filter(|record| record.entity.owner() == Some(owner))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &ProjectionStats {
        &self.stats
    }

    /// Consume into records, oldest creation first
    pub fn into_records(self) -> Vec<Record<E>> {
        let mut records: Vec<_> = self.records.into_values().collect();
        records.sort_by(|a, b| (a.created_at, &a.key).cmp(&(b.created_at, &b.key)));
        records
    }
}

/// Shallow merge: every top-level field in `fields` replaces the entity's
fn merge_fields<E: Serialize + DeserializeOwned>(
    entity: &E,
    fields: &Map<String, Value>,
) -> serde_json::Result<E> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(object) = &mut value {
        for (name, field) in fields {
            object.insert(name.clone(), field.clone());
        }
    }
    serde_json::from_value(value)
}
