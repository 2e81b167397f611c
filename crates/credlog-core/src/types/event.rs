//! Ledger events carried inside topic messages
//!
//! Wire shape is `{ "type": KIND, "data": { ... } }`, UTF-8 JSON.

use crate::types::entity::{CredentialForm, FormSubmission, Institution};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Discriminator of a [`LedgerEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InstitutionRegistration,
    InstitutionUpdate,
    FormCreation,
    FormUpdate,
    FormDeletion,
    Submission,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::InstitutionRegistration,
        EventKind::InstitutionUpdate,
        EventKind::FormCreation,
        EventKind::FormUpdate,
        EventKind::FormDeletion,
        EventKind::Submission,
    ];

    /// Wire name written in the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::InstitutionRegistration => "INSTITUTION_REGISTRATION",
            EventKind::InstitutionUpdate => "INSTITUTION_UPDATE",
            EventKind::FormCreation => "FORM_CREATION",
            EventKind::FormUpdate => "FORM_UPDATE",
            EventKind::FormDeletion => "FORM_DELETION",
            EventKind::Submission => "SUBMISSION",
        }
    }

    /// Resolve a wire name, including the legacy `FORM` record type
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "INSTITUTION_REGISTRATION" => Some(EventKind::InstitutionRegistration),
            "INSTITUTION_UPDATE" => Some(EventKind::InstitutionUpdate),
            "FORM_CREATION" | "FORM" => Some(EventKind::FormCreation),
            "FORM_UPDATE" => Some(EventKind::FormUpdate),
            "FORM_DELETION" => Some(EventKind::FormDeletion),
            "SUBMISSION" => Some(EventKind::Submission),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Partial update of an institution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Field set shallow-merged into the current record
    #[serde(default)]
    pub updates: Map<String, Value>,
}

impl InstitutionUpdate {
    pub fn for_key(key: impl Into<String>, updates: Map<String, Value>) -> Self {
        Self {
            did: None,
            id: Some(key.into()),
            updates,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.did.as_deref().or(self.id.as_deref())
    }
}

/// Partial update of a credential form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormUpdate {
    #[serde(alias = "id")]
    pub form_id: String,

    #[serde(default)]
    pub updates: Map<String, Value>,
}

/// Removal of a credential form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDeletion {
    #[serde(alias = "id")]
    pub form_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Event published to a registry topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    #[serde(rename = "INSTITUTION_REGISTRATION")]
    InstitutionRegistration(Institution),

    #[serde(rename = "INSTITUTION_UPDATE")]
    InstitutionUpdate(InstitutionUpdate),

    #[serde(rename = "FORM_CREATION", alias = "FORM")]
    FormCreation(CredentialForm),

    #[serde(rename = "FORM_UPDATE")]
    FormUpdate(FormUpdate),

    #[serde(rename = "FORM_DELETION")]
    FormDeletion(FormDeletion),

    #[serde(rename = "SUBMISSION")]
    Submission(FormSubmission),
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::InstitutionRegistration(_) => EventKind::InstitutionRegistration,
            LedgerEvent::InstitutionUpdate(_) => EventKind::InstitutionUpdate,
            LedgerEvent::FormCreation(_) => EventKind::FormCreation,
            LedgerEvent::FormUpdate(_) => EventKind::FormUpdate,
            LedgerEvent::FormDeletion(_) => EventKind::FormDeletion,
            LedgerEvent::Submission(_) => EventKind::Submission,
        }
    }

    /// Key of the entity this event targets, if the payload carries one
    pub fn subject_key(&self) -> Option<&str> {
        match self {
            LedgerEvent::InstitutionRegistration(inst) => inst.key(),
            LedgerEvent::InstitutionUpdate(update) => update.key(),
            LedgerEvent::FormCreation(form) => Some(form.id.as_str()),
            LedgerEvent::FormUpdate(update) => Some(update.form_id.as_str()),
            LedgerEvent::FormDeletion(deletion) => Some(deletion.form_id.as_str()),
            LedgerEvent::Submission(submission) => Some(submission.id.as_str()),
        }
        .filter(|key| !key.is_empty())
    }

    /// Serialize to the UTF-8 JSON body submitted to the ledger
    pub fn to_message_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_roundtrip_through_kind() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_wire("FORM"), Some(EventKind::FormCreation));
        assert_eq!(EventKind::from_wire("CREDENTIAL_REQUEST"), None);
    }

    #[test]
    fn test_registration_wire_shape() {
        let event = LedgerEvent::InstitutionRegistration(
            Institution::new("Acme").with_did("did:hedera:acme"),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "INSTITUTION_REGISTRATION");
        assert_eq!(value["data"]["did"], "did:hedera:acme");
        assert_eq!(value["data"]["status"], "pending");
    }

    #[test]
    fn test_legacy_form_record_decodes_as_creation() {
        let event: LedgerEvent = serde_json::from_value(json!({
            "type": "FORM",
            "data": { "id": "form-9", "issuerId": "did:x", "name": "Legacy" }
        }))
        .unwrap();
        assert_eq!(event.kind(), EventKind::FormCreation);
        assert_eq!(event.subject_key(), Some("form-9"));
    }

    #[test]
    fn test_form_update_accepts_id_alias() {
        let event: LedgerEvent = serde_json::from_value(json!({
            "type": "FORM_UPDATE",
            "data": { "id": "form-1", "updates": { "active": false } }
        }))
        .unwrap();
        match event {
            LedgerEvent::FormUpdate(update) => {
                assert_eq!(update.form_id, "form-1");
                assert_eq!(update.updates["active"], false);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_update_without_key_has_no_subject() {
        let event = LedgerEvent::InstitutionUpdate(InstitutionUpdate {
            did: None,
            id: None,
            updates: Map::new(),
        });
        assert_eq!(event.subject_key(), None);
    }
}
