//! Registry entities reconstructed from the topic
//!
//! Every entity keeps unrecognized fields in `extra` so that a shallow merge
//! of an update never drops data written by a newer client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of an institution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
    Active,
    Inactive,
    Suspended,
}

/// An institution that issues credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    /// Decentralized identifier; preferred key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    /// Application-assigned id; key when no DID is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Institution type (e.g. `EDUCATION`, `GOVERNMENT`)
    #[serde(rename = "type", default)]
    pub institution_type: String,

    #[serde(default)]
    pub status: InstitutionStatus,

    /// Account that registered the institution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,

    /// The institution's own topic, where its forms are published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Institution {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            did: None,
            id: None,
            name: name.into(),
            institution_type: String::new(),
            status: InstitutionStatus::default(),
            creator_id: None,
            topic_id: None,
            description: None,
            extra: Map::new(),
        }
    }

    pub fn with_did(mut self, did: impl Into<String>) -> Self {
        self.did = Some(did.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, institution_type: impl Into<String>) -> Self {
        self.institution_type = institution_type.into();
        self
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    pub fn with_status(mut self, status: InstitutionStatus) -> Self {
        self.status = status;
        self
    }

    /// Projection key: the DID when present, else the id
    pub fn key(&self) -> Option<&str> {
        self.did.as_deref().or(self.id.as_deref())
    }

    /// Whether `name` is this institution's DID or id
    pub fn is_named(&self, name: &str) -> bool {
        self.did.as_deref() == Some(name) || self.id.as_deref() == Some(name)
    }
}

/// Input type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    File,
    Select,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Choices for `select` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FormField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: None,
            name: name.into(),
            label: None,
            field_type,
            required: false,
            options: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A credential-issuing form published by an institution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialForm {
    pub id: String,

    /// Owning institution; older records call it `issuerId`
    #[serde(default, alias = "issuerId")]
    pub institution_did: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub fields: Vec<FormField>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl CredentialForm {
    pub fn new(
        id: impl Into<String>,
        institution_did: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            institution_did: institution_did.into(),
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
            active: default_active(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An application submitted against a form
///
/// Answers are kept in `extra`; sensitive ones usually arrive as an
/// encrypted envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub id: String,

    pub form_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormSubmission {
    pub fn new(id: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            form_id: form_id.into(),
            applicant_id: None,
            extra: Map::new(),
        }
    }
}
