//! Credlog Core: Traits and types for ledger-backed credential registries
//!
//! This crate defines the core abstractions for rebuilding registry state
//! from an append-only topic on a public ledger:
//! - Topic messages: timestamped, base64-encoded, JSON-wrapped entries
//! - Ledger events: the tagged union carried inside each message
//! - Entities: institutions, credential forms and form submissions
//! - Topic reader/writer traits: the seams to the mirror node and the ledger
//!
//! Key properties:
//! - No local database: every projection is derived by replaying the topic
//! - Tolerant decoding: one malformed entry never stops a read
//! - Eventual visibility: a submitted event shows up on a later read, not
//!   necessarily the next one

pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{
    BackoffStrategy, MirrorConfig, Network, ReaderConfig, RegistryConfig, TopicConfig,
    VisibilityConfig,
};
pub use error::{CredlogError, Result};
pub use traits::{TopicReader, TopicWriter};
pub use types::{
    ConsensusTimestamp, CredentialForm, EventKind, FieldType, FormDeletion, FormField,
    FormSubmission, FormUpdate, Institution, InstitutionStatus, InstitutionUpdate, LedgerEvent,
    MessagePage, Order, SubmitReceipt, TopicId, TopicMessage,
};
