//! Credlog: a credential registry rebuilt from ledger topic messages
//!
//! Credlog keeps no database. Institutions, credential forms and submissions
//! live as append-only events on ledger topics; every read pages through the
//! topic, decodes what it can and folds the events into current state.
//! - **Log reader**: pagination over any [`TopicReader`] (mirror node, file, memory)
//! - **Projector**: tolerant decoding plus create / patch / delete folding
//! - **Registry**: list / get / by-owner queries and event submission
//! - **Envelope**: AES-GCM + RSA-OAEP encryption for sensitive answers
//!
//! # Quick Start
//!
//! ```no_run
//! use credlog::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = RegistryConfig::from_env()?;
//! let registry = Registry::mirror(config)?;
//!
//! for record in registry.list_institutions().await? {
//!     println!("{} {}", record.key, record.entity.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod envelope;
pub mod memory;
pub mod mirror;
pub mod prelude;
pub mod reader;
pub mod registry;
pub mod visibility;
pub mod writer;

// Re-export core types
pub use credlog_core::{
    config::{
        BackoffStrategy, MirrorConfig, Network, ReaderConfig, RegistryConfig, TopicConfig,
        VisibilityConfig,
    },
    error::{CredlogError, Result},
    traits::{TopicReader, TopicWriter},
    types::{
        ConsensusTimestamp, CredentialForm, EventKind, FieldType, FormDeletion, FormField,
        FormSubmission, FormUpdate, Institution, InstitutionStatus, InstitutionUpdate,
        LedgerEvent, MessagePage, Order, SubmitReceipt, TopicId, TopicMessage,
    },
};

// Re-export implementations
pub use credlog_file_log::{FileTopicLog, FileTopicLogConfig};
pub use credlog_projector::{
    fold, DecodeStats, DecodedEvent, EventDecoder, JsonEventDecoder, Mutation, Projectable,
    Projection, ProjectionRun, ProjectionStats, Projector, Record, SkipReason,
};

// Re-export main types from this crate
pub use envelope::EncryptedEnvelope;
pub use memory::{MemoryTopicLog, MemoryTopicLogConfig};
pub use mirror::MirrorNodeClient;
pub use reader::LogReader;
pub use registry::Registry;
pub use visibility::{await_visible, Visibility};
pub use writer::ReadOnlyWriter;
