//! Credlog Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use credlog::prelude::*;
//! ```

// Core types
pub use crate::{
    ConsensusTimestamp, CredentialForm, CredlogError, EventKind, FieldType, FormField, FormSubmission,
    Institution, InstitutionStatus, LedgerEvent, Order, Result, SubmitReceipt, TopicId,
    TopicMessage,
};

// Configs
pub use crate::{
    BackoffStrategy, MirrorConfig, Network, ReaderConfig, RegistryConfig, TopicConfig,
    VisibilityConfig,
};

// Traits
pub use crate::{EventDecoder, Projectable, TopicReader, TopicWriter};

// Implementations
pub use crate::{
    FileTopicLog, FileTopicLogConfig, LogReader, MemoryTopicLog, MemoryTopicLogConfig,
    MirrorNodeClient, ReadOnlyWriter, Registry,
};

// Projection
pub use crate::{fold, Projection, ProjectionRun, Projector, Record};

// Visibility and encryption
pub use crate::{await_visible, EncryptedEnvelope, Visibility};

// Re-export common external deps
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
