//! Projector: folds topic messages into current registry state
//!
//! Pipeline:
//! - Decoder: base64 → JSON → typed [`LedgerEvent`](credlog_core::LedgerEvent),
//!   skipping anything malformed or unknown without aborting the read
//! - Fold: events sorted oldest-first by (consensus timestamp, sequence) and
//!   applied with per-kind create / patch / delete rules
//! - Projection: `key → Record<E>`, always rebuildable from an empty map

pub mod decoder;
pub mod projection;
pub mod projector;

pub use decoder::{DecodeStats, DecodedEvent, EventDecoder, JsonEventDecoder, SkipReason};
pub use projection::{Mutation, Projectable, Projection, ProjectionStats, Record};
pub use projector::{fold, ProjectionRun, Projector};
