//! File-backed topic log
//!
//! A local stand-in for a ledger topic plus its mirror node. Each topic is a
//! JSON-lines file of [`TopicMessage`](credlog_core::TopicMessage) entries in
//! append order, so the same reader, decoder and projector code runs against
//! it unchanged.
//!
//! Features:
//! - Sequence numbers start at 1 and increase by one per append
//! - Consensus timestamps are wall-clock, forced strictly increasing
//! - Paged reads in either direction with an opaque cursor
//! - Truncated trailing lines from a crash are skipped on read

mod store;

pub use store::{FileTopicLog, FileTopicLogConfig};
