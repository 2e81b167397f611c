use async_trait::async_trait;
use credlog_core::{CredlogError, Result, SubmitReceipt, TopicId, TopicWriter};

/// Writer for read-only deployments
///
/// The mirror node only serves reads. Submitting to the ledger needs a signing
/// client, which is outside this crate; this writer rejects every submit so a
/// read-only registry fails loudly instead of dropping writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyWriter;

#[async_trait]
impl TopicWriter for ReadOnlyWriter {
    async fn submit(&self, topic: &TopicId, _message: &[u8]) -> Result<SubmitReceipt> {
        Err(CredlogError::Submit(format!(
            "topic {topic} is read-only: no ledger writer configured"
        )))
    }
}
