use crate::error::Result;
use crate::types::{MessagePage, Order, SubmitReceipt, TopicId};
use async_trait::async_trait;

/// Read side of a topic: one page per call
///
/// Implementations perform a single request and never retry. Pagination is
/// driven by the caller, which passes back the `next` cursor of the previous
/// page until it is `None` or the caller decides to stop.
#[async_trait]
pub trait TopicReader: Send + Sync {
    /// Fetch one page of messages
    ///
    /// - `cursor`: `None` for the first page, else the previous page's `next`
    /// - `order`: only honored for the first page; cursors carry their own
    async fn fetch_page(
        &self,
        topic: &TopicId,
        order: Order,
        cursor: Option<&str>,
    ) -> Result<MessagePage>;
}

/// Write side of a topic
///
/// Returning `Ok` means the ledger acknowledged a durable append. It does
/// not mean the message is visible to readers yet.
#[async_trait]
pub trait TopicWriter: Send + Sync {
    /// Append a message body (UTF-8 JSON) to the topic
    async fn submit(&self, topic: &TopicId, message: &[u8]) -> Result<SubmitReceipt>;
}
