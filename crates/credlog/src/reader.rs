//! Log reader: drives pagination over a [`TopicReader`]

use credlog_core::observe;
use credlog_core::{
    CredlogError, Order, ReaderConfig, Result, TopicId, TopicMessage, TopicReader,
};
use std::sync::Arc;
use std::time::Instant;

/// Sequential page walker over one topic
///
/// Keeps requesting while the source returns a `next` cursor and the caller's
/// stop predicate has not fired. A failed page aborts the whole read; there
/// is no retry here.
#[derive(Clone)]
pub struct LogReader {
    source: Arc<dyn TopicReader>,
    config: ReaderConfig,
}

impl LogReader {
    pub fn new(source: Arc<dyn TopicReader>, config: ReaderConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read the whole topic
    pub async fn read_all(&self, topic: &TopicId, order: Order) -> Result<Vec<TopicMessage>> {
        self.read_until(topic, order, |_| false).await
    }

    /// Read pages until the topic is exhausted or `stop` returns true
    ///
    /// `stop` sees each page as it arrives. The page that triggers the stop is
    /// still part of the result.
    pub async fn read_until<F>(
        &self,
        topic: &TopicId,
        order: Order,
        mut stop: F,
    ) -> Result<Vec<TopicMessage>>
    where
        F: FnMut(&[TopicMessage]) -> bool + Send,
    {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let start = Instant::now();
            let page = self
                .source
                .fetch_page(topic, order, cursor.as_deref())
                .await?;
            pages += 1;
            observe::record_page_fetch(start.elapsed(), page.messages.len());

            tracing::debug!(
                topic = %topic,
                page = pages,
                messages = page.messages.len(),
                has_next = page.next.is_some(),
                "Fetched topic page"
            );

            let stopped = stop(&page.messages);
            messages.extend(page.messages);
            if stopped {
                tracing::debug!(topic = %topic, pages, "Stopping read early");
                break;
            }

            let Some(next) = page.next else {
                break;
            };
            if cursor.as_deref() == Some(next.as_str()) {
                return Err(CredlogError::InvalidState(format!(
                    "topic {topic} returned the same cursor twice: {next}"
                )));
            }
            if let Some(max) = self.config.max_pages {
                if pages >= max {
                    return Err(CredlogError::Transport(format!(
                        "topic {topic} has more than {max} pages (max_pages)"
                    )));
                }
            }
            cursor = Some(next);
        }

        Ok(messages)
    }
}

impl std::fmt::Debug for LogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogReader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
