//! In-process topic log
//!
//! Stands in for the ledger plus mirror node in tests and embedded use.
//! Appends can be given a propagation delay, modelling the gap between a
//! ledger acknowledgement and the mirror node serving the message.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use credlog_core::{
    ConsensusTimestamp, CredlogError, MessagePage, Order, Result, SubmitReceipt, TopicId,
    TopicMessage, TopicReader, TopicWriter,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct MemoryTopicLogConfig {
    /// Messages returned per page
    pub page_size: usize,

    /// Delay between a submit being acknowledged and the message being readable
    pub propagation_delay: Duration,
}

impl Default for MemoryTopicLogConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            propagation_delay: Duration::ZERO,
        }
    }
}

impl MemoryTopicLogConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }
}

struct Entry {
    message: TopicMessage,
    visible_at: Instant,
}

#[derive(Default)]
struct Topic {
    entries: Vec<Entry>,
    next_sequence: u64,
    last_timestamp: ConsensusTimestamp,
}

/// Topic reader and writer held entirely in memory
pub struct MemoryTopicLog {
    config: MemoryTopicLogConfig,
    topics: Mutex<HashMap<TopicId, Topic>>,
    pages_served: AtomicUsize,
}

impl Default for MemoryTopicLog {
    fn default() -> Self {
        Self::new(MemoryTopicLogConfig::default())
    }
}

impl MemoryTopicLog {
    pub fn new(config: MemoryTopicLogConfig) -> Self {
        Self {
            config,
            topics: Mutex::new(HashMap::new()),
            pages_served: AtomicUsize::new(0),
        }
    }

    /// Append a message body, assigning the next sequence number and timestamp
    pub fn append(&self, topic: &TopicId, message: &[u8]) -> SubmitReceipt {
        let mut topics = self.topics.lock();
        let state = topics.entry(*topic).or_default();

        state.next_sequence += 1;
        let sequence_number = state.next_sequence;
        let consensus_timestamp = next_timestamp(state.last_timestamp);
        state.last_timestamp = consensus_timestamp;

        state.entries.push(Entry {
            message: TopicMessage {
                consensus_timestamp: consensus_timestamp.to_string(),
                sequence_number,
                message: STANDARD.encode(message),
            },
            visible_at: Instant::now() + self.config.propagation_delay,
        });

        SubmitReceipt {
            topic_id: *topic,
            sequence_number,
            consensus_timestamp,
        }
    }

    /// Append an entry exactly as given, visible immediately
    ///
    /// For feeding malformed or out-of-order entries to readers.
    pub fn append_raw(&self, topic: &TopicId, message: TopicMessage) {
        let mut topics = self.topics.lock();
        let state = topics.entry(*topic).or_default();
        state.next_sequence = state.next_sequence.max(message.sequence_number);
        if let Ok(ts) = message.consensus_timestamp.parse::<ConsensusTimestamp>() {
            state.last_timestamp = state.last_timestamp.max(ts);
        }
        state.entries.push(Entry {
            message,
            visible_at: Instant::now(),
        });
    }

    /// Number of entries stored for a topic, visible or not
    pub fn len(&self, topic: &TopicId) -> usize {
        self.topics
            .lock()
            .get(topic)
            .map_or(0, |state| state.entries.len())
    }

    pub fn is_empty(&self, topic: &TopicId) -> bool {
        self.len(topic) == 0
    }

    /// Pages served so far, across all topics
    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::Relaxed)
    }

    fn page(&self, topic: &TopicId, order: Order, cursor: Option<&str>) -> Result<MessagePage> {
        let (order, after) = match cursor {
            None => (order, None),
            Some(cursor) => {
                let (order, seq) = parse_cursor(cursor)?;
                (order, Some(seq))
            }
        };

        let now = Instant::now();
        let topics = self.topics.lock();
        let mut visible: Vec<&TopicMessage> = topics
            .get(topic)
            .map(|state| {
                state
                    .entries
                    .iter()
                    .filter(|entry| entry.visible_at <= now)
                    .map(|entry| &entry.message)
                    .collect()
            })
            .unwrap_or_default();
        visible.sort_by_key(|message| message.sequence_number);
        if order == Order::Desc {
            visible.reverse();
        }

        let mut remaining = visible.into_iter().filter(|message| match (order, after) {
            (_, None) => true,
            (Order::Asc, Some(seq)) => message.sequence_number > seq,
            (Order::Desc, Some(seq)) => message.sequence_number < seq,
        });
        let messages: Vec<TopicMessage> = remaining
            .by_ref()
            .take(self.config.page_size)
            .cloned()
            .collect();
        let more = remaining.next().is_some();

        let next = match messages.last() {
            Some(last) if more => Some(format!("{}:{}", order.as_str(), last.sequence_number)),
            _ => None,
        };

        self.pages_served.fetch_add(1, Ordering::Relaxed);
        Ok(MessagePage { messages, next })
    }
}

fn next_timestamp(last: ConsensusTimestamp) -> ConsensusTimestamp {
    let now = ConsensusTimestamp::from_datetime(chrono::Utc::now());
    if now > last {
        now
    } else if last.nanos >= 999_999_999 {
        ConsensusTimestamp::new(last.seconds + 1, 0)
    } else {
        ConsensusTimestamp::new(last.seconds, last.nanos + 1)
    }
}

/// Cursor format: `<order>:<last sequence number served>`
fn parse_cursor(cursor: &str) -> Result<(Order, u64)> {
    let invalid = || CredlogError::InvalidState(format!("invalid page cursor: {cursor}"));
    let (order, seq) = cursor.split_once(':').ok_or_else(invalid)?;
    Ok((
        order.parse().map_err(|_| invalid())?,
        seq.parse().map_err(|_| invalid())?,
    ))
}

#[async_trait]
impl TopicReader for MemoryTopicLog {
    async fn fetch_page(
        &self,
        topic: &TopicId,
        order: Order,
        cursor: Option<&str>,
    ) -> Result<MessagePage> {
        self.page(topic, order, cursor)
    }
}

#[async_trait]
impl TopicWriter for MemoryTopicLog {
    async fn submit(&self, topic: &TopicId, message: &[u8]) -> Result<SubmitReceipt> {
        Ok(self.append(topic, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: TopicId = TopicId::new(0, 0, 1);

    #[tokio::test(start_paused = true)]
    async fn test_propagation_delay_hides_new_messages() {
        let log = MemoryTopicLog::new(
            MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(2)),
        );
        let receipt = log.submit(&TOPIC, b"hello").await.unwrap();
        assert_eq!(receipt.sequence_number, 1);

        let page = log.fetch_page(&TOPIC, Order::Asc, None).await.unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(log.len(&TOPIC), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let page = log.fetch_page(&TOPIC, Order::Asc, None).await.unwrap();
        assert_eq!(page.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let log = MemoryTopicLog::default();
        let a = log.append(&TOPIC, b"a");
        let b = log.append(&TOPIC, b"b");
        assert!(a.consensus_timestamp < b.consensus_timestamp);
    }

    #[tokio::test]
    async fn test_desc_paging() {
        let log = MemoryTopicLog::new(MemoryTopicLogConfig::default().with_page_size(2));
        for i in 0..3 {
            log.append(&TOPIC, &[i]);
        }

        let first = log.fetch_page(&TOPIC, Order::Desc, None).await.unwrap();
        let seqs: Vec<_> = first.messages.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![3, 2]);

        let second = log
            .fetch_page(&TOPIC, Order::Desc, first.next.as_deref())
            .await
            .unwrap();
        assert_eq!(second.messages[0].sequence_number, 1);
        assert!(second.next.is_none());
        assert_eq!(log.pages_served(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_desc_paging_skips_messages_that_appear_mid_read() {
        let log = MemoryTopicLog::new(
            MemoryTopicLogConfig::default()
                .with_page_size(2)
                .with_propagation_delay(Duration::from_secs(1)),
        );
        for i in 0..3 {
            log.append(&TOPIC, &[i]);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        log.append(&TOPIC, b"late");

        let first = log.fetch_page(&TOPIC, Order::Desc, None).await.unwrap();
        let seqs: Vec<_> = first.messages.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![3, 2]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let second = log
            .fetch_page(&TOPIC, Order::Desc, first.next.as_deref())
            .await
            .unwrap();
        let seqs: Vec<_> = second.messages.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![1]);
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn test_rejects_malformed_cursor() {
        let log = MemoryTopicLog::default();
        let err = log.fetch_page(&TOPIC, Order::Asc, Some("asc:nope")).await.unwrap_err();
        assert!(matches!(err, CredlogError::InvalidState(_)));
    }
}
