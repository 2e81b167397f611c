use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use credlog_core::{
    error::{CredlogError, Result},
    traits::{TopicReader, TopicWriter},
    types::{ConsensusTimestamp, MessagePage, Order, SubmitReceipt, TopicId, TopicMessage},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Configuration for the file-backed topic log
#[derive(Debug, Clone)]
pub struct FileTopicLogConfig {
    /// Directory holding one `<topic>.jsonl` file per topic
    pub base_dir: PathBuf,

    /// Messages returned per page
    pub page_size: usize,

    /// Largest accepted message body (bytes, before base64)
    pub max_message_size: usize,

    /// Flush the write buffer after each append (default: true)
    ///
    /// Reads always flush first, so this only matters for crash durability.
    pub flush_on_append: bool,
}

impl Default for FileTopicLogConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data/topics"),
            page_size: 100,
            // Ledger topic messages are capped at 1024 bytes per chunk and 20
            // chunks per message
            max_message_size: 20 * 1024,
            flush_on_append: true,
        }
    }
}

impl FileTopicLogConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Append state of one open topic file
struct TopicFile {
    writer: BufWriter<File>,
    next_sequence: u64,
    last_timestamp: Option<ConsensusTimestamp>,
}

/// File-backed topic log: reader and writer over local JSON-lines files
pub struct FileTopicLog {
    config: FileTopicLogConfig,
    open: Mutex<HashMap<TopicId, TopicFile>>,
}

impl FileTopicLog {
    /// Open or create a topic log directory
    pub fn open(config: FileTopicLogConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.base_dir)?;
        Ok(Self {
            config,
            open: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &FileTopicLogConfig {
        &self.config
    }

    fn topic_path(base_dir: &Path, topic: &TopicId) -> PathBuf {
        base_dir.join(format!("{topic}.jsonl"))
    }

    /// Read every intact entry of a topic file in append order
    fn read_entries(path: &Path) -> Result<Vec<TopicMessage>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TopicMessage>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %e,
                        "Skipping unreadable topic log line"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Open a topic for appending, recovering its position from disk
    fn open_topic(&self, topic: &TopicId) -> Result<TopicFile> {
        let path = Self::topic_path(&self.config.base_dir, topic);
        let existing = Self::read_entries(&path)?;

        let next_sequence = existing
            .iter()
            .map(|entry| entry.sequence_number)
            .max()
            .map_or(1, |last| last + 1);
        let last_timestamp = existing
            .iter()
            .filter_map(|entry| entry.consensus_timestamp.parse().ok())
            .max();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(TopicFile {
            writer: BufWriter::new(file),
            next_sequence,
            last_timestamp,
        })
    }

    /// Append a message body and return its receipt
    pub fn append(&self, topic: &TopicId, message: &[u8]) -> Result<SubmitReceipt> {
        if message.len() > self.config.max_message_size {
            return Err(CredlogError::Submit(format!(
                "Message size {} exceeds max_message_size {}",
                message.len(),
                self.config.max_message_size
            )));
        }

        let mut open = self.open.lock();
        if !open.contains_key(topic) {
            let file = self.open_topic(topic)?;
            open.insert(*topic, file);
        }
        let state = open
            .get_mut(topic)
            .ok_or_else(|| CredlogError::InvalidState(format!("topic {topic} not open")))?;

        let now = ConsensusTimestamp::from_datetime(chrono::Utc::now());
        let consensus_timestamp = match state.last_timestamp {
            Some(last) if now <= last => successor(last),
            _ => now,
        };
        let sequence_number = state.next_sequence;

        let entry = TopicMessage {
            consensus_timestamp: consensus_timestamp.to_string(),
            sequence_number,
            message: STANDARD.encode(message),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(state.writer, "{line}")?;
        if self.config.flush_on_append {
            state.writer.flush()?;
        }

        state.next_sequence += 1;
        state.last_timestamp = Some(consensus_timestamp);

        tracing::debug!(
            topic = %topic,
            sequence_number,
            consensus_timestamp = %consensus_timestamp,
            "Appended topic message"
        );

        Ok(SubmitReceipt {
            topic_id: *topic,
            sequence_number,
            consensus_timestamp,
        })
    }

    /// Every entry of a topic in append order
    pub fn read_all(&self, topic: &TopicId) -> Result<Vec<TopicMessage>> {
        {
            let mut open = self.open.lock();
            if let Some(state) = open.get_mut(topic) {
                state.writer.flush()?;
            }
        }
        Self::read_entries(&Self::topic_path(&self.config.base_dir, topic))
    }

    /// Build one page starting after `cursor`
    fn page(&self, topic: &TopicId, order: Order, cursor: Option<&str>) -> Result<MessagePage> {
        let (order, after) = match cursor {
            None => (order, None),
            Some(cursor) => {
                let (order, seq) = parse_cursor(cursor)?;
                (order, Some(seq))
            }
        };

        let mut entries = self.read_all(topic)?;
        if order == Order::Desc {
            entries.reverse();
        }
        let mut remaining = entries.into_iter().filter(|entry| match (order, after) {
            (_, None) => true,
            (Order::Asc, Some(seq)) => entry.sequence_number > seq,
            (Order::Desc, Some(seq)) => entry.sequence_number < seq,
        });

        let messages: Vec<TopicMessage> = remaining.by_ref().take(self.config.page_size).collect();
        let more = remaining.next().is_some();

        let next = match messages.last() {
            Some(last) if more => Some(format!("{}:{}", order.as_str(), last.sequence_number)),
            _ => None,
        };
        Ok(MessagePage { messages, next })
    }
}

#[async_trait]
impl TopicReader for FileTopicLog {
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
impl TopicWriter for FileTopicLog {
    async fn submit(&self, topic: &TopicId, message: &[u8]) -> Result<SubmitReceipt> {
        self.append(topic, message)
    }
}

/// Smallest timestamp strictly after `ts`
fn successor(ts: ConsensusTimestamp) -> ConsensusTimestamp {
    if ts.nanos >= 999_999_999 {
        ConsensusTimestamp::new(ts.seconds + 1, 0)
    } else {
        ConsensusTimestamp::new(ts.seconds, ts.nanos + 1)
    }
}

/// Cursor format: `<order>:<last sequence number returned>`
fn parse_cursor(cursor: &str) -> Result<(Order, u64)> {
    let invalid = || CredlogError::InvalidState(format!("invalid page cursor: {cursor}"));
    let (order, seq) = cursor.split_once(':').ok_or_else(invalid)?;
    let order = order.parse::<Order>().map_err(|_| invalid())?;
    let seq = seq.parse::<u64>().map_err(|_| invalid())?;
    Ok((order, seq))
}
