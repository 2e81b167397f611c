use crate::error::CredlogError;
use crate::types::topic::TopicId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Consensus timestamp assigned by the ledger, `seconds.nanoseconds`
///
/// Field order matters: the derived `Ord` compares seconds, then nanos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConsensusTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl ConsensusTimestamp {
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

impl FromStr for ConsensusTimestamp {
    type Err = CredlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CredlogError::InvalidTimestamp(s.to_string());

        let (secs, frac) = match s.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (s, ""),
        };

        let seconds: i64 = secs.parse().map_err(|_| invalid())?;

        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let nanos = if frac.is_empty() {
            0
        } else {
            // "5" means 500_000_000ns, so pad on the right
            format!("{frac:0<9}").parse().map_err(|_| invalid())?
        };

        Ok(Self { seconds, nanos })
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl Serialize for ConsensusTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConsensusTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Raw topic entry as served by the mirror node
///
/// Everything stays opaque here: the timestamp is the wire string and the
/// payload is still base64. Validation is the event decoder's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    /// Consensus timestamp as reported (`"1700000000.123456789"`)
    pub consensus_timestamp: String,

    /// Position of the message within its topic, starting at 1
    pub sequence_number: u64,

    /// Base64-encoded message body
    pub message: String,
}

/// One page of topic messages plus the continuation cursor
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub messages: Vec<TopicMessage>,

    /// Opaque cursor for the next page; `None` when the topic is exhausted
    pub next: Option<String>,
}

impl MessagePage {
    pub fn last(messages: Vec<TopicMessage>) -> Self {
        Self {
            messages,
            next: None,
        }
    }
}

/// Read direction over a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl FromStr for Order {
    type Err = CredlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(CredlogError::Config(format!("unknown order: {other}"))),
        }
    }
}

/// Acknowledgement returned by the ledger once a message is durably appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub topic_id: TopicId,
    pub sequence_number: u64,
    pub consensus_timestamp: ConsensusTimestamp,
}
