//! Event decoder: raw topic messages to typed events

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use credlog_core::observe;
use credlog_core::{ConsensusTimestamp, EventKind, LedgerEvent, TopicMessage};
use serde_json::Value;

/// A typed event plus its position in the log
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub event: LedgerEvent,
    pub sequence_number: u64,
    pub consensus_timestamp: ConsensusTimestamp,
}

impl DecodedEvent {
    pub fn new(
        event: LedgerEvent,
        sequence_number: u64,
        consensus_timestamp: ConsensusTimestamp,
    ) -> Self {
        Self {
            event,
            sequence_number,
            consensus_timestamp,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Total order used by the fold: timestamp, then log sequence
    pub fn position(&self) -> (ConsensusTimestamp, u64) {
        (self.consensus_timestamp, self.sequence_number)
    }
}

/// Why a topic message was not turned into an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    InvalidTimestamp,
    InvalidEncoding,
    InvalidJson,
    MissingKind,
    UnknownKind,
    InvalidPayload,
    MissingKey,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InvalidTimestamp => "invalid_timestamp",
            SkipReason::InvalidEncoding => "invalid_encoding",
            SkipReason::InvalidJson => "invalid_json",
            SkipReason::MissingKind => "missing_kind",
            SkipReason::UnknownKind => "unknown_kind",
            SkipReason::InvalidPayload => "invalid_payload",
            SkipReason::MissingKey => "missing_key",
        }
    }

    /// Unknown kinds belong to other applications sharing the topic
    fn is_malformed(&self) -> bool {
        !matches!(self, SkipReason::UnknownKind)
    }
}

/// Per-read decoding counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub decoded: usize,
    pub invalid_timestamp: usize,
    pub invalid_encoding: usize,
    pub invalid_json: usize,
    pub missing_kind: usize,
    pub unknown_kind: usize,
    pub invalid_payload: usize,
    pub missing_key: usize,
}

impl DecodeStats {
    pub fn skipped(&self) -> usize {
        self.invalid_timestamp
            + self.invalid_encoding
            + self.invalid_json
            + self.missing_kind
            + self.unknown_kind
            + self.invalid_payload
            + self.missing_key
    }

    /// Add another batch's counters to these
    pub fn merge(&mut self, other: &DecodeStats) {
        self.decoded += other.decoded;
        self.invalid_timestamp += other.invalid_timestamp;
        self.invalid_encoding += other.invalid_encoding;
        self.invalid_json += other.invalid_json;
        self.missing_kind += other.missing_kind;
        self.unknown_kind += other.unknown_kind;
        self.invalid_payload += other.invalid_payload;
        self.missing_key += other.missing_key;
    }

    fn record_skip(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::InvalidTimestamp => &mut self.invalid_timestamp,
            SkipReason::InvalidEncoding => &mut self.invalid_encoding,
            SkipReason::InvalidJson => &mut self.invalid_json,
            SkipReason::MissingKind => &mut self.missing_kind,
            SkipReason::UnknownKind => &mut self.unknown_kind,
            SkipReason::InvalidPayload => &mut self.invalid_payload,
            SkipReason::MissingKey => &mut self.missing_key,
        };
        *slot += 1;
    }
}

/// Event decoder: convert raw topic messages to typed events
pub trait EventDecoder: Send + Sync {
    /// Decode one message, or say why it is skipped
    fn decode(&self, message: &TopicMessage) -> Result<DecodedEvent, SkipReason>;

    /// Decode a batch, logging and counting every skipped message
    ///
    /// Never fails: a bad entry costs itself, not the rest of the batch.
    fn decode_all(&self, messages: &[TopicMessage]) -> (Vec<DecodedEvent>, DecodeStats) {
        let mut stats = DecodeStats::default();
        let mut events = Vec::with_capacity(messages.len());

        for message in messages {
            match self.decode(message) {
                Ok(event) => {
                    stats.decoded += 1;
                    events.push(event);
                }
                Err(reason) => {
                    if reason.is_malformed() {
                        tracing::warn!(
                            sequence_number = message.sequence_number,
                            consensus_timestamp = %message.consensus_timestamp,
                            reason = reason.as_str(),
                            "Skipping malformed topic message"
                        );
                    } else {
                        tracing::debug!(
                            sequence_number = message.sequence_number,
                            "Skipping message of unknown kind"
                        );
                    }
                    observe::record_decode_skip(reason.as_str());
                    stats.record_skip(reason);
                }
            }
        }

        (events, stats)
    }
}

/// Decoder for base64-wrapped `{ "type": ..., "data": ... }` JSON messages
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventDecoder;

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, message: &TopicMessage) -> Result<DecodedEvent, SkipReason> {
        let consensus_timestamp = message
            .consensus_timestamp
            .parse::<ConsensusTimestamp>()
            .map_err(|_| SkipReason::InvalidTimestamp)?;

        let bytes = STANDARD
            .decode(message.message.trim())
            .map_err(|_| SkipReason::InvalidEncoding)?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|_| SkipReason::InvalidJson)?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SkipReason::MissingKind)?;
        if EventKind::from_wire(kind).is_none() {
            return Err(SkipReason::UnknownKind);
        }

        let event: LedgerEvent =
            serde_json::from_value(value).map_err(|_| SkipReason::InvalidPayload)?;
        if event.subject_key().is_none() {
            return Err(SkipReason::MissingKey);
        }

        Ok(DecodedEvent {
            event,
            sequence_number: message.sequence_number,
            consensus_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(seq: u64, body: &[u8]) -> TopicMessage {
        TopicMessage {
            consensus_timestamp: format!("1700000000.{seq:09}"),
            sequence_number: seq,
            message: STANDARD.encode(body),
        }
    }

    fn json_message(seq: u64, value: serde_json::Value) -> TopicMessage {
        message(seq, value.to_string().as_bytes())
    }

    #[test]
    fn test_decodes_registration() {
        let msg = json_message(
            3,
            json!({
                "type": "INSTITUTION_REGISTRATION",
                "data": { "did": "did:hedera:acme", "name": "Acme", "type": "EDUCATION" }
            }),
        );

        let event = JsonEventDecoder.decode(&msg).unwrap();
        assert_eq!(event.kind(), EventKind::InstitutionRegistration);
        assert_eq!(event.sequence_number, 3);
        assert_eq!(event.consensus_timestamp, ConsensusTimestamp::new(1_700_000_000, 3));
        assert_eq!(event.event.subject_key(), Some("did:hedera:acme"));
    }

    #[test]
    fn test_skip_reasons() {
        let mut bad_ts = json_message(1, json!({ "type": "FORM_DELETION", "data": { "formId": "f" } }));
        bad_ts.consensus_timestamp = "yesterday".into();

        let bad_b64 = TopicMessage {
            consensus_timestamp: "1.0".into(),
            sequence_number: 2,
            message: "!!not base64!!".into(),
        };

        let cases = [
            (bad_ts, SkipReason::InvalidTimestamp),
            (bad_b64, SkipReason::InvalidEncoding),
            (message(3, b"not json at all"), SkipReason::InvalidJson),
            (message(4, &[0xff, 0xfe, 0x00]), SkipReason::InvalidJson),
            (json_message(5, json!({ "data": {} })), SkipReason::MissingKind),
            (json_message(6, json!({ "type": "CREDENTIAL_REQUEST", "data": {} })), SkipReason::UnknownKind),
            (json_message(7, json!({ "type": "FORM_CREATION", "data": { "name": "no id" } })), SkipReason::InvalidPayload),
            (json_message(8, json!({ "type": "INSTITUTION_UPDATE", "data": { "updates": {} } })), SkipReason::MissingKey),
        ];

        for (msg, expected) in cases {
            assert_eq!(JsonEventDecoder.decode(&msg).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_decode_all_continues_past_bad_entries() {
        let messages = vec![
            json_message(1, json!({ "type": "FORM_CREATION", "data": { "id": "f1", "institutionDid": "d" } })),
            message(2, b"{broken"),
            json_message(3, json!({ "type": "SOMETHING_ELSE", "data": {} })),
            json_message(4, json!({ "type": "FORM_DELETION", "data": { "formId": "f1" } })),
        ];

        let (events, stats) = JsonEventDecoder.decode_all(&messages);
        assert_eq!(events.len(), 2);
        assert_eq!(stats.decoded, 2);
        assert_eq!(stats.invalid_json, 1);
        assert_eq!(stats.unknown_kind, 1);
        assert_eq!(stats.skipped(), 2);
        assert_eq!(events[1].sequence_number, 4);
    }
}
