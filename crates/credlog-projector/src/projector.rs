use crate::decoder::{DecodeStats, DecodedEvent, EventDecoder, JsonEventDecoder};
use crate::projection::{Projectable, Projection};
use credlog_core::observe;
use credlog_core::TopicMessage;
use std::time::{Duration, Instant};

/// Replay events into a fresh projection, oldest first
///
/// Input order does not matter: events are stably sorted by
/// (consensus timestamp, sequence number) before being applied, so pages
/// fetched newest-first produce the same result as pages fetched in order.
pub fn fold<E: Projectable>(events: &[DecodedEvent]) -> Projection<E> {
    let mut ordered: Vec<&DecodedEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.position());

    let mut projection = Projection::new();
    for event in ordered {
        projection.apply(event);
    }
    projection
}

/// Output of one projector run
#[derive(Debug, Clone)]
pub struct ProjectionRun<E> {
    pub projection: Projection<E>,
    pub decode: DecodeStats,
    pub duration: Duration,
}

/// Projector: decodes raw topic messages and folds them into a projection
#[derive(Debug, Clone, Default)]
pub struct Projector<D = JsonEventDecoder> {
    decoder: D,
}

impl Projector<JsonEventDecoder> {
    pub fn new() -> Self {
        Self {
            decoder: JsonEventDecoder,
        }
    }
}

impl<D: EventDecoder> Projector<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Decode without folding
    pub fn decode(&self, messages: &[TopicMessage]) -> (Vec<DecodedEvent>, DecodeStats) {
        self.decoder.decode_all(messages)
    }

    /// Decode and fold into entity type `E`
    pub fn project<E: Projectable>(&self, messages: &[TopicMessage]) -> ProjectionRun<E> {
        let (events, decode) = self.decoder.decode_all(messages);
        self.project_events(&events, decode)
    }

    /// Fold events decoded elsewhere, e.g. gathered from several topics
    pub fn project_events<E: Projectable>(
        &self,
        events: &[DecodedEvent],
        decode: DecodeStats,
    ) -> ProjectionRun<E> {
        let start = Instant::now();
        let projection = fold::<E>(events);
        let duration = start.elapsed();

        let stats = projection.stats();
        tracing::debug!(
            events = events.len(),
            decoded = decode.decoded,
            skipped = decode.skipped(),
            records = projection.len(),
            orphaned = stats.orphaned,
            stale_skipped = stats.stale_skipped,
            "Projection complete"
        );
        observe::record_projection(duration, events.len());

        ProjectionRun {
            projection,
            decode,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credlog_core::{Institution, LedgerEvent};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn raw(seq: u64, event: &LedgerEvent) -> TopicMessage {
        TopicMessage {
            consensus_timestamp: format!("{}.000000000", 1_000 + seq),
            sequence_number: seq,
            message: STANDARD.encode(event.to_message_bytes().unwrap()),
        }
    }

    #[test]
    fn test_project_institutions() {
        let messages = vec![
            raw(1, &LedgerEvent::InstitutionRegistration(Institution::new("A").with_did("did:a"))),
            raw(2, &LedgerEvent::InstitutionRegistration(Institution::new("B").with_did("did:b"))),
        ];

        let run = Projector::new().project::<Institution>(&messages);
        assert_eq!(run.projection.len(), 2);
        assert_eq!(run.decode.decoded, 2);
        let names: Vec<_> = run.projection.list().iter().map(|r| r.entity.name.clone()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_fold_ignores_input_order() {
        let (events, _) = Projector::new().decode(&[
            raw(1, &LedgerEvent::InstitutionRegistration(Institution::new("old").with_did("did:a"))),
            raw(2, &LedgerEvent::InstitutionRegistration(Institution::new("new").with_did("did:a"))),
        ]);
        let mut reversed = events.clone();
        reversed.reverse();

        let forward = fold::<Institution>(&events);
        let backward = fold::<Institution>(&reversed);
        assert_eq!(forward.get("did:a"), backward.get("did:a"));
        assert_eq!(backward.get("did:a").unwrap().entity.name, "new");
    }
}
