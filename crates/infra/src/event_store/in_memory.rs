use std::collections::HashMap;
use std::sync::RwLock;

use racha_core::{EventId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only event store.
///
/// Intended for tests/dev. A single write lock covers the version check and the
/// append, so a batch lands entirely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<EventId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let ledger_id = events[0].ledger_id;
        let stream_type = events[0].stream_type.clone();

        for (idx, e) in events.iter().enumerate() {
            if e.ledger_id != ledger_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple ledger ids (index {idx})"
                )));
            }
            if e.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "batch contains multiple stream types (index {idx})"
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let stream = streams.entry(ledger_id).or_default();
        let current = Self::current_version(stream);

        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        if let Some(existing) = stream.first() {
            if existing.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "stream type is '{}', attempted append with '{}'",
                    existing.stream_type, stream_type
                )));
            }
        }

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                ledger_id: e.ledger_id,
                stream_type: e.stream_type,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            committed.push(stored);
        }
        stream.extend(committed.iter().cloned());

        Ok(committed)
    }

    fn load_stream(&self, ledger_id: EventId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(streams.get(&ledger_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn uncommitted(ledger_id: EventId, stream_type: &str) -> UncommittedEvent {
        UncommittedEvent {
            event_id: Uuid::now_v7(),
            ledger_id,
            stream_type: stream_type.to_string(),
            event_type: "settlement.ledger.closed".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn append_assigns_consecutive_sequence_numbers() {
        let store = InMemoryEventStore::new();
        let ledger = EventId::new();

        let first = store
            .append(vec![uncommitted(ledger, "settlement.ledger")], ExpectedVersion::Exact(0))
            .unwrap();
        let second = store
            .append(
                vec![
                    uncommitted(ledger, "settlement.ledger"),
                    uncommitted(ledger, "settlement.ledger"),
                ],
                ExpectedVersion::Exact(1),
            )
            .unwrap();

        assert_eq!(first[0].sequence_number, 1);
        assert_eq!(
            second.iter().map(|e| e.sequence_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(store.load_stream(ledger).unwrap().len(), 3);
    }

    #[test]
    fn stale_expected_version_appends_nothing() {
        let store = InMemoryEventStore::new();
        let ledger = EventId::new();
        store
            .append(vec![uncommitted(ledger, "settlement.ledger")], ExpectedVersion::Exact(0))
            .unwrap();

        let err = store
            .append(
                vec![
                    uncommitted(ledger, "settlement.ledger"),
                    uncommitted(ledger, "settlement.ledger"),
                ],
                ExpectedVersion::Exact(0),
            )
            .unwrap_err();

        assert!(matches!(err, EventStoreError::Concurrency(_)));
        assert_eq!(store.load_stream(ledger).unwrap().len(), 1);
    }

    #[test]
    fn mixed_batches_are_rejected_whole() {
        let store = InMemoryEventStore::new();
        let ledger = EventId::new();

        let err = store
            .append(
                vec![
                    uncommitted(ledger, "settlement.ledger"),
                    uncommitted(EventId::new(), "settlement.ledger"),
                ],
                ExpectedVersion::Any,
            )
            .unwrap_err();

        assert!(matches!(err, EventStoreError::InvalidAppend(_)));
        assert!(store.load_stream(ledger).unwrap().is_empty());
    }

    #[test]
    fn streams_are_isolated_per_ledger() {
        let store = InMemoryEventStore::new();
        let a = EventId::new();
        let b = EventId::new();
        store
            .append(vec![uncommitted(a, "settlement.ledger")], ExpectedVersion::Exact(0))
            .unwrap();

        assert!(store.load_stream(b).unwrap().is_empty());
        let appended = store
            .append(vec![uncommitted(b, "settlement.ledger")], ExpectedVersion::Exact(0))
            .unwrap();
        assert_eq!(appended[0].sequence_number, 1);
    }
}
