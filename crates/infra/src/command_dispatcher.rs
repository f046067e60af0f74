//! Command execution pipeline (application-level orchestration).
//!
//! The `CommandDispatcher` implements this pipeline for event-sourced aggregates:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the ledger stream from the store
//!   ↓
//! 2. Rehydrate the aggregate (apply historical events to rebuild state)
//!   ↓
//! 3. Handle the command (pure decision logic, produces events)
//!   ↓
//! 4. Append the decided events (one batch, optimistic concurrency check)
//! ```
//!
//! The decided batch is appended with `ExpectedVersion::Exact(version seen at load)`, so
//! a command either commits entirely on top of the state it was decided against or
//! fails with `DispatchError::Concurrency` and commits nothing.
//!
//! This module contains no IO itself; it composes the `EventStore` trait.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use racha_core::{Aggregate, DomainError, Event, EventId, ExpectedVersion};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Domain validation failure (deterministic).
    #[error("{0}")]
    Validation(String),
    /// The caller may not perform this operation.
    #[error("{0}")]
    Unauthorized(String),
    /// Domain-level not found.
    #[error("{0} not found")]
    NotFound(String),
    /// Mutation attempted on a closed ledger.
    #[error("the event is closed; the ledger can no longer be changed")]
    ClosedLedger,
    /// Optimistic concurrency failure (a concurrent writer committed first).
    #[error("{0}")]
    Concurrency(String),
    /// Failed to deserialize historical event payloads into the aggregate event type.
    #[error("failed to read ledger history: {0}")]
    Deserialize(String),
    /// The event store failed.
    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(format!(
                "the event was modified concurrently, retry the request ({msg})"
            )),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            DomainError::NotFound(what) => DispatchError::NotFound(what),
            DomainError::Unauthorized(msg) => DispatchError::Unauthorized(msg),
            DomainError::ClosedLedger => DispatchError::ClosedLedger,
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
        }
    }
}

/// Outcome of a dispatched command: the aggregate after the new events were applied,
/// plus what was committed (empty for idempotent no-ops).
#[derive(Debug)]
pub struct Dispatched<A> {
    pub aggregate: A,
    pub committed: Vec<StoredEvent>,
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Aggregates used with the dispatcher must be deterministic (same events, same state)
/// and side-effect free, and must count applied events in `version()`.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> CommandDispatcher<S>
where
    S: EventStore,
{
    /// Load and rehydrate an aggregate from committed events.
    pub fn load<A>(
        &self,
        ledger_id: EventId,
        make_aggregate: impl FnOnce(EventId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(ledger_id)?;
        validate_loaded_stream(ledger_id, &history)?;

        let mut aggregate = make_aggregate(ledger_id);
        apply_history(&mut aggregate, &history)?;
        Ok(aggregate)
    }

    /// Dispatch a command through the full pipeline.
    ///
    /// `make_aggregate` builds the empty aggregate that history is replayed onto.
    /// Returns the rehydrated aggregate with the new events applied, so callers can read
    /// back what they just wrote without a second load.
    pub fn dispatch<A>(
        &self,
        ledger_id: EventId,
        stream_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(EventId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: Event + Serialize + DeserializeOwned,
    {
        // 1) Load + 2) rehydrate
        let mut aggregate = self.load(ledger_id, make_aggregate)?;
        let expected = ExpectedVersion::Exact(aggregate.version());

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command)?;
        if decided.is_empty() {
            return Ok(Dispatched {
                aggregate,
                committed: vec![],
            });
        }

        // 4) Persist (append-only, optimistic)
        let stream_type = stream_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(ledger_id, stream_type.clone(), Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        for ev in &decided {
            aggregate.apply(ev);
        }

        Ok(Dispatched { aggregate, committed })
    }
}

fn validate_loaded_stream(ledger_id: EventId, stream: &[StoredEvent]) -> Result<(), DispatchError> {
    // Guard against a backend returning foreign or out-of-order events.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.ledger_id != ledger_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains a foreign ledger id at index {idx}"
            ))));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(
                "stored event has sequence_number=0".to_string(),
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
