//! Closing state machine: `Open -> Closed`, one-directional.
//!
//! Closed ledgers reject every mutation of participants and expenses; the settlement
//! plan and payment reporting only become available once closed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use racha_core::{DomainError, DomainResult, EventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerStatus {
    #[default]
    Open,
    Closed {
        closed_by: UserId,
        closed_at: DateTime<Utc>,
    },
}

impl LedgerStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, LedgerStatus::Closed { .. })
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            LedgerStatus::Open => None,
            LedgerStatus::Closed { closed_at, .. } => Some(*closed_at),
        }
    }

    /// Guard for ledger mutations.
    pub fn ensure_open(&self) -> DomainResult<()> {
        if self.is_closed() {
            Err(DomainError::ClosedLedger)
        } else {
            Ok(())
        }
    }

    /// Guard for operations that only make sense after closing.
    pub fn ensure_closed(&self, what: &str) -> DomainResult<()> {
        if self.is_closed() {
            Ok(())
        } else {
            Err(DomainError::validation(format!("{what} unavailable before closing")))
        }
    }

    /// The only transition. Closing an already closed ledger keeps the first close.
    pub(crate) fn close(self, closed_by: UserId, closed_at: DateTime<Utc>) -> Self {
        match self {
            LedgerStatus::Open => LedgerStatus::Closed { closed_by, closed_at },
            closed @ LedgerStatus::Closed { .. } => closed,
        }
    }
}

/// Externally visible closing state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingState {
    pub id: EventId,
    pub is_closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
}
