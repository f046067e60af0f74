//! Records owned by collaborators outside the settlement core.

use serde::{Deserialize, Serialize};

use racha_core::{EventId, UserId};

/// How an event is paid for. Only post-paid events have a shared-expense ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Tickets are sold up front; no settlement.
    Ticketed,
    /// Expenses are shared and settled after the event.
    PostPaid,
}

/// Event record as provided by the event-management side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub organizer_id: UserId,
    pub kind: EventKind,
    pub name: String,
}

impl EventRecord {
    pub fn is_organizer(&self, user: UserId) -> bool {
        self.organizer_id == user
    }
}

/// Public profile of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    /// Where the user receives transfers (e.g. an instant-payment key).
    pub payment_address: Option<String>,
}
