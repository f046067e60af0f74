use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use racha_core::{Money, ParticipantId, PaymentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// A debtor's self-reported transfer toward settling their debt.
///
/// Only `Paid` payments count against the remaining debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub participant_id: ParticipantId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub reported_by: UserId,
    pub reported_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Sum of confirmed payments made by `participant`.
pub fn total_paid_by(payments: &[Payment], participant: ParticipantId) -> Money {
    payments
        .iter()
        .filter(|p| p.participant_id == participant && p.is_paid())
        .map(|p| p.amount)
        .sum()
}
