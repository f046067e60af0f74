use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use racha_core::{DomainError, DomainResult, ExpenseId, Money, ParticipantId, UserId};

use crate::participant::ParticipantRegistry;

/// The portion of one expense attributed to one participant.
///
/// A share is identified by `(expense, participant)`; recipients are deduplicated
/// before splitting, so that pair is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub participant_id: ParticipantId,
    pub amount: Money,
}

/// A recorded expense together with its full share set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub total: Money,
    pub payer: ParticipantId,
    pub shares: Vec<ExpenseShare>,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn share_of(&self, participant: ParticipantId) -> Option<Money> {
        self.shares
            .iter()
            .find(|s| s.participant_id == participant)
            .map(|s| s.amount)
    }
}

/// Caller input for recording or editing an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub description: String,
    pub total: Money,
    pub payer: ParticipantId,
    /// Recipients in caller order; duplicates are dropped (first occurrence wins).
    pub participants: Vec<ParticipantId>,
}

impl ExpenseDraft {
    /// Validate against the registry and compute the cent-exact share set.
    pub fn into_shares(&self, registry: &ParticipantRegistry) -> DomainResult<Vec<ExpenseShare>> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }
        if !self.total.is_positive() {
            return Err(DomainError::validation("total amount must be greater than zero"));
        }
        if !registry.is_active(self.payer) {
            return Err(DomainError::validation(
                "payer must be an active participant of the event",
            ));
        }

        let recipients = dedup_in_order(&self.participants);
        if recipients.is_empty() {
            return Err(DomainError::validation("select at least one participant to split with"));
        }
        if let Some(unknown) = recipients.iter().find(|id| !registry.is_active(**id)) {
            return Err(DomainError::validation(format!(
                "participant {unknown} is not an active participant of the event"
            )));
        }

        let amounts = split_evenly(self.total, recipients.len());
        Ok(recipients
            .into_iter()
            .zip(amounts)
            .map(|(participant_id, amount)| ExpenseShare { participant_id, amount })
            .collect())
    }
}

/// Split `total` into `n` cent-exact parts.
///
/// Every part gets `floor(total / n)`; the first `total mod n` parts get one extra
/// cent, so the extra cents land on the earliest entries of the caller order.
pub fn split_evenly(total: Money, n: usize) -> Vec<Money> {
    if n == 0 {
        return Vec::new();
    }

    let cents = total.cents();
    let count = n as i64;
    let base = cents.div_euclid(count);
    let remainder = cents.rem_euclid(count) as usize;

    (0..n)
        .map(|i| {
            if i < remainder {
                Money::from_cents(base + 1)
            } else {
                Money::from_cents(base)
            }
        })
        .collect()
}

fn dedup_in_order(ids: &[ParticipantId]) -> Vec<ParticipantId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Expenses of one event, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseLedger {
    expenses: Vec<Expense>,
    idempotency_keys: HashMap<String, ExpenseId>,
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn require(&self, id: ExpenseId) -> DomainResult<&Expense> {
        self.get(id).ok_or_else(|| DomainError::not_found("expense"))
    }

    /// Expense previously recorded under an idempotency key.
    pub fn by_idempotency_key(&self, key: &str) -> Option<&Expense> {
        self.idempotency_keys.get(key).and_then(|id| self.get(*id))
    }

    pub(crate) fn insert(&mut self, expense: Expense, idempotency_key: Option<String>) {
        if let Some(key) = idempotency_key {
            self.idempotency_keys.insert(key, expense.id);
        }
        self.expenses.push(expense);
    }

    /// Swap the mutable fields and the whole share set in one step.
    pub(crate) fn replace(
        &mut self,
        id: ExpenseId,
        description: String,
        total: Money,
        payer: ParticipantId,
        shares: Vec<ExpenseShare>,
        at: DateTime<Utc>,
    ) {
        if let Some(e) = self.expenses.iter_mut().find(|e| e.id == id) {
            e.description = description;
            e.total = total;
            e.payer = payer;
            e.shares = shares;
            e.updated_at = Some(at);
        }
    }
}
