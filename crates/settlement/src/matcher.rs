//! Greedy transfer plan for one debtor.
//!
//! Creditors are taken in descending balance order (ties keep participant creation
//! order) and each receives `min(remaining debt, creditor balance)` until the debt is
//! covered. Each debtor is planned independently against the full creditor balances,
//! so plans for different debtors are not coordinated and the result is not the
//! minimum number of transfers across the whole group.

use racha_core::{DomainError, DomainResult, Money, ParticipantId};

use crate::balance::ParticipantBalance;
use crate::participant::Participant;
use crate::payment::{total_paid_by, Payment};

/// One instruction: pay `amount` to `to_participant`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLine {
    pub to_participant: ParticipantId,
    pub to_name: String,
    pub amount: Money,
    /// `None` means the creditor has not registered where to receive transfers.
    pub recipient_payment_address: Option<String>,
}

impl TransferLine {
    pub fn missing_payment_address(&self) -> bool {
        self.recipient_payment_address.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub participant_id: ParticipantId,
    /// `max(0, -balance)`.
    pub total_due: Money,
    /// Sum of confirmed payments.
    pub already_paid: Money,
    /// `max(0, total_due - already_paid)`.
    pub remaining_to_pay: Money,
    /// Part of `remaining_to_pay` no creditor could absorb.
    pub unallocated: Money,
    pub transfers: Vec<TransferLine>,
}

/// Build the settlement plan for `debtor` from current balances and payments.
///
/// `balances` must be in participant creation order (as produced by
/// [`crate::compute_balances`]); `participants` resolves payment addresses.
pub fn plan_settlement(
    balances: &[ParticipantBalance],
    participants: &[Participant],
    payments: &[Payment],
    debtor: ParticipantId,
) -> DomainResult<SettlementPlan> {
    let own = balances
        .iter()
        .find(|b| b.participant_id == debtor)
        .ok_or_else(|| DomainError::not_found("active participant"))?;

    let total_due = (-own.balance).max_zero();
    let already_paid = total_paid_by(payments, debtor);
    let remaining_to_pay = (total_due - already_paid).max_zero();

    let mut creditors: Vec<&ParticipantBalance> = balances
        .iter()
        .filter(|b| b.balance.is_positive() && b.participant_id != debtor)
        .collect();
    // Stable sort keeps creation order among equal balances.
    creditors.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut outstanding = remaining_to_pay;
    let mut transfers = Vec::new();
    for creditor in creditors {
        if !outstanding.is_positive() {
            break;
        }

        let amount = outstanding.min(creditor.balance);
        outstanding -= amount;

        let address = participants
            .iter()
            .find(|p| p.id == creditor.participant_id)
            .and_then(|p| p.payment_address.clone());

        transfers.push(TransferLine {
            to_participant: creditor.participant_id,
            to_name: creditor.name.clone(),
            amount,
            recipient_payment_address: address,
        });
    }

    Ok(SettlementPlan {
        participant_id: debtor,
        total_due,
        already_paid,
        remaining_to_pay,
        unallocated: outstanding,
        transfers,
    })
}
