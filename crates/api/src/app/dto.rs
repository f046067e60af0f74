use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use racha_core::{ExpenseId, Money, ParticipantId, PaymentId, UserId};
use racha_settlement::{
    BalanceSheet, Expense, ExpenseDraft, ExpenseShare, Participant, ParticipantBalance, Payment,
    PaymentStatus, SettlementPlan, TransferLine,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub name: Option<String>,
    pub linked_user_id: Option<UserId>,
    pub payment_address: Option<String>,
}

/// Body of both expense creation and expense edits.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub description: String,
    pub total_amount: Money,
    pub payer_id: ParticipantId,
    pub participant_ids: Vec<ParticipantId>,
}

impl From<ExpenseRequest> for ExpenseDraft {
    fn from(body: ExpenseRequest) -> Self {
        ExpenseDraft {
            description: body.description,
            total: body.total_amount,
            payer: body.payer_id,
            participants: body.participant_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAddressRequest {
    pub payment_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPaymentRequest {
    pub participant_id: ParticipantId,
    pub amount: Money,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub id: ParticipantId,
    pub name: String,
    pub linked_user_id: Option<UserId>,
    pub payment_address: Option<String>,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<&Participant> for ParticipantResponse {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            linked_user_id: p.linked_user,
            payment_address: p.payment_address.clone(),
            is_active: p.is_active,
            joined_at: p.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub participant_id: ParticipantId,
    pub amount: Money,
}

impl From<&ExpenseShare> for ShareResponse {
    fn from(s: &ExpenseShare) -> Self {
        Self {
            participant_id: s.participant_id,
            amount: s.amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: ExpenseId,
    pub description: String,
    pub total_amount: Money,
    pub payer_id: ParticipantId,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub shares: Vec<ShareResponse>,
}

impl From<&Expense> for ExpenseResponse {
    fn from(e: &Expense) -> Self {
        Self {
            id: e.id,
            description: e.description.clone(),
            total_amount: e.total,
            payer_id: e.payer,
            recorded_by: e.recorded_by,
            created_at: e.created_at,
            updated_at: e.updated_at,
            shares: e.shares.iter().map(ShareResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_paid: Money,
    pub total_share: Money,
    pub balance: Money,
}

impl From<&ParticipantBalance> for BalanceResponse {
    fn from(b: &ParticipantBalance) -> Self {
        Self {
            participant_id: b.participant_id,
            name: b.name.clone(),
            total_paid: b.total_paid,
            total_share: b.total_share,
            balance: b.balance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceSheetResponse {
    pub participants: Vec<ParticipantResponse>,
    pub balances: Vec<BalanceResponse>,
}

impl From<&BalanceSheet> for BalanceSheetResponse {
    fn from(sheet: &BalanceSheet) -> Self {
        Self {
            participants: sheet.participants.iter().map(ParticipantResponse::from).collect(),
            balances: sheet.balances.iter().map(BalanceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub to_participant_id: ParticipantId,
    pub to_name: String,
    pub amount: Money,
    pub recipient_payment_address: Option<String>,
    pub missing_payment_address: bool,
}

impl From<&TransferLine> for TransferResponse {
    fn from(t: &TransferLine) -> Self {
        Self {
            to_participant_id: t.to_participant,
            to_name: t.to_name.clone(),
            amount: t.amount,
            recipient_payment_address: t.recipient_payment_address.clone(),
            missing_payment_address: t.missing_payment_address(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPlanResponse {
    pub participant_id: ParticipantId,
    pub total_due: Money,
    pub already_paid: Money,
    pub remaining_to_pay: Money,
    pub unallocated: Money,
    pub transfers: Vec<TransferResponse>,
}

impl From<&SettlementPlan> for SettlementPlanResponse {
    fn from(plan: &SettlementPlan) -> Self {
        Self {
            participant_id: plan.participant_id,
            total_due: plan.total_due,
            already_paid: plan.already_paid,
            remaining_to_pay: plan.remaining_to_pay,
            unallocated: plan.unallocated,
            transfers: plan.transfers.iter().map(TransferResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub participant_id: ParticipantId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub reported_by: UserId,
    pub reported_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<&Payment> for PaymentResponse {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id,
            participant_id: p.participant_id,
            amount: p.amount,
            status: p.status,
            reported_by: p.reported_by,
            reported_at: p.reported_at,
            confirmed_at: p.confirmed_at,
        }
    }
}
