use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use racha_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, Event, EventId, ExpenseId, Money,
    ParticipantId, PaymentId, UserId,
};

use crate::balance::{compute_balances, ParticipantBalance};
use crate::closing::{ClosingState, LedgerStatus};
use crate::event_record::{EventKind, EventRecord, UserProfile};
use crate::expense::{Expense, ExpenseDraft, ExpenseLedger, ExpenseShare};
use crate::matcher::{plan_settlement, SettlementPlan};
use crate::participant::{normalize_address, resolve_name, Participant, ParticipantRegistry};
use crate::payment::{Payment, PaymentStatus};

/// Aggregate root: the shared-expense ledger of one post-paid event.
///
/// The event record (organizer, kind) comes from outside and is supplied when the
/// aggregate is constructed; everything else is rebuilt from the ledger's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLedger {
    record: EventRecord,
    status: LedgerStatus,
    participants: ParticipantRegistry,
    expenses: ExpenseLedger,
    payments: Vec<Payment>,
    version: u64,
}

/// Participants plus balances of the active ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSheet {
    pub participants: Vec<Participant>,
    pub balances: Vec<ParticipantBalance>,
}

impl EventLedger {
    /// Empty aggregate for rehydration.
    pub fn new(record: EventRecord) -> Self {
        Self {
            record,
            status: LedgerStatus::Open,
            participants: ParticipantRegistry::new(),
            expenses: ExpenseLedger::new(),
            payments: Vec::new(),
            version: 0,
        }
    }

    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    pub fn status(&self) -> LedgerStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    pub fn closing_state(&self) -> ClosingState {
        ClosingState {
            id: self.record.id,
            is_closed: self.status.is_closed(),
            closed_at: self.status.closed_at(),
        }
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn expenses(&self) -> &ExpenseLedger {
        &self.expenses
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// Balances of every active participant, recomputed from the ledger.
    pub fn balance_sheet(&self, actor: UserId) -> DomainResult<BalanceSheet> {
        self.ensure_post_paid()?;
        self.ensure_can_read(actor)?;

        Ok(BalanceSheet {
            participants: self.participants.all().to_vec(),
            balances: compute_balances(self.participants.all(), self.expenses.all()),
        })
    }

    /// Transfer plan for one participant; only available once closed.
    pub fn settlement_plan(&self, actor: UserId, participant: ParticipantId) -> DomainResult<SettlementPlan> {
        self.ensure_post_paid()?;
        self.ensure_can_read(actor)?;
        self.status.ensure_closed("settlement")?;
        self.participants.require(participant)?;

        let balances = compute_balances(self.participants.all(), self.expenses.all());
        plan_settlement(&balances, self.participants.all(), &self.payments, participant)
    }
}

impl AggregateRoot for EventLedger {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.record.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: AddParticipant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddParticipant {
    pub actor: UserId,
    pub participant_id: ParticipantId,
    pub name: Option<String>,
    pub linked_user_id: Option<UserId>,
    /// Profile of `linked_user_id`, `None` when the user directory has no such user.
    pub linked_profile: Option<UserProfile>,
    pub payment_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateParticipant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateParticipant {
    pub actor: UserId,
    pub participant_id: ParticipantId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetPaymentAddress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPaymentAddress {
    pub actor: UserId,
    pub participant_id: ParticipantId,
    pub payment_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordExpense {
    pub actor: UserId,
    pub expense_id: ExpenseId,
    pub draft: ExpenseDraft,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditExpense {
    pub actor: UserId,
    pub expense_id: ExpenseId,
    pub draft: ExpenseDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReportPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayment {
    pub actor: UserId,
    pub payment_id: PaymentId,
    pub participant_id: ParticipantId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPayment {
    pub actor: UserId,
    pub payment_id: PaymentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseLedger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseLedger {
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    AddParticipant(AddParticipant),
    DeactivateParticipant(DeactivateParticipant),
    SetPaymentAddress(SetPaymentAddress),
    RecordExpense(RecordExpense),
    EditExpense(EditExpense),
    ReportPayment(ReportPayment),
    ConfirmPayment(ConfirmPayment),
    Close(CloseLedger),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAdded {
    pub participant_id: ParticipantId,
    pub name: String,
    pub linked_user: Option<UserId>,
    pub payment_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDeactivated {
    pub participant_id: ParticipantId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAddressChanged {
    pub participant_id: ParticipantId,
    pub payment_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Carries the full share set so an expense and its shares are one fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecorded {
    pub expense_id: ExpenseId,
    pub description: String,
    pub total: Money,
    pub payer: ParticipantId,
    pub shares: Vec<ExpenseShare>,
    pub recorded_by: UserId,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Replaces the previous share set wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEdited {
    pub expense_id: ExpenseId,
    pub description: String,
    pub total: Money,
    pub payer: ParticipantId,
    pub shares: Vec<ExpenseShare>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReported {
    pub payment_id: PaymentId,
    pub participant_id: ParticipantId,
    pub amount: Money,
    pub reported_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmed {
    pub payment_id: PaymentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerClosed {
    pub closed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    ParticipantAdded(ParticipantAdded),
    ParticipantDeactivated(ParticipantDeactivated),
    PaymentAddressChanged(PaymentAddressChanged),
    ExpenseRecorded(ExpenseRecorded),
    ExpenseEdited(ExpenseEdited),
    PaymentReported(PaymentReported),
    PaymentConfirmed(PaymentConfirmed),
    LedgerClosed(LedgerClosed),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::ParticipantAdded(_) => "settlement.participant.added",
            LedgerEvent::ParticipantDeactivated(_) => "settlement.participant.deactivated",
            LedgerEvent::PaymentAddressChanged(_) => "settlement.participant.payment_address_changed",
            LedgerEvent::ExpenseRecorded(_) => "settlement.expense.recorded",
            LedgerEvent::ExpenseEdited(_) => "settlement.expense.edited",
            LedgerEvent::PaymentReported(_) => "settlement.payment.reported",
            LedgerEvent::PaymentConfirmed(_) => "settlement.payment.confirmed",
            LedgerEvent::LedgerClosed(_) => "settlement.ledger.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::ParticipantAdded(e) => e.occurred_at,
            LedgerEvent::ParticipantDeactivated(e) => e.occurred_at,
            LedgerEvent::PaymentAddressChanged(e) => e.occurred_at,
            LedgerEvent::ExpenseRecorded(e) => e.occurred_at,
            LedgerEvent::ExpenseEdited(e) => e.occurred_at,
            LedgerEvent::PaymentReported(e) => e.occurred_at,
            LedgerEvent::PaymentConfirmed(e) => e.occurred_at,
            LedgerEvent::LedgerClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for EventLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::ParticipantAdded(e) => {
                self.participants.insert(Participant {
                    id: e.participant_id,
                    name: e.name.clone(),
                    linked_user: e.linked_user,
                    payment_address: e.payment_address.clone(),
                    is_active: true,
                    joined_at: e.occurred_at,
                });
            }
            LedgerEvent::ParticipantDeactivated(e) => {
                self.participants.deactivate(e.participant_id);
            }
            LedgerEvent::PaymentAddressChanged(e) => {
                self.participants
                    .set_payment_address(e.participant_id, e.payment_address.clone());
            }
            LedgerEvent::ExpenseRecorded(e) => {
                self.expenses.insert(
                    Expense {
                        id: e.expense_id,
                        description: e.description.clone(),
                        total: e.total,
                        payer: e.payer,
                        shares: e.shares.clone(),
                        recorded_by: e.recorded_by,
                        created_at: e.occurred_at,
                        updated_at: None,
                    },
                    e.idempotency_key.clone(),
                );
            }
            LedgerEvent::ExpenseEdited(e) => {
                self.expenses.replace(
                    e.expense_id,
                    e.description.clone(),
                    e.total,
                    e.payer,
                    e.shares.clone(),
                    e.occurred_at,
                );
            }
            LedgerEvent::PaymentReported(e) => {
                self.payments.push(Payment {
                    id: e.payment_id,
                    participant_id: e.participant_id,
                    amount: e.amount,
                    status: PaymentStatus::Pending,
                    reported_by: e.reported_by,
                    reported_at: e.occurred_at,
                    confirmed_at: None,
                });
            }
            LedgerEvent::PaymentConfirmed(e) => {
                if let Some(p) = self.payments.iter_mut().find(|p| p.id == e.payment_id) {
                    p.status = PaymentStatus::Paid;
                    p.confirmed_at = Some(e.occurred_at);
                }
            }
            LedgerEvent::LedgerClosed(e) => {
                self.status = self.status.close(e.closed_by, e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_post_paid()?;

        match command {
            LedgerCommand::AddParticipant(cmd) => self.handle_add_participant(cmd),
            LedgerCommand::DeactivateParticipant(cmd) => self.handle_deactivate(cmd),
            LedgerCommand::SetPaymentAddress(cmd) => self.handle_set_payment_address(cmd),
            LedgerCommand::RecordExpense(cmd) => self.handle_record_expense(cmd),
            LedgerCommand::EditExpense(cmd) => self.handle_edit_expense(cmd),
            LedgerCommand::ReportPayment(cmd) => self.handle_report_payment(cmd),
            LedgerCommand::ConfirmPayment(cmd) => self.handle_confirm_payment(cmd),
            LedgerCommand::Close(cmd) => self.handle_close(cmd),
        }
    }
}

impl EventLedger {
    fn ensure_post_paid(&self) -> DomainResult<()> {
        if self.record.kind != EventKind::PostPaid {
            return Err(DomainError::validation("event is not a post-paid event"));
        }
        Ok(())
    }

    fn ensure_organizer(&self, actor: UserId, action: &str) -> DomainResult<()> {
        if !self.record.is_organizer(actor) {
            return Err(DomainError::unauthorized(format!(
                "only the organizer can {action}"
            )));
        }
        Ok(())
    }

    fn ensure_can_read(&self, actor: UserId) -> DomainResult<()> {
        if self.record.is_organizer(actor) || self.participants.has_member(actor) {
            return Ok(());
        }
        Err(DomainError::unauthorized("you are not part of this event"))
    }

    /// Organizer, or the user linked to `participant`.
    fn ensure_self_or_organizer(&self, actor: UserId, participant: &Participant) -> DomainResult<()> {
        if self.record.is_organizer(actor) || participant.linked_user == Some(actor) {
            return Ok(());
        }
        Err(DomainError::unauthorized(
            "only the organizer or the participant can do this",
        ))
    }

    fn handle_add_participant(&self, cmd: &AddParticipant) -> DomainResult<Vec<LedgerEvent>> {
        self.status.ensure_open()?;

        if !self.record.is_organizer(cmd.actor) && cmd.linked_user_id != Some(cmd.actor) {
            return Err(DomainError::unauthorized(
                "only the organizer or the linked user can add this participant",
            ));
        }

        if let Some(user) = cmd.linked_user_id {
            if self.participants.by_linked_user(user).is_some() {
                // Already registered: idempotent, nothing to record.
                return Ok(vec![]);
            }
        }

        let name = resolve_name(
            cmd.name.as_deref(),
            cmd.linked_user_id,
            cmd.linked_profile.as_ref(),
        )?;

        let payment_address = normalize_address(cmd.payment_address.as_deref()).or_else(|| {
            cmd.linked_profile
                .as_ref()
                .and_then(|p| normalize_address(p.payment_address.as_deref()))
        });

        if self.participants.get(cmd.participant_id).is_some() {
            return Err(DomainError::conflict("participant id already in use"));
        }

        Ok(vec![LedgerEvent::ParticipantAdded(ParticipantAdded {
            participant_id: cmd.participant_id,
            name,
            linked_user: cmd.linked_user_id,
            payment_address,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateParticipant) -> DomainResult<Vec<LedgerEvent>> {
        self.status.ensure_open()?;
        self.ensure_organizer(cmd.actor, "remove participants")?;

        let participant = self.participants.require(cmd.participant_id)?;
        if !participant.is_active {
            return Ok(vec![]);
        }

        Ok(vec![LedgerEvent::ParticipantDeactivated(ParticipantDeactivated {
            participant_id: cmd.participant_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_payment_address(&self, cmd: &SetPaymentAddress) -> DomainResult<Vec<LedgerEvent>> {
        let participant = self.participants.require(cmd.participant_id)?;
        self.ensure_self_or_organizer(cmd.actor, participant)?;

        let address = normalize_address(cmd.payment_address.as_deref());
        if participant.payment_address == address {
            return Ok(vec![]);
        }

        Ok(vec![LedgerEvent::PaymentAddressChanged(PaymentAddressChanged {
            participant_id: cmd.participant_id,
            payment_address: address,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_expense(&self, cmd: &RecordExpense) -> DomainResult<Vec<LedgerEvent>> {
        self.status.ensure_open()?;

        if !self.record.is_organizer(cmd.actor) && !self.participants.has_active_member(cmd.actor) {
            return Err(DomainError::unauthorized(
                "only the organizer or active participants can record expenses",
            ));
        }

        let key = cmd
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = key {
            if self.expenses.by_idempotency_key(key).is_some() {
                return Ok(vec![]);
            }
        }

        if self.expenses.get(cmd.expense_id).is_some() {
            return Err(DomainError::conflict("expense id already in use"));
        }

        let shares = cmd.draft.into_shares(&self.participants)?;

        Ok(vec![LedgerEvent::ExpenseRecorded(ExpenseRecorded {
            expense_id: cmd.expense_id,
            description: cmd.draft.description.trim().to_string(),
            total: cmd.draft.total,
            payer: cmd.draft.payer,
            shares,
            recorded_by: cmd.actor,
            idempotency_key: key.map(str::to_string),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit_expense(&self, cmd: &EditExpense) -> DomainResult<Vec<LedgerEvent>> {
        self.status.ensure_open()?;
        self.ensure_organizer(cmd.actor, "edit expenses")?;
        self.expenses.require(cmd.expense_id)?;

        let shares = cmd.draft.into_shares(&self.participants)?;

        Ok(vec![LedgerEvent::ExpenseEdited(ExpenseEdited {
            expense_id: cmd.expense_id,
            description: cmd.draft.description.trim().to_string(),
            total: cmd.draft.total,
            payer: cmd.draft.payer,
            shares,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_report_payment(&self, cmd: &ReportPayment) -> DomainResult<Vec<LedgerEvent>> {
        self.status.ensure_closed("payment reporting")?;

        let participant = self.participants.require(cmd.participant_id)?;
        self.ensure_self_or_organizer(cmd.actor, participant)?;

        if !participant.is_active {
            return Err(DomainError::validation("participant is no longer active"));
        }
        if !cmd.amount.is_positive() {
            return Err(DomainError::validation("payment amount must be greater than zero"));
        }
        if self.payment(cmd.payment_id).is_some() {
            return Err(DomainError::conflict("payment id already in use"));
        }

        Ok(vec![LedgerEvent::PaymentReported(PaymentReported {
            payment_id: cmd.payment_id,
            participant_id: cmd.participant_id,
            amount: cmd.amount,
            reported_by: cmd.actor,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm_payment(&self, cmd: &ConfirmPayment) -> DomainResult<Vec<LedgerEvent>> {
        self.ensure_organizer(cmd.actor, "confirm payments")?;

        let payment = self
            .payment(cmd.payment_id)
            .ok_or_else(|| DomainError::not_found("payment"))?;
        if payment.is_paid() {
            return Ok(vec![]);
        }

        Ok(vec![LedgerEvent::PaymentConfirmed(PaymentConfirmed {
            payment_id: cmd.payment_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_close(&self, cmd: &CloseLedger) -> DomainResult<Vec<LedgerEvent>> {
        self.ensure_organizer(cmd.actor, "close the event")?;

        if self.status.is_closed() {
            return Ok(vec![]);
        }

        Ok(vec![LedgerEvent::LedgerClosed(LedgerClosed {
            closed_by: cmd.actor,
            occurred_at: cmd.occurred_at,
        })])
    }
}
