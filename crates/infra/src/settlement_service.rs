//! Application service exposing every settlement operation.
//!
//! The caller and the event are explicit parameters of every call; nothing is read from
//! ambient context. Each mutation is one dispatched command, so it commits atomically or
//! not at all. Reads rehydrate the ledger from committed events.

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use racha_core::{AggregateRoot, EventId, ExpenseId, Money, ParticipantId, PaymentId, UserId};
use racha_settlement::{
    AddParticipant, BalanceSheet, CloseLedger, ClosingState, ConfirmPayment,
    DeactivateParticipant, EditExpense, EventLedger, EventRecord, Expense, ExpenseDraft,
    LedgerCommand, Participant, Payment, RecordExpense, ReportPayment, SetPaymentAddress,
    SettlementPlan,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::directory::{EventDirectory, UserDirectory};
use crate::event_store::EventStore;

/// Stream type of every ledger stream.
pub const LEDGER_STREAM: &str = "settlement.ledger";

/// Input for adding a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: Option<String>,
    pub linked_user_id: Option<UserId>,
    pub payment_address: Option<String>,
}

#[derive(Debug)]
pub struct SettlementService<S, E, U> {
    dispatcher: CommandDispatcher<S>,
    events: E,
    users: U,
}

impl<S, E, U> SettlementService<S, E, U>
where
    S: EventStore,
    E: EventDirectory,
    U: UserDirectory,
{
    pub fn new(store: S, events: E, users: U) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
            events,
            users,
        }
    }

    /// Add a participant, or return the existing one when the linked user already joined.
    #[instrument(skip(self, input), fields(event_id = %event_id, caller = %caller))]
    pub fn add_participant(
        &self,
        caller: UserId,
        event_id: EventId,
        input: NewParticipant,
    ) -> Result<Participant, DispatchError> {
        let record = self.event_record(event_id)?;
        let linked_profile = input.linked_user_id.and_then(|user| self.users.get(user));
        let participant_id = ParticipantId::new();

        let ledger = self.run(
            record,
            LedgerCommand::AddParticipant(AddParticipant {
                actor: caller,
                participant_id,
                name: input.name,
                linked_user_id: input.linked_user_id,
                linked_profile,
                payment_address: input.payment_address,
                occurred_at: Utc::now(),
            }),
        )?;

        let participants = ledger.participants();
        participants
            .get(participant_id)
            .or_else(|| input.linked_user_id.and_then(|user| participants.by_linked_user(user)))
            .cloned()
            .ok_or_else(|| DispatchError::NotFound("participant".to_string()))
    }

    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn deactivate_participant(
        &self,
        caller: UserId,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<(), DispatchError> {
        let record = self.event_record(event_id)?;
        self.run(
            record,
            LedgerCommand::DeactivateParticipant(DeactivateParticipant {
                actor: caller,
                participant_id,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(())
    }

    #[instrument(skip(self, payment_address), fields(event_id = %event_id, caller = %caller))]
    pub fn set_payment_address(
        &self,
        caller: UserId,
        event_id: EventId,
        participant_id: ParticipantId,
        payment_address: Option<String>,
    ) -> Result<Participant, DispatchError> {
        let record = self.event_record(event_id)?;
        let ledger = self.run(
            record,
            LedgerCommand::SetPaymentAddress(SetPaymentAddress {
                actor: caller,
                participant_id,
                payment_address,
                occurred_at: Utc::now(),
            }),
        )?;

        ledger
            .participants()
            .require(participant_id)
            .cloned()
            .map_err(DispatchError::from)
    }

    /// Record an expense. A repeated idempotency key returns the expense recorded first.
    #[instrument(skip(self, draft), fields(event_id = %event_id, caller = %caller))]
    pub fn record_expense(
        &self,
        caller: UserId,
        event_id: EventId,
        draft: ExpenseDraft,
        idempotency_key: Option<String>,
    ) -> Result<Expense, DispatchError> {
        let record = self.event_record(event_id)?;
        let key = idempotency_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let expense_id = ExpenseId::new();

        let ledger = self.run(
            record,
            LedgerCommand::RecordExpense(RecordExpense {
                actor: caller,
                expense_id,
                draft,
                idempotency_key: key.clone(),
                occurred_at: Utc::now(),
            }),
        )?;

        let expenses = ledger.expenses();
        expenses
            .get(expense_id)
            .or_else(|| key.as_deref().and_then(|k| expenses.by_idempotency_key(k)))
            .cloned()
            .ok_or_else(|| DispatchError::NotFound("expense".to_string()))
    }

    #[instrument(skip(self, draft), fields(event_id = %event_id, caller = %caller))]
    pub fn edit_expense(
        &self,
        caller: UserId,
        event_id: EventId,
        expense_id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Expense, DispatchError> {
        let record = self.event_record(event_id)?;
        let ledger = self.run(
            record,
            LedgerCommand::EditExpense(EditExpense {
                actor: caller,
                expense_id,
                draft,
                occurred_at: Utc::now(),
            }),
        )?;

        ledger
            .expenses()
            .require(expense_id)
            .cloned()
            .map_err(DispatchError::from)
    }

    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn balances(&self, caller: UserId, event_id: EventId) -> Result<BalanceSheet, DispatchError> {
        let ledger = self.load(event_id)?;
        Ok(ledger.balance_sheet(caller)?)
    }

    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn settlement_plan(
        &self,
        caller: UserId,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<SettlementPlan, DispatchError> {
        let ledger = self.load(event_id)?;
        Ok(ledger.settlement_plan(caller, participant_id)?)
    }

    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn report_payment(
        &self,
        caller: UserId,
        event_id: EventId,
        participant_id: ParticipantId,
        amount: Money,
    ) -> Result<Payment, DispatchError> {
        let record = self.event_record(event_id)?;
        let payment_id = PaymentId::new();
        let ledger = self.run(
            record,
            LedgerCommand::ReportPayment(ReportPayment {
                actor: caller,
                payment_id,
                participant_id,
                amount,
                occurred_at: Utc::now(),
            }),
        )?;

        ledger
            .payment(payment_id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound("payment".to_string()))
    }

    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn confirm_payment(
        &self,
        caller: UserId,
        event_id: EventId,
        payment_id: PaymentId,
    ) -> Result<Payment, DispatchError> {
        let record = self.event_record(event_id)?;
        let ledger = self.run(
            record,
            LedgerCommand::ConfirmPayment(ConfirmPayment {
                actor: caller,
                payment_id,
                occurred_at: Utc::now(),
            }),
        )?;

        ledger
            .payment(payment_id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound("payment".to_string()))
    }

    /// Close the event. Closing an already closed event returns its current state.
    #[instrument(skip(self), fields(event_id = %event_id, caller = %caller))]
    pub fn close(&self, caller: UserId, event_id: EventId) -> Result<ClosingState, DispatchError> {
        let record = self.event_record(event_id)?;
        let ledger = self.run(
            record,
            LedgerCommand::Close(CloseLedger {
                actor: caller,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(ledger.closing_state())
    }

    fn event_record(&self, event_id: EventId) -> Result<EventRecord, DispatchError> {
        self.events
            .get(event_id)
            .ok_or_else(|| DispatchError::NotFound("event".to_string()))
    }

    fn load(&self, event_id: EventId) -> Result<EventLedger, DispatchError> {
        let record = self.event_record(event_id)?;
        self.dispatcher
            .load(event_id, move |_| EventLedger::new(record))
            .inspect_err(log_failure)
    }

    fn run(&self, record: EventRecord, command: LedgerCommand) -> Result<EventLedger, DispatchError> {
        let ledger_id = record.id;
        let outcome = self
            .dispatcher
            .dispatch(ledger_id, LEDGER_STREAM, command, move |_| EventLedger::new(record))
            .inspect_err(log_failure)?;

        if outcome.committed.is_empty() {
            debug!("command was a no-op");
        } else {
            let types: Vec<&str> = outcome.committed.iter().map(|e| e.event_type.as_str()).collect();
            info!(events = ?types, version = outcome.aggregate.version(), "ledger updated");
        }

        Ok(outcome.aggregate)
    }
}

fn log_failure(err: &DispatchError) {
    match err {
        DispatchError::Deserialize(_) | DispatchError::Store(_) => {
            error!(error = %err, "settlement operation failed")
        }
        _ => debug!(error = %err, "command rejected"),
    }
}
