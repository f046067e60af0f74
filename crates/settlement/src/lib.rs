//! Post-paid group settlement ("racha"): participants share ad-hoc expenses, the ledger
//! derives who owes whom, and once the event is closed a transfer plan settles the debts.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod balance;
pub mod closing;
pub mod event_record;
pub mod expense;
pub mod ledger;
pub mod matcher;
pub mod participant;
pub mod payment;

pub use balance::{compute_balances, ParticipantBalance};
pub use closing::{ClosingState, LedgerStatus};
pub use event_record::{EventKind, EventRecord, UserProfile};
pub use expense::{split_evenly, Expense, ExpenseDraft, ExpenseLedger, ExpenseShare};
pub use ledger::{
    AddParticipant, BalanceSheet, CloseLedger, ConfirmPayment, DeactivateParticipant,
    EditExpense, EventLedger, LedgerCommand, LedgerEvent, RecordExpense, ReportPayment,
    SetPaymentAddress,
};
pub use matcher::{plan_settlement, SettlementPlan, TransferLine};
pub use participant::{Participant, ParticipantRegistry};
pub use payment::{Payment, PaymentStatus};
