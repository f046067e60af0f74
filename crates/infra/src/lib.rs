//! Infrastructure layer: event storage, command dispatch, external directories, and the
//! settlement application service.

pub mod command_dispatcher;
pub mod directory;
pub mod event_store;
pub mod settlement_service;


pub use command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
pub use directory::{
    EventDirectory, InMemoryDirectory, InMemoryEventDirectory, InMemoryUserDirectory, UserDirectory,
};
pub use settlement_service::{NewParticipant, SettlementService, LEDGER_STREAM};
