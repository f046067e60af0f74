//! Service wiring: event store, directories and the settlement service over them.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use racha_infra::event_store::InMemoryEventStore;
use racha_infra::{InMemoryEventDirectory, InMemoryUserDirectory, SettlementService};
use racha_settlement::{EventRecord, UserProfile};

pub type LedgerService =
    SettlementService<Arc<InMemoryEventStore>, Arc<InMemoryEventDirectory>, Arc<InMemoryUserDirectory>>;

/// Everything the handlers need, shared behind one `Arc`.
///
/// The directories are kept alongside the service so callers (the dev binary, tests)
/// can register event records and user profiles owned by other systems.
pub struct AppServices {
    pub settlement: LedgerService,
    pub events: Arc<InMemoryEventDirectory>,
    pub users: Arc<InMemoryUserDirectory>,
}

impl AppServices {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let events = Arc::new(InMemoryEventDirectory::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        Self {
            settlement: SettlementService::new(store, events.clone(), users.clone()),
            events,
            users,
        }
    }

    pub fn seed(&self, seed: DirectorySeed) -> anyhow::Result<()> {
        tracing::info!(
            events = seed.events.len(),
            users = seed.users.len(),
            "seeding directories"
        );

        for record in seed.events {
            self.events.register(record).context("registering seeded event")?;
        }
        for profile in seed.users {
            self.users.register(profile).context("registering seeded user")?;
        }
        Ok(())
    }
}

/// Event records and user profiles to preload (JSON).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub events: Vec<EventRecord>,
    pub users: Vec<UserProfile>,
}

impl DirectorySeed {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading directory seed {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing directory seed {}", path.display()))
    }
}
