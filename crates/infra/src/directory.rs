//! Lookups owned by collaborators outside the settlement core: event records and user
//! profiles.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use racha_core::{EventId, UserId};
use racha_settlement::{EventRecord, UserProfile};

use crate::event_store::EventStoreError;

/// Event records as provided by event management.
pub trait EventDirectory: Send + Sync {
    fn get(&self, event_id: EventId) -> Option<EventRecord>;
}

/// Registered user profiles.
pub trait UserDirectory: Send + Sync {
    fn get(&self, user_id: UserId) -> Option<UserProfile>;
}

impl<D> EventDirectory for Arc<D>
where
    D: EventDirectory + ?Sized,
{
    fn get(&self, event_id: EventId) -> Option<EventRecord> {
        (**self).get(event_id)
    }
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn get(&self, user_id: UserId) -> Option<UserProfile> {
        (**self).get(user_id)
    }
}

/// In-memory keyed directory for tests/dev.
#[derive(Debug)]
pub struct InMemoryDirectory<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryDirectory<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryDirectory<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryDirectory<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn upsert(&self, key: K, value: V) -> Result<(), EventStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| EventStoreError::Unavailable("directory lock poisoned".to_string()))?;
        map.insert(key, value);
        Ok(())
    }

    fn lookup(&self, key: &K) -> Option<V> {
        match self.inner.read() {
            Ok(map) => map.get(key).cloned(),
            Err(_) => {
                tracing::error!("directory lock poisoned; lookup failed");
                None
            }
        }
    }
}

pub type InMemoryEventDirectory = InMemoryDirectory<EventId, EventRecord>;
pub type InMemoryUserDirectory = InMemoryDirectory<UserId, UserProfile>;

impl InMemoryEventDirectory {
    pub fn register(&self, record: EventRecord) -> Result<(), EventStoreError> {
        self.upsert(record.id, record)
    }
}

impl InMemoryUserDirectory {
    pub fn register(&self, profile: UserProfile) -> Result<(), EventStoreError> {
        self.upsert(profile.id, profile)
    }
}

impl EventDirectory for InMemoryEventDirectory {
    fn get(&self, event_id: EventId) -> Option<EventRecord> {
        self.lookup(&event_id)
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, user_id: UserId) -> Option<UserProfile> {
        self.lookup(&user_id)
    }
}
