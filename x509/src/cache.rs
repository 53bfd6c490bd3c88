//! Bounded memoizer for decoded objects.
//!
//! Entries are keyed by the exact encoded bytes and handed out as `Arc`
//! handles, so decoding the same bytes twice yields the same object. When
//! the cache is full the least recently used entry goes; entries older than
//! the time to live are dropped when they are next looked at.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvictionPolicy {
    /// Zero disables caching.
    pub max_entries: usize,
    pub time_to_live: Option<Duration>,
}

impl EvictionPolicy {
    pub const DEFAULT_MAX_ENTRIES: usize = 750;
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            time_to_live: None,
        }
    }
}

struct Slot<V: ?Sized> {
    value: Arc<V>,
    inserted: Instant,
    last_used: u64,
}

struct State<V: ?Sized> {
    slots: HashMap<Vec<u8>, Slot<V>>,
    clock: u64,
}

pub struct IdentityCache<V: ?Sized> {
    policy: EvictionPolicy,
    state: Mutex<State<V>>,
}

impl<V: ?Sized> IdentityCache<V> {
    pub fn new(policy: EvictionPolicy) -> Self {
        IdentityCache {
            policy,
            state: Mutex::new(State {
                slots: HashMap::new(),
                clock: 0,
            }),
        }
    }

    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    fn is_expired(&self, slot: &Slot<V>, now: Instant) -> bool {
        self.policy
            .time_to_live
            .is_some_and(|ttl| now.duration_since(slot.inserted) >= ttl)
    }

    pub fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.clock += 1;
        let clock = state.clock;
        let slot = state.slots.get_mut(key)?;
        if self.is_expired(slot, now) {
            state.slots.remove(key);
            return None;
        }
        slot.last_used = clock;
        Some(slot.value.clone())
    }

    /// Stores `value` unless a live entry for `key` exists, and returns
    /// whichever value is cached afterwards.
    pub fn insert(&self, key: &[u8], value: Arc<V>) -> Arc<V> {
        if self.policy.max_entries == 0 {
            return value;
        }
        let now = Instant::now();
        let mut state = self.state.lock();
        state.clock += 1;
        let clock = state.clock;

        if let Some(slot) = state.slots.get_mut(key) {
            if !self.is_expired(slot, now) {
                slot.last_used = clock;
                return slot.value.clone();
            }
        }
        state.slots.remove(key);

        if state.slots.len() >= self.policy.max_entries {
            state.slots.retain(|_, slot| !self.is_expired(slot, now));
        }
        while state.slots.len() >= self.policy.max_entries {
            let Some(oldest) = state
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            state.slots.remove(&oldest);
            tracing::debug!(size = state.slots.len(), "evicted least recently used entry");
        }

        state.slots.insert(
            key.to_vec(),
            Slot {
                value: value.clone(),
                inserted: now,
                last_used: clock,
            },
        );
        value
    }

    /// Cached value for `key`, or the result of `build` which is then
    /// cached. `build` runs without the lock held; when two callers race,
    /// both receive the value that was stored first.
    pub fn get_or_try_insert_with<E, F>(&self, key: &[u8], build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<Arc<V>, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = build()?;
        Ok(self.insert(key, value))
    }

    pub fn remove(&self, key: &[u8]) -> Option<Arc<V>> {
        self.state.lock().slots.remove(key).map(|slot| slot.value)
    }

    pub fn clear(&self) {
        self.state.lock().slots.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: ?Sized> Default for IdentityCache<V> {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

impl<V: ?Sized> std::fmt::Debug for IdentityCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}

static CERTIFICATE_CACHE: LazyLock<Arc<IdentityCache<dyn Certificate>>> =
    LazyLock::new(|| Arc::new(IdentityCache::default()));

/// Process-wide certificate cache used by the default decoder.
pub fn certificate_cache() -> Arc<IdentityCache<dyn Certificate>> {
    CERTIFICATE_CACHE.clone()
}
