//! The attribute cache: memoized values keyed by [`AttributeIdentity`].
//!
//! One cache belongs to one owner object, so the full key of an entry is
//! `(owner, identity)`.
//!
//! Concurrency model:
//! - slots live in a sharded `DashMap`; each slot has its own mutex
//! - a slot's mutex is held while its value is computed, so concurrent `get`s
//!   of the same key run the computation once
//! - the map guard is never held while a slot mutex is locked, so different
//!   keys never wait on each other
//! - stored values are never overwritten

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::cache::{Attribute, AttributeIdentity, Computed, Durability};
use crate::error::{FitError, Result};

type Slot = Arc<Mutex<Option<Entry>>>;

#[derive(Clone)]
struct Entry {
    durability: Durability,
    value: Arc<dyn Any + Send + Sync>,
}

/// Per-owner memoization of derived attributes.
#[derive(Default)]
pub struct AttributeCache {
    slots: DashMap<AttributeIdentity, Slot>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Return the cached value of `attribute`, computing and storing it first if
    /// needed.
    ///
    /// A computation answering [`Computed::Absent`] stores nothing and fails with
    /// [`FitError::MissingValue`]. Computation errors propagate and leave the slot
    /// empty, so a later call retries.
    pub fn get<O, A>(&self, owner: &O, attribute: &A) -> Result<Arc<A::Value>>
    where
        O: ?Sized,
        A: Attribute<O>,
    {
        let identity = attribute.identity();
        let slot = self.slot(identity);
        let result = {
            let mut guard = lock(&slot);
            if let Some(entry) = guard.as_ref() {
                tracing::trace!(%identity, "attribute cache hit");
                return downcast(identity, entry);
            }

            tracing::trace!(%identity, "attribute cache miss, computing");
            match attribute.compute(owner) {
                Ok(Computed::Present(value)) => {
                    let value = Arc::new(value);
                    let durability = attribute.durability();
                    if durability != Durability::Never {
                        *guard = Some(Entry {
                            durability,
                            value: value.clone(),
                        });
                    }
                    Ok(value)
                }
                Ok(Computed::Absent) => Err(FitError::MissingValue(identity.to_string())),
                Err(err) => Err(err),
            }
        };
        drop(slot);
        self.discard_if_empty(identity);
        result
    }

    /// Look up a stored value without ever computing.
    pub fn peek<V>(&self, identity: AttributeIdentity) -> Result<Option<Arc<V>>>
    where
        V: Send + Sync + 'static,
    {
        let Some(slot) = self.existing_slot(identity) else {
            return Ok(None);
        };
        let guard = lock(&slot);
        guard.as_ref().map(|entry| downcast(identity, entry)).transpose()
    }

    /// Store `value` unless the slot already holds one, and return whatever the
    /// slot holds afterwards.
    ///
    /// Callers detect a lost race by comparing the returned `Arc` against the one
    /// they passed in (`Arc::ptr_eq`).
    pub fn publish_if_absent<V>(&self, identity: AttributeIdentity, durability: Durability, value: Arc<V>) -> Result<Arc<V>>
    where
        V: Send + Sync + 'static,
    {
        let slot = self.slot(identity);
        let result = {
            let mut guard = lock(&slot);
            match guard.as_ref() {
                Some(entry) => downcast(identity, entry),
                None => {
                    if durability != Durability::Never {
                        *guard = Some(Entry {
                            durability,
                            value: value.clone(),
                        });
                    }
                    Ok(value)
                }
            }
        };
        drop(slot);
        self.discard_if_empty(identity);
        result
    }

    /// True if a value is stored under `identity`.
    pub fn contains(&self, identity: AttributeIdentity) -> bool {
        let Some(slot) = self.existing_slot(identity) else {
            return false;
        };
        lock(&slot).is_some()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.snapshot_slots()
            .into_iter()
            .filter(|(_, slot)| lock(slot).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every `Temporary` entry; returns how many were dropped.
    pub fn evict_temporary(&self) -> usize {
        let mut evicted = Vec::new();
        for (identity, slot) in self.snapshot_slots() {
            let mut guard = lock(&slot);
            if guard.as_ref().is_some_and(|e| e.durability == Durability::Temporary) {
                *guard = None;
                evicted.push(identity);
            }
        }
        for identity in &evicted {
            self.discard_if_empty(*identity);
        }
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "evicted temporary attribute values");
        }
        evicted.len()
    }

    /// All `Permanent` entries holding a `V`, ordered by identity.
    pub fn permanent_entries<V>(&self) -> Vec<(AttributeIdentity, Arc<V>)>
    where
        V: Send + Sync + 'static,
    {
        let mut out: Vec<(AttributeIdentity, Arc<V>)> = self
            .snapshot_slots()
            .into_iter()
            .filter_map(|(identity, slot)| {
                let guard = lock(&slot);
                let entry = guard.as_ref()?;
                if entry.durability != Durability::Permanent {
                    return None;
                }
                entry.value.clone().downcast::<V>().ok().map(|v| (identity, v))
            })
            .collect();
        out.sort_by_key(|(identity, _)| *identity);
        out
    }

    fn slot(&self, identity: AttributeIdentity) -> Slot {
        self.slots.entry(identity).or_default().value().clone()
    }

    fn existing_slot(&self, identity: AttributeIdentity) -> Option<Slot> {
        self.slots.get(&identity).map(|slot| slot.value().clone())
    }

    fn snapshot_slots(&self) -> Vec<(AttributeIdentity, Slot)> {
        self.slots
            .iter()
            .map(|kv| (*kv.key(), kv.value().clone()))
            .collect()
    }

    /// Remove an empty slot nobody else is using.
    ///
    /// Runs under the shard write lock, so it only `try_lock`s the slot: a slot
    /// that is busy or still referenced elsewhere is simply kept.
    fn discard_if_empty(&self, identity: AttributeIdentity) {
        self.slots.remove_if(&identity, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().map(|g| g.is_none()).unwrap_or(false)
        });
    }
}

impl fmt::Debug for AttributeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeCache")
            .field("slots", &self.slots.len())
            .finish()
    }
}

fn lock(slot: &Mutex<Option<Entry>>) -> MutexGuard<'_, Option<Entry>> {
    // A panic inside a computation leaves the slot untouched; keep using it.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn downcast<V>(identity: AttributeIdentity, entry: &Entry) -> Result<Arc<V>>
where
    V: Send + Sync + 'static,
{
    entry.value.clone().downcast::<V>().map_err(|_| {
        FitError::InternalConsistency(format!(
            "value cached under {identity} is not a {}",
            std::any::type_name::<V>()
        ))
    })
}
