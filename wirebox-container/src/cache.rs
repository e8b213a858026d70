//! Lifetime caches.
//!
//! An [`InstanceCache`] maps a [`RegistrationId`] to the instance that
//! registration produced. The same type backs both tiers: the singleton
//! cache shared by a scope family, and the private cache of each scope.
//!
//! Each entry is a write-once slot. The map lock is only held long
//! enough to fetch or create the slot; the provider then runs with no
//! lock held, so concurrent callers for the same entry wait for one
//! construction and all receive its result.
//!
//! Every slot under construction is recorded with the thread building
//! it, and every blocked caller with the slot it waits for. A caller
//! that would wait on its own build, directly or through other blocked
//! threads, fails with [`WireboxError::CircularDependency`] instead.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};
use wirebox_support::rendering::render_chain;

use crate::error::{CircularDependencyError, Result, WireboxError};
use crate::provider::Instance;
use crate::registry::RegistrationId;
use crate::token::Token;

type Slot = Arc<OnceCell<Instance>>;

/// Address of a slot, stable while anyone holds the `Arc`.
type SlotKey = usize;

#[derive(Default)]
struct Builds {
    /// Slot under construction -> building thread and its token.
    owners: HashMap<SlotKey, (ThreadId, Token)>,
    /// Blocked thread -> slot it waits for.
    waiting: HashMap<ThreadId, SlotKey>,
}

impl Builds {
    /// Follows the wait-for chain from `slot`. Returns the tokens along it
    /// if the chain ends at a slot `me` is building.
    fn wait_cycle(&self, me: ThreadId, slot: SlotKey) -> Option<Vec<Token>> {
        let mut chain = Vec::new();
        let mut current = slot;

        for _ in 0..=self.waiting.len() {
            let (owner, token) = self.owners.get(&current)?;
            chain.push(token.clone());
            if *owner == me {
                return Some(chain);
            }
            current = *self.waiting.get(owner)?;
        }

        None
    }
}

struct BuildTable {
    builds: Mutex<Builds>,
    finished: Condvar,
}

static BUILDS: Lazy<BuildTable> = Lazy::new(|| BuildTable {
    builds: Mutex::new(Builds::default()),
    finished: Condvar::new(),
});

/// Marks a slot as owned by the current thread until dropped.
struct BuildGuard {
    slot: SlotKey,
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDS.builds.lock().owners.remove(&self.slot);
        BUILDS.finished.notify_all();
    }
}

#[derive(Default)]
pub(crate) struct InstanceCache {
    slots: DashMap<RegistrationId, Slot>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `id`.
    pub fn get(&self, id: RegistrationId) -> Option<Instance> {
        self.slots.get(&id).and_then(|slot| slot.value().get().cloned())
    }

    /// Returns the cached instance for `id`, building it with `build` if absent.
    ///
    /// `token` names the entry in cycle errors. A failed build leaves the
    /// slot empty, so the next call retries.
    ///
    /// # Errors
    /// The error of `build`, or [`WireboxError::CircularDependency`] when
    /// waiting for the slot could never end.
    pub fn get_or_try_insert<F>(&self, id: RegistrationId, token: &Token, build: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        if let Some(hit) = self.get(id) {
            trace!(id = %id, "Cache hit");
            return Ok(hit);
        }

        // The map guard must be gone before `build` runs: providers
        // resolve their own dependencies through this same cache.
        let slot: Slot = self.slots.entry(id).or_default().value().clone();
        let key = Arc::as_ptr(&slot) as SlotKey;
        let me = thread::current().id();

        let guard = {
            let mut builds = BUILDS.builds.lock();
            loop {
                if let Some(instance) = slot.get() {
                    return Ok(Arc::clone(instance));
                }

                if !builds.owners.contains_key(&key) {
                    builds.owners.insert(key, (me, token.clone()));
                    break BuildGuard { slot: key };
                }

                if let Some(mut chain) = builds.wait_cycle(me, key) {
                    if let Some(last) = chain.last().cloned() {
                        chain.insert(0, last);
                    }
                    warn!(chain = %render_chain(&chain), "Circular dependency detected while waiting for a build");
                    return Err(WireboxError::CircularDependency(CircularDependencyError { chain }));
                }

                builds.waiting.insert(me, key);
                BUILDS.finished.wait(&mut builds);
                builds.waiting.remove(&me);
            }
        };

        let built = build()?;
        let instance = Arc::clone(slot.get_or_init(|| built));
        drop(guard);
        Ok(instance)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache")
            .field("instances", &self.len())
            .finish()
    }
}
