//! Entity pooling
//!
//! Capped free-list recycling for short-lived entities (simulation
//! projectiles, renderer-side visual nodes). Buckets are keyed by a
//! caller-supplied closed enum, so a typo in a pool kind is a compile error
//! rather than a silently empty bucket. Releases beyond a kind's cap are
//! discarded instead of retained; the discard count is kept for debugging.

use std::fmt::Debug;
use std::hash::Hash;

use hashbrown::HashMap;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::trace;

use crate::game::constants::pooling;

/// Closed set of pool buckets. Implement on an enum; each kind carries its
/// own free-list cap.
pub trait PoolKey: Copy + Eq + Hash + Debug {
    /// Maximum number of recycled instances retained for this kind
    fn capacity(self) -> usize {
        pooling::DEFAULT_CAP
    }
}

/// Restores an instance to neutral state while keeping its allocations
pub trait Recyclable {
    fn recycle(&mut self);
}

/// Per-kind bucket counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Instances sitting in the free list
    pub free: usize,
    /// Instances currently handed out
    pub in_use: usize,
    /// Releases dropped because the free list was at cap
    pub discarded: u64,
}

#[derive(Debug)]
struct Bucket<T> {
    free: Vec<T>,
    in_use: usize,
    discarded: u64,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            in_use: 0,
            discarded: 0,
        }
    }
}

/// Fixed-cap entity pool keyed by a closed kind enum
#[derive(Debug, Default)]
pub struct EntityPool<K: PoolKey, T: Recyclable> {
    buckets: HashMap<K, Bucket<T>>,
}

impl<K: PoolKey, T: Recyclable> EntityPool<K, T> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Hand out a recycled instance, or build a fresh one via `factory`.
    /// Returned instances are already in neutral state.
    pub fn acquire(&mut self, key: K, factory: impl FnOnce() -> T) -> T {
        let bucket = self.buckets.entry(key).or_default();
        bucket.in_use += 1;
        bucket.free.pop().unwrap_or_else(factory)
    }

    /// Return an instance to the pool. Recycles it, then either stores it in
    /// the free list or discards it if the list is at the kind's cap.
    pub fn release(&mut self, key: K, mut instance: T) {
        instance.recycle();
        let bucket = self.buckets.entry(key).or_default();
        bucket.in_use = bucket.in_use.saturating_sub(1);
        if bucket.free.len() < key.capacity() {
            bucket.free.push(instance);
        } else {
            bucket.discarded += 1;
            trace!(kind = ?key, discarded = bucket.discarded, "pool at cap, discarding release");
        }
    }

    /// Release every entry of `live` whose id is absent from `active`.
    /// Returns the number of instances released.
    pub fn release_inactive<I>(
        &mut self,
        key: K,
        live: &mut HashMap<I, T>,
        active: &FxHashSet<I>,
    ) -> usize
    where
        I: Copy + Eq + Hash,
    {
        let inactive: Vec<I> = live
            .keys()
            .filter(|id| !active.contains(id))
            .copied()
            .collect();
        for id in &inactive {
            if let Some(instance) = live.remove(id) {
                self.release(key, instance);
            }
        }
        inactive.len()
    }

    /// Recycled instances available for the kind
    pub fn available(&self, key: K) -> usize {
        self.buckets.get(&key).map_or(0, |b| b.free.len())
    }

    pub fn stats(&self, key: K) -> PoolStats {
        self.buckets.get(&key).map_or(PoolStats::default(), |b| PoolStats {
            free: b.free.len(),
            in_use: b.in_use,
            discarded: b.discarded,
        })
    }
}
