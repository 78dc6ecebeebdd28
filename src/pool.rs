use alloc::vec::Vec;
use core::num::NonZeroUsize;

use lru::LruCache;

use crate::{Error, PoolStats, Window};

/// Opaque identity of a pooled render slot.
///
/// The host maps handles to whatever it renders with (DOM nodes, widgets, GPU buffers). A handle
/// returned on a hit is the same one returned when the index was first acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotHandle(u64);

impl SlotHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Result of [`Pool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Acquired {
    pub handle: SlotHandle,
    /// `true` when the handle was already pooled for this index.
    pub hit: bool,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    handle: SlotHandle,
    live: bool,
}

/// A bounded LRU cache of render slots keyed by item index.
///
/// Released slots stay pooled and are demoted to least-recently-used, so they are evicted before
/// anything the current window still needs.
#[derive(Debug)]
pub struct Pool {
    slots: LruCache<usize, Slot>,
    next_handle: u64,
    live: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Pool {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let capacity = NonZeroUsize::new(capacity).ok_or(Error::InvalidPoolCapacity)?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            slots: LruCache::new(capacity),
            next_handle: 0,
            live: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.cap().get()
    }

    /// Number of pooled slots, live or released.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently marked live.
    pub fn live_len(&self) -> usize {
        self.live
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.contains(&index)
    }

    pub fn is_live(&self, index: usize) -> bool {
        self.slots.peek(&index).is_some_and(|slot| slot.live)
    }

    /// Returns the pooled handle for `index` without touching LRU order or statistics.
    pub fn get(&self, index: usize) -> Option<SlotHandle> {
        self.slots.peek(&index).map(|slot| slot.handle)
    }

    /// Returns the slot for `index`, allocating one on a miss.
    pub fn acquire(&mut self, index: usize) -> Acquired {
        if let Some(slot) = self.slots.get_mut(&index) {
            if !slot.live {
                slot.live = true;
                self.live += 1;
            }
            self.hits += 1;
            return Acquired {
                handle: slot.handle,
                hit: true,
            };
        }

        self.misses += 1;
        if self.slots.len() >= self.capacity() {
            self.evict_lru();
        }
        let handle = SlotHandle(self.next_handle);
        self.next_handle += 1;
        self.slots.put(index, Slot { handle, live: true });
        self.live += 1;
        Acquired { handle, hit: false }
    }

    /// Marks `index` as no longer needed by the window. Returns `false` if it was not live.
    ///
    /// The slot stays pooled for reuse until evicted.
    pub fn release(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.peek_mut(&index) else {
            return false;
        };
        if !slot.live {
            return false;
        }
        slot.live = false;
        self.live -= 1;
        self.slots.demote(&index);
        true
    }

    /// Releases every live slot outside `window`.
    pub fn release_outside(&mut self, window: Window) {
        let stale: Vec<usize> = self
            .slots
            .iter()
            .filter(|(index, slot)| slot.live && !window.contains(**index))
            .map(|(index, _)| *index)
            .collect();
        for index in stale {
            self.release(index);
        }
    }

    /// Drops every slot for an index `>= count`.
    pub fn truncate(&mut self, count: usize) {
        let dropped: Vec<usize> = self
            .slots
            .iter()
            .map(|(index, _)| *index)
            .filter(|&index| index >= count)
            .collect();
        for index in dropped {
            if let Some(slot) = self.slots.pop(&index) {
                if slot.live {
                    self.live -= 1;
                }
            }
        }
    }

    /// Changes the capacity, evicting least-recently-used slots as needed.
    pub fn set_capacity(&mut self, capacity: NonZeroUsize) {
        while self.slots.len() > capacity.get() {
            self.evict_lru();
        }
        self.slots.resize(capacity);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }

    pub fn stats(&self) -> PoolStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
        PoolStats {
            total,
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            evictions: self.evictions,
            pooled: self.slots.len(),
            live: self.live,
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn evict_lru(&mut self) {
        if let Some((index, slot)) = self.slots.pop_lru() {
            if slot.live {
                vwarn!(index, "Pool: evicting a live slot; capacity is smaller than the window");
                self.live -= 1;
            } else {
                vtrace!(index, "Pool: evicted released slot");
            }
            self.evictions += 1;
        }
    }
}
