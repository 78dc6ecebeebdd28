use alloc::vec::Vec;
use core::num::NonZeroU32;

use crate::IndexMode;
use crate::fenwick::Fenwick;

/// Storage strategy behind [`OffsetIndex`].
///
/// Backends only know about per-item deltas (measured size minus estimate); the estimate itself
/// is applied by `OffsetIndex`, so both backends answer the same questions in the same units.
pub(crate) trait OffsetBackend {
    fn len(&self) -> usize;
    fn delta(&self, index: usize) -> i64;
    /// Replaces the delta stored for `index`. Out-of-range indexes are ignored.
    fn set_delta(&mut self, index: usize, delta: i64);
    /// Sum of the deltas of items `[0, count)`.
    fn delta_prefix(&self, count: usize) -> i64;
    fn delta_total(&self) -> i64;
    /// Returns the number of items whose effective end offset is `<= target`.
    fn lower_bound(&self, target: u64, estimate: u64) -> usize;
    fn truncate(&mut self, new_len: usize);
    fn extend_zeros(&mut self, additional: usize);
    /// Dense copy of every delta, used when rebuilding in another mode.
    fn deltas(&self) -> Vec<i64>;
}

/// Flat prefix array for small collections.
#[derive(Clone, Debug)]
struct PrefixSums {
    deltas: Vec<i64>,
    prefix: Vec<i64>, // prefix[i] = sum(deltas[..i])
}

impl PrefixSums {
    fn from_values(values: Vec<i64>) -> Self {
        let mut prefix = Vec::with_capacity(values.len() + 1);
        let mut acc = 0i64;
        prefix.push(acc);
        for &d in &values {
            acc = acc.saturating_add(d);
            prefix.push(acc);
        }
        Self {
            deltas: values,
            prefix,
        }
    }
}

impl OffsetBackend for PrefixSums {
    fn len(&self) -> usize {
        self.deltas.len()
    }

    fn delta(&self, index: usize) -> i64 {
        self.deltas.get(index).copied().unwrap_or(0)
    }

    fn set_delta(&mut self, index: usize, delta: i64) {
        let Some(slot) = self.deltas.get_mut(index) else {
            return;
        };
        let diff = delta - *slot;
        if diff == 0 {
            return;
        }
        *slot = delta;
        for p in &mut self.prefix[index + 1..] {
            *p = p.saturating_add(diff);
        }
    }

    fn delta_prefix(&self, count: usize) -> i64 {
        self.prefix[count.min(self.deltas.len())]
    }

    fn delta_total(&self) -> i64 {
        self.prefix[self.deltas.len()]
    }

    fn lower_bound(&self, target: u64, estimate: u64) -> usize {
        // offsets are strictly increasing in `count`, so binary search for the last one <= target.
        let mut lo = 0usize;
        let mut hi = self.deltas.len();
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            let offset = (mid as u64)
                .saturating_mul(estimate)
                .saturating_add_signed(self.prefix[mid]);
            if offset <= target {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    fn truncate(&mut self, new_len: usize) {
        if new_len >= self.deltas.len() {
            return;
        }
        self.deltas.truncate(new_len);
        self.prefix.truncate(new_len + 1);
    }

    fn extend_zeros(&mut self, additional: usize) {
        let last = self.delta_total();
        self.deltas.resize(self.deltas.len() + additional, 0);
        self.prefix.resize(self.prefix.len() + additional, last);
    }

    fn deltas(&self) -> Vec<i64> {
        self.deltas.clone()
    }
}

#[derive(Clone, Debug)]
enum Backend {
    Flat(PrefixSums),
    Fenwick(Fenwick),
}

impl Backend {
    fn build(mode: IndexMode, values: Vec<i64>) -> Self {
        match mode {
            IndexMode::Flat => Self::Flat(PrefixSums::from_values(values)),
            IndexMode::Fenwick => Self::Fenwick(Fenwick::from_values(&values)),
        }
    }

    fn mode(&self) -> IndexMode {
        match self {
            Self::Flat(_) => IndexMode::Flat,
            Self::Fenwick(_) => IndexMode::Fenwick,
        }
    }

    fn get(&self) -> &dyn OffsetBackend {
        match self {
            Self::Flat(b) => b,
            Self::Fenwick(b) => b,
        }
    }

    fn get_mut(&mut self) -> &mut dyn OffsetBackend {
        match self {
            Self::Flat(b) => b,
            Self::Fenwick(b) => b,
        }
    }
}

/// Cumulative offsets of a collection of estimated-then-measured items.
///
/// `cumulative_offset(i) = i * estimated_item_size + sum(delta[0..i))`, where `delta[j]` is the
/// measured size of item `j` minus the estimate (zero when unmeasured). All math is integral.
///
/// Collections smaller than `threshold` use a flat prefix array (O(1) query, O(n) update);
/// larger ones use a Fenwick tree (O(log n) for both). Crossing the threshold in either
/// direction rebuilds the structure from the surviving deltas.
#[derive(Clone, Debug)]
pub struct OffsetIndex {
    backend: Backend,
    estimate: NonZeroU32,
    threshold: usize,
}

impl OffsetIndex {
    /// Creates an index of `count` unmeasured items.
    pub fn new(count: usize, estimated_item_size: NonZeroU32, threshold: usize) -> Self {
        Self::from_deltas(count, estimated_item_size, threshold, core::iter::empty())
    }

    /// Builds an index from sparse `(index, delta)` pairs in `O(n)`.
    ///
    /// Pairs with `index >= count` are ignored. Deltas are clamped like [`Self::set_delta`].
    pub fn from_deltas(
        count: usize,
        estimated_item_size: NonZeroU32,
        threshold: usize,
        deltas: impl IntoIterator<Item = (usize, i64)>,
    ) -> Self {
        let min = min_delta(estimated_item_size);
        let mut values = alloc::vec![0i64; count];
        for (index, delta) in deltas {
            if let Some(slot) = values.get_mut(index) {
                *slot = delta.max(min);
            }
        }
        let mode = mode_for(count, threshold);
        vdebug!(count, threshold, ?mode, "OffsetIndex::from_deltas");
        Self {
            backend: Backend::build(mode, values),
            estimate: estimated_item_size,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.backend.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> IndexMode {
        self.backend.mode()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn estimated_item_size(&self) -> u32 {
        self.estimate.get()
    }

    /// Total size of all items before `index`. Clamped: `index >= len` yields the total size.
    pub fn cumulative_offset(&self, index: usize) -> u64 {
        let backend = self.backend.get();
        let index = index.min(backend.len());
        (index as u64)
            .saturating_mul(self.estimate.get() as u64)
            .saturating_add_signed(backend.delta_prefix(index))
    }

    pub fn total(&self) -> u64 {
        let backend = self.backend.get();
        (backend.len() as u64)
            .saturating_mul(self.estimate.get() as u64)
            .saturating_add_signed(backend.delta_total())
    }

    /// Stored delta for `index` (zero when unmeasured or out of range).
    pub fn delta(&self, index: usize) -> i64 {
        self.backend.get().delta(index)
    }

    /// Effective size of `index`, or `None` when out of range.
    pub fn item_size(&self, index: usize) -> Option<u32> {
        if index >= self.len() {
            return None;
        }
        let size = (self.estimate.get() as u64).saturating_add_signed(self.delta(index));
        Some(u32::try_from(size).unwrap_or(u32::MAX))
    }

    /// Replaces the delta for `index`; calling it again with the same value is a no-op.
    ///
    /// Deltas below `1 - estimate` are clamped so every item keeps a size of at least 1.
    pub fn set_delta(&mut self, index: usize, delta: i64) {
        let delta = delta.max(min_delta(self.estimate));
        self.backend.get_mut().set_delta(index, delta);
    }

    /// Returns the number of items that end at or before `offset`.
    ///
    /// For `offset < total()` this is the index of the item whose range contains `offset`.
    pub fn lower_bound(&self, offset: u64) -> usize {
        self.backend
            .get()
            .lower_bound(offset, self.estimate.get() as u64)
    }

    /// Returns the index of the item containing `offset`, clamped to the last item.
    ///
    /// The estimate gives a first guess in O(1); when measurements shifted the real position the
    /// guess is discarded in favour of `lower_bound`.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        let last = count - 1;
        let guess = usize::try_from(offset / self.estimate.get() as u64)
            .unwrap_or(usize::MAX)
            .min(last);
        if self.cumulative_offset(guess) <= offset && offset < self.cumulative_offset(guess + 1) {
            return Some(guess);
        }
        Some(self.lower_bound(offset).min(last))
    }

    /// Grows (with zero deltas) or truncates the index to `new_count` items.
    pub fn resize(&mut self, new_count: usize) {
        let len = self.len();
        if new_count == len {
            return;
        }
        let mode = mode_for(new_count, self.threshold);
        if mode != self.mode() {
            let mut values = self.backend.get().deltas();
            values.resize(new_count, 0);
            vdebug!(from = len, to = new_count, ?mode, "OffsetIndex: switching mode");
            self.backend = Backend::build(mode, values);
            return;
        }
        let backend = self.backend.get_mut();
        if new_count < len {
            backend.truncate(new_count);
        } else {
            backend.extend_zeros(new_count - len);
        }
    }

    /// Changes the mode threshold, rebuilding if the current mode no longer fits.
    pub fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold;
        let mode = mode_for(self.len(), threshold);
        if mode != self.mode() {
            vdebug!(threshold, ?mode, "OffsetIndex: threshold change rebuild");
            let values = self.backend.get().deltas();
            self.backend = Backend::build(mode, values);
        }
    }
}

/// Smallest delta that still leaves an item one unit tall.
fn min_delta(estimate: NonZeroU32) -> i64 {
    1 - i64::from(estimate.get())
}

fn mode_for(count: usize, threshold: usize) -> IndexMode {
    if count >= threshold {
        IndexMode::Fenwick
    } else {
        IndexMode::Flat
    }
}
