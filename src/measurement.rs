#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
type SizeMap = HashMap<usize, u32>;
#[cfg(not(feature = "std"))]
type SizeMap = BTreeMap<usize, u32>;

/// Sparse map from item index to its last observed size.
///
/// Only indices that were actually rendered and measured take memory; everything else falls back
/// to the estimate.
#[derive(Clone, Debug, Default)]
pub struct MeasurementStore {
    sizes: SizeMap,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `size` for `index` and returns the previous measurement, if any.
    pub fn insert(&mut self, index: usize, size: u32) -> Option<u32> {
        self.sizes.insert(index, size)
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.sizes.get(&index).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.sizes.contains_key(&index)
    }

    pub fn remove(&mut self, index: usize) -> Option<u32> {
        self.sizes.remove(&index)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn clear(&mut self) {
        self.sizes.clear();
    }

    /// Drops every measurement for an index `>= count`.
    pub fn truncate(&mut self, count: usize) {
        self.sizes.retain(|&index, _| index < count);
    }

    /// Iterates `(index, size)` pairs. Order is unspecified with `std`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.sizes.iter().map(|(&index, &size)| (index, size))
    }
}
