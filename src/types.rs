use core::ops::Range;

/// Where an item should land in the viewport when scrolling to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

/// The contiguous index range that must currently be materialized.
///
/// Both bounds are inclusive. An empty window has `start_index > end_index`
/// (see [`Window::EMPTY`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub start_index: usize,
    pub end_index: usize, // inclusive
}

impl Window {
    pub const EMPTY: Self = Self {
        start_index: 1,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index > self.end_index
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        !self.is_empty() && index >= self.start_index && index <= self.end_index
    }

    /// Returns the window as a half-open range, suitable for iteration.
    pub fn indices(&self) -> Range<usize> {
        if self.is_empty() {
            0..0
        } else {
            self.start_index..self.end_index + 1
        }
    }
}

/// A window item with its absolute position in the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowItem {
    pub index: usize,
    /// Cumulative size of all items before `index`.
    pub start: u64,
    /// Effective size: the measured size if one was recorded, otherwise the estimate.
    pub size: u32,
    pub measured: bool,
}

impl WindowItem {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }
}

/// Which backing structure an [`crate::OffsetIndex`] currently uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexMode {
    /// Flat prefix-sum array, O(1) queries, O(n) point updates.
    Flat,
    /// Fenwick tree, O(log n) queries and point updates.
    Fenwick,
}

/// Pool hit/miss accounting. Purely informational.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Number of `acquire` calls (`hits + misses`).
    pub total: u64,
    pub hits: u64,
    pub misses: u64,
    /// `hits / total`, or `0.0` before the first acquire.
    pub hit_rate: f64,
    pub evictions: u64,
    /// Slots currently held by the pool (live or released).
    pub pooled: usize,
    /// Slots currently required by a window.
    pub live: usize,
}
