use core::num::{NonZeroU32, NonZeroUsize};

use crate::Error;

/// Default number of extra items kept on each side of the viewport.
pub const DEFAULT_BUFFER: usize = 1;

/// Default maximum number of render slots kept by the pool.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Item count at which the offset index switches from a flat prefix array to a Fenwick tree.
pub const DEFAULT_INDEX_THRESHOLD: usize = 10_000;

/// Configuration for [`crate::Virtualizer`].
///
/// Fields are public so adapters can tweak a copy and hand it back via
/// `Virtualizer::set_options`; the virtualizer validates and rebuilds only what changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualizerOptions {
    pub count: usize,
    /// Size used for every item that has not been measured yet. Must be greater than 0.
    pub estimated_item_size: u32,
    /// Extra items rendered beyond the viewport on each side.
    pub buffer: usize,
    /// Maximum number of pooled render slots. Must be greater than 0.
    pub pool_capacity: usize,
    /// Collections with at least this many items use the Fenwick-backed offset index.
    pub index_threshold: usize,
}

impl VirtualizerOptions {
    /// Creates options for `count` items estimated at `estimated_item_size` each.
    pub fn new(count: usize, estimated_item_size: u32) -> Self {
        Self {
            count,
            estimated_item_size,
            buffer: DEFAULT_BUFFER,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            index_threshold: DEFAULT_INDEX_THRESHOLD,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_estimated_item_size(mut self, estimated_item_size: u32) -> Self {
        self.estimated_item_size = estimated_item_size;
        self
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    pub fn with_index_threshold(mut self, index_threshold: usize) -> Self {
        self.index_threshold = index_threshold;
        self
    }

    /// Checks the options and returns the validated non-zero values.
    pub(crate) fn validate(&self) -> Result<(NonZeroU32, NonZeroUsize), Error> {
        let estimate =
            NonZeroU32::new(self.estimated_item_size).ok_or(Error::InvalidEstimatedSize)?;
        let capacity = NonZeroUsize::new(self.pool_capacity).ok_or(Error::InvalidPoolCapacity)?;
        Ok((estimate, capacity))
    }
}
