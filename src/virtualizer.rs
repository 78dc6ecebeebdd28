use alloc::vec::Vec;
use core::num::{NonZeroU32, NonZeroUsize};

use crate::{
    Acquired, Align, Error, IndexMode, MeasurementStore, OffsetIndex, Pool, PoolStats,
    VirtualizerOptions, Window, WindowItem,
};

/// A headless windowing engine.
///
/// The virtualizer holds no UI objects and no scroll state of its own. The host asks it which
/// window to render for a given `(scroll_offset, viewport_size)`, positions items with
/// [`Self::cumulative_offset`], and reports real sizes back with [`Self::record_measurement`].
///
/// Everything on that path is total: out-of-range inputs are clamped or ignored, never rejected.
/// Only configuration (`new`, `set_options`, ...) can fail.
#[derive(Debug)]
pub struct Virtualizer {
    options: VirtualizerOptions,
    estimate: NonZeroU32,
    measurements: MeasurementStore,
    offsets: OffsetIndex,
    pool: Pool,
}

impl Virtualizer {
    /// Creates a virtualizer with every item at its estimated size.
    pub fn new(options: VirtualizerOptions) -> Result<Self, Error> {
        let (estimate, capacity) = options.validate()?;
        vdebug!(
            count = options.count,
            estimated_item_size = options.estimated_item_size,
            buffer = options.buffer,
            "Virtualizer::new"
        );
        Ok(Self {
            offsets: OffsetIndex::new(options.count, estimate, options.index_threshold),
            measurements: MeasurementStore::new(),
            pool: Pool::with_capacity(capacity),
            estimate,
            options,
        })
    }

    pub fn options(&self) -> &VirtualizerOptions {
        &self.options
    }

    /// Applies new options, rebuilding only what changed.
    ///
    /// On error nothing is modified.
    pub fn set_options(&mut self, options: VirtualizerOptions) -> Result<(), Error> {
        let (estimate, capacity) = options.validate()?;
        let prev = core::mem::replace(&mut self.options, options);
        vtrace!(
            count = options.count,
            estimated_item_size = options.estimated_item_size,
            buffer = options.buffer,
            "Virtualizer::set_options"
        );

        if options.count < prev.count {
            self.measurements.truncate(options.count);
            self.pool.truncate(options.count);
        }
        if estimate != self.estimate {
            self.estimate = estimate;
            self.rebuild_offsets();
        } else {
            if options.index_threshold != prev.index_threshold {
                self.offsets.set_threshold(options.index_threshold);
            }
            self.offsets.resize(options.count);
        }
        if options.pool_capacity != prev.pool_capacity {
            self.pool.set_capacity(capacity);
        }
        Ok(())
    }

    /// Copies the current options, applies `f`, then delegates to [`Self::set_options`].
    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualizerOptions)) -> Result<(), Error> {
        let mut next = self.options;
        f(&mut next);
        self.set_options(next)
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    pub fn is_empty(&self) -> bool {
        self.options.count == 0
    }

    pub fn estimated_item_size(&self) -> u32 {
        self.estimate.get()
    }

    pub fn buffer(&self) -> usize {
        self.options.buffer
    }

    pub fn index_mode(&self) -> IndexMode {
        self.offsets.mode()
    }

    pub fn measurements(&self) -> &MeasurementStore {
        &self.measurements
    }

    pub fn offset_index(&self) -> &OffsetIndex {
        &self.offsets
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Resizes the logical collection.
    ///
    /// Measurements and pooled slots for indexes that remain in range are kept; everything at or
    /// past `new_count` is discarded and will not come back if the collection grows again.
    pub fn set_items_length(&mut self, new_count: usize) {
        let prev = self.options.count;
        if new_count == prev {
            return;
        }
        vdebug!(from = prev, to = new_count, "set_items_length");
        if new_count < prev {
            self.measurements.truncate(new_count);
            self.pool.truncate(new_count);
        }
        self.offsets.resize(new_count);
        self.options.count = new_count;
    }

    /// Changes the estimate used for unmeasured items and rebuilds the offset index.
    pub fn set_estimated_item_size(&mut self, estimated_item_size: u32) -> Result<(), Error> {
        let estimate = NonZeroU32::new(estimated_item_size).ok_or(Error::InvalidEstimatedSize)?;
        self.options.estimated_item_size = estimated_item_size;
        if estimate == self.estimate {
            return Ok(());
        }
        self.estimate = estimate;
        self.rebuild_offsets();
        Ok(())
    }

    pub fn set_buffer(&mut self, buffer: usize) {
        self.options.buffer = buffer;
    }

    pub fn set_pool_capacity(&mut self, pool_capacity: usize) -> Result<(), Error> {
        let capacity = NonZeroUsize::new(pool_capacity).ok_or(Error::InvalidPoolCapacity)?;
        self.options.pool_capacity = pool_capacity;
        self.pool.set_capacity(capacity);
        Ok(())
    }

    pub fn set_index_threshold(&mut self, index_threshold: usize) {
        self.options.index_threshold = index_threshold;
        self.offsets.set_threshold(index_threshold);
    }

    /// Records the real size of `index` as reported by the host.
    ///
    /// Re-measuring replaces the previous value. Out-of-range indexes and zero sizes are ignored.
    pub fn record_measurement(&mut self, index: usize, size: u32) {
        let count = self.options.count;
        if index >= count {
            vwarn!(index, count, "record_measurement: index out of range, ignored");
            return;
        }
        if size == 0 {
            vwarn!(index, "record_measurement: zero size, ignored");
            return;
        }
        vtrace!(index, size, "record_measurement");
        let delta = self.delta_for(size);
        self.measurements.insert(index, size);
        self.offsets.set_delta(index, delta);
    }

    pub fn record_measurements(&mut self, measurements: impl IntoIterator<Item = (usize, u32)>) {
        for (index, size) in measurements {
            self.record_measurement(index, size);
        }
    }

    /// Forgets the measurement for `index`, returning it to the estimate.
    pub fn clear_measurement(&mut self, index: usize) -> Option<u32> {
        let removed = self.measurements.remove(index)?;
        self.offsets.set_delta(index, 0);
        Some(removed)
    }

    pub fn reset_measurements(&mut self) {
        self.measurements.clear();
        self.rebuild_offsets();
    }

    pub fn measured_size(&self, index: usize) -> Option<u32> {
        self.measurements.get(index)
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.measurements.contains(index)
    }

    /// Total size of all items before `index`; `index >= count` yields [`Self::total_size`].
    pub fn cumulative_offset(&self, index: usize) -> u64 {
        self.offsets.cumulative_offset(index)
    }

    pub fn total_size(&self) -> u64 {
        self.offsets.total()
    }

    pub fn item_start(&self, index: usize) -> Option<u64> {
        (index < self.options.count).then(|| self.offsets.cumulative_offset(index))
    }

    /// Effective size of `index`: measured if recorded, otherwise the estimate.
    pub fn item_size(&self, index: usize) -> Option<u32> {
        (index < self.options.count)
            .then(|| self.measurements.get(index).unwrap_or(self.estimate.get()))
    }

    pub fn item_end(&self, index: usize) -> Option<u64> {
        let start = self.item_start(index)?;
        let size = self.item_size(index)? as u64;
        Some(start.saturating_add(size))
    }

    /// Index of the item containing `offset`, clamped to the last item.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        self.offsets.index_at_offset(offset)
    }

    /// Items intersecting the viewport, without the buffer.
    pub fn visible_window(&self, scroll_offset: u64, viewport_size: u32) -> Window {
        if self.options.count == 0 {
            return Window::EMPTY;
        }
        let start_offset = scroll_offset.min(self.offsets.total());
        let Some(start) = self.offsets.index_at_offset(start_offset) else {
            return Window::EMPTY;
        };
        let end = if viewport_size == 0 {
            start
        } else {
            let last_offset = start_offset.saturating_add(viewport_size as u64 - 1);
            self.offsets
                .index_at_offset(last_offset)
                .map_or(start, |end| end.max(start))
        };
        Window {
            start_index: start,
            end_index: end,
        }
    }

    /// The window to materialize: visible items plus `buffer` items on each side.
    ///
    /// Returns [`Window::EMPTY`] for an empty collection; otherwise both bounds are valid indexes.
    pub fn compute_window(&self, scroll_offset: u64, viewport_size: u32) -> Window {
        let visible = self.visible_window(scroll_offset, viewport_size);
        if visible.is_empty() {
            return visible;
        }
        let buffer = self.options.buffer;
        let last = self.options.count - 1;
        let window = Window {
            start_index: visible.start_index.saturating_sub(buffer),
            end_index: visible.end_index.saturating_add(buffer).min(last),
        };
        vtrace!(
            scroll_offset,
            viewport_size,
            start = window.start_index,
            end = window.end_index,
            "compute_window"
        );
        window
    }

    /// Emits every item of `window` with its absolute offset.
    ///
    /// Offsets are accumulated from a single prefix query, so this is O(log n + window length).
    pub fn for_each_window_item(&self, window: Window, mut f: impl FnMut(WindowItem)) {
        let count = self.options.count;
        if window.is_empty() || count == 0 {
            return;
        }
        let end = window.end_index.min(count - 1);
        let mut start = self.offsets.cumulative_offset(window.start_index);
        for index in window.start_index..=end {
            let measured = self.measurements.get(index);
            let size = measured.unwrap_or(self.estimate.get());
            f(WindowItem {
                index,
                start,
                size,
                measured: measured.is_some(),
            });
            start = start.saturating_add(size as u64);
        }
    }

    /// Collects the items of `window` into `out` (clears `out` first).
    pub fn collect_window_items(&self, window: Window, out: &mut Vec<WindowItem>) {
        out.clear();
        self.for_each_window_item(window, |item| out.push(item));
    }

    pub fn max_scroll_offset(&self, viewport_size: u32) -> u64 {
        self.offsets.total().saturating_sub(viewport_size as u64)
    }

    /// Scroll offset that brings `index` into view with the given alignment.
    ///
    /// `scroll_offset` is the current offset, only consulted by [`Align::Auto`].
    pub fn scroll_to_index_offset(
        &self,
        index: usize,
        align: Align,
        scroll_offset: u64,
        viewport_size: u32,
    ) -> u64 {
        let count = self.options.count;
        if count == 0 {
            return 0;
        }
        let index = index.min(count - 1);
        let start = self.offsets.cumulative_offset(index);
        let end = self.offsets.cumulative_offset(index + 1);
        let view = viewport_size as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add((end - start) / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                if start >= scroll_offset && end <= scroll_offset.saturating_add(view) {
                    scroll_offset
                } else if start < scroll_offset {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };

        target.min(self.max_scroll_offset(viewport_size))
    }

    /// Acquires a pooled render slot for `index`. Returns `None` for out-of-range indexes.
    pub fn acquire(&mut self, index: usize) -> Option<Acquired> {
        (index < self.options.count).then(|| self.pool.acquire(index))
    }

    pub fn release(&mut self, index: usize) -> bool {
        self.pool.release(index)
    }

    /// Brings the pool in line with `window`.
    ///
    /// Live slots outside the window are released, then every index in the window is acquired
    /// and reported to `f` together with whether it was a pool hit.
    pub fn sync_pool(&mut self, window: Window, mut f: impl FnMut(usize, Acquired)) {
        self.pool.release_outside(window);
        let count = self.options.count;
        if window.is_empty() || count == 0 {
            return;
        }
        if window.len() > self.pool.capacity() {
            vwarn!(
                window = window.len(),
                capacity = self.pool.capacity(),
                "sync_pool: window larger than pool capacity"
            );
        }
        let end = window.end_index.min(count - 1);
        for index in window.start_index..=end {
            let acquired = self.pool.acquire(index);
            f(index, acquired);
        }
    }

    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn reset_pool_stats(&mut self) {
        self.pool.reset_stats();
    }

    fn delta_for(&self, size: u32) -> i64 {
        i64::from(size) - i64::from(self.estimate.get())
    }

    fn rebuild_offsets(&mut self) {
        vdebug!(
            count = self.options.count,
            measured = self.measurements.len(),
            "rebuild_offsets"
        );
        let estimate = i64::from(self.estimate.get());
        self.offsets = OffsetIndex::from_deltas(
            self.options.count,
            self.estimate,
            self.options.index_threshold,
            self.measurements
                .iter()
                .map(|(index, size)| (index, i64::from(size) - estimate)),
        );
    }
}
