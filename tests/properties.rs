//! Property-based tests for window computation, offsets, resizing and pooling.
//!
//! Uses proptest to verify invariants that must hold across all valid inputs.

use proptest::prelude::*;
use std::collections::HashMap;
use virtual_window::{IndexMode, Pool, Virtualizer, VirtualizerOptions, Window};

// ============================================================================
// Strategies
// ============================================================================

/// Item count, estimate, buffer and index threshold. Thresholds straddle the counts so both
/// offset-index modes get exercised.
fn config() -> impl Strategy<Value = (usize, u32, usize, usize)> {
    (0usize..600, 1u32..64, 0usize..5, prop::sample::select(vec![0usize, 50, 300, 10_000]))
}

/// Sparse `(index, size)` measurements; indexes may exceed the count on purpose.
fn measurements() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0usize..700, 1u32..200), 0..80)
}

fn build(count: usize, estimate: u32, buffer: usize, threshold: usize) -> Virtualizer {
    let opts = VirtualizerOptions::new(count, estimate)
        .with_buffer(buffer)
        .with_index_threshold(threshold);
    Virtualizer::new(opts).expect("valid options")
}

#[derive(Clone, Debug)]
enum PoolOp {
    Acquire(usize),
    Release(usize),
}

fn pool_ops() -> impl Strategy<Value = Vec<PoolOp>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..40).prop_map(PoolOp::Acquire),
            (0usize..40).prop_map(PoolOp::Release),
        ],
        0..200,
    )
}

// ============================================================================
// Window Properties
// ============================================================================

proptest! {
    /// Windows stay inside `[0, n)` and are ordered; empty collections give empty windows.
    #[test]
    fn window_is_within_bounds(
        (count, estimate, buffer, threshold) in config(),
        ms in measurements(),
        scroll in 0u64..100_000,
        viewport in 0u32..2_000,
    ) {
        let mut v = build(count, estimate, buffer, threshold);
        v.record_measurements(ms);
        let w = v.compute_window(scroll, viewport);
        if count == 0 {
            prop_assert!(w.is_empty());
        } else {
            prop_assert!(w.start_index <= w.end_index);
            prop_assert!(w.end_index < count, "end {} out of range for {}", w.end_index, count);
        }
    }

    /// The buffered window always covers the visible window.
    #[test]
    fn window_covers_visible_items(
        (count, estimate, buffer, threshold) in config(),
        ms in measurements(),
        scroll in 0u64..100_000,
        viewport in 1u32..2_000,
    ) {
        let mut v = build(count, estimate, buffer, threshold);
        v.record_measurements(ms);
        let visible = v.visible_window(scroll, viewport);
        let w = v.compute_window(scroll, viewport);
        if count > 0 {
            prop_assert!(w.start_index <= visible.start_index);
            prop_assert!(w.end_index >= visible.end_index);
            // Every visible item actually intersects the viewport.
            let top = scroll.min(v.total_size());
            let start = v.item_start(visible.start_index).unwrap();
            let end = v.item_end(visible.start_index).unwrap();
            prop_assert!(start <= top && (top < end || top == v.total_size()));
        }
    }
}

// ============================================================================
// Offset Properties
// ============================================================================

proptest! {
    /// `cumulative_offset` is non-decreasing and steps by each item's effective size.
    #[test]
    fn offsets_are_monotonic(
        (count, estimate, buffer, threshold) in config(),
        ms in measurements(),
    ) {
        let mut v = build(count, estimate, buffer, threshold);
        v.record_measurements(ms);
        prop_assert_eq!(v.cumulative_offset(0), 0);
        for i in 0..count {
            let a = v.cumulative_offset(i);
            let b = v.cumulative_offset(i + 1);
            prop_assert!(a <= b);
            prop_assert_eq!(b - a, v.item_size(i).unwrap() as u64);
        }
        prop_assert_eq!(v.cumulative_offset(count + 10), v.total_size());
    }

    /// Recording the same measurements twice changes nothing.
    #[test]
    fn measurement_is_idempotent(
        (count, estimate, buffer, threshold) in config(),
        ms in measurements(),
    ) {
        let mut once = build(count, estimate, buffer, threshold);
        once.record_measurements(ms.iter().copied());
        let mut twice = build(count, estimate, buffer, threshold);
        twice.record_measurements(ms.iter().copied());
        twice.record_measurements(ms.iter().copied());
        for i in 0..=count {
            prop_assert_eq!(once.cumulative_offset(i), twice.cumulative_offset(i));
        }
    }

    /// Offsets for surviving indexes are unchanged when a resize switches index mode.
    #[test]
    fn mode_crossing_preserves_offsets(
        count in 1usize..400,
        grow in 1usize..800,
        estimate in 1u32..64,
        ms in measurements(),
    ) {
        let threshold = count + grow / 2 + 1;
        let mut v = build(count, estimate, 0, threshold);
        v.record_measurements(ms);
        prop_assert_eq!(v.index_mode(), IndexMode::Flat);
        let before: Vec<u64> = (0..=count).map(|i| v.cumulative_offset(i)).collect();

        v.set_items_length(count + grow);
        let crossed = count + grow >= threshold;
        prop_assert_eq!(v.index_mode() == IndexMode::Fenwick, crossed);
        for (i, &off) in before.iter().enumerate() {
            prop_assert_eq!(v.cumulative_offset(i), off);
        }

        v.set_items_length(count);
        prop_assert_eq!(v.index_mode(), IndexMode::Flat);
        for (i, &off) in before.iter().enumerate() {
            prop_assert_eq!(v.cumulative_offset(i), off);
        }
    }

    /// Shrinking then growing back leaves only the estimate for the dropped range.
    #[test]
    fn shrink_then_grow_forgets_dropped_measurements(
        (count, estimate, buffer, threshold) in config(),
        ms in measurements(),
        keep in 0usize..600,
    ) {
        let keep = keep.min(count);
        let mut v = build(count, estimate, buffer, threshold);
        v.record_measurements(ms);
        v.set_items_length(keep);
        let base = v.total_size();
        v.set_items_length(count);
        for i in keep..count {
            prop_assert!(!v.is_measured(i));
            prop_assert_eq!(
                v.cumulative_offset(i + 1),
                base + (i + 1 - keep) as u64 * estimate as u64
            );
        }
    }
}

// ============================================================================
// Pool Properties
// ============================================================================

proptest! {
    /// One handle per index, stable while pooled, and consistent accounting.
    #[test]
    fn pool_invariants_hold(capacity in 1usize..16, ops in pool_ops()) {
        let mut pool = Pool::new(capacity).unwrap();
        let mut owners: HashMap<u64, usize> = HashMap::new();
        for op in ops {
            match op {
                PoolOp::Acquire(i) => {
                    let a = pool.acquire(i);
                    // A handle never moves to another index.
                    let owner = *owners.entry(a.handle.id()).or_insert(i);
                    prop_assert_eq!(owner, i);
                    prop_assert_eq!(pool.get(i), Some(a.handle));
                }
                PoolOp::Release(i) => {
                    pool.release(i);
                    prop_assert!(!pool.is_live(i));
                }
            }
            prop_assert!(pool.len() <= capacity);
            prop_assert!(pool.live_len() <= pool.len());
            let stats = pool.stats();
            prop_assert_eq!(stats.total, stats.hits + stats.misses);
        }
    }

    /// Syncing consecutive windows keeps exactly the window live.
    #[test]
    fn sync_pool_tracks_window(
        count in 1usize..500,
        scrolls in prop::collection::vec(0u64..5_000, 1..20),
    ) {
        let opts = VirtualizerOptions::new(count, 10).with_buffer(2).with_pool_capacity(64);
        let mut v = Virtualizer::new(opts).unwrap();
        for scroll in scrolls {
            let w = v.compute_window(scroll, 120);
            v.sync_pool(w, |_, _| {});
            prop_assert_eq!(v.pool().live_len(), w.len());
            for i in w.indices() {
                prop_assert!(v.pool().is_live(i));
            }
        }
        v.sync_pool(Window::EMPTY, |_, _| {});
        prop_assert_eq!(v.pool().live_len(), 0);
    }
}
