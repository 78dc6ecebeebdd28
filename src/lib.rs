//! A headless windowing engine for huge lists of variable-size items.
//!
//! Given a collection of up to millions of items whose sizes are only known once they have been
//! rendered, this crate answers two questions on every scroll frame:
//!
//! - which contiguous index range must be materialized ([`Virtualizer::compute_window`]), and
//! - at which offset each of those items starts ([`Virtualizer::cumulative_offset`]).
//!
//! Items start at an estimated size. As the host lays items out it reports their real sizes with
//! [`Virtualizer::record_measurement`]; the offset index absorbs each correction in `O(log n)`
//! (a flat prefix array is used for small collections, a Fenwick tree for large ones).
//!
//! A bounded LRU [`Pool`] of render-slot handles lets hosts recycle whatever they render with for
//! indexes that stay in, or re-enter, the window.
//!
//! The crate is UI-agnostic and single-threaded: it does no I/O, spawns nothing, and never
//! panics on the scroll path.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod fenwick;
mod measurement;
mod offset_index;
mod options;
mod pool;
mod types;
mod virtualizer;


pub use error::Error;
pub use measurement::MeasurementStore;
pub use offset_index::OffsetIndex;
pub use options::{
    DEFAULT_BUFFER, DEFAULT_INDEX_THRESHOLD, DEFAULT_POOL_CAPACITY, VirtualizerOptions,
};
pub use pool::{Acquired, Pool, SlotHandle};
pub use types::{Align, IndexMode, PoolStats, Window, WindowItem};
pub use virtualizer::Virtualizer;
