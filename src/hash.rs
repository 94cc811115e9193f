//! Zero-sized hash builder for the registry's internal maps.
//!
//! Handles are dense, crate-generated integers, so HashDoS resistance buys
//! nothing here. `FastHashBuilder` uses foldhash with a fixed seed.

use std::collections::HashMap;
use std::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};
use indexmap::IndexSet;

/// A zero-sized BuildHasher that uses foldhash with a fixed seed.
///
/// # Properties
/// - Zero-sized (`size_of::<FastHashBuilder>()` == 0)
/// - Deterministic (same input = same hash across all instances)
#[derive(Clone, Copy, Debug, Default)]
pub struct FastHashBuilder;

impl BuildHasher for FastHashBuilder {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(0x517cc1b727220a95).build_hasher()
    }
}

/// `HashMap` keyed with [`FastHashBuilder`].
pub(crate) type FastHashMap<K, V> = HashMap<K, V, FastHashBuilder>;

/// Insertion-ordered set keyed with [`FastHashBuilder`].
pub(crate) type FastIndexSet<T> = IndexSet<T, FastHashBuilder>;
