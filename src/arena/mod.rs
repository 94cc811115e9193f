// Arena-based storage for registry entities
//
// This module provides:
// - Arena<T>: a slab whose handles carry a generation stamp
// - SignalId / SlotId / OwnerId: typed handles into the registry's arenas
//
// The arenas themselves live inside `Registry` behind its lock; the ids are
// plain Copy values that can be stored and compared anywhere.

pub mod generational;
pub mod ids;

pub use generational::{Arena, RawHandle};
pub use ids::{OwnerId, SignalId, SlotId};
