// Generation-checked slab storage.
//
// A plain slab hands a freed index to the next insert, so a handle kept past
// its entry's removal would silently resolve to the newcomer. Every entry here
// is stamped with the arena's generation counter at insert time and every
// lookup compares stamps, so a stale handle resolves to nothing.

use slab::Slab;

/// Raw `{index, generation}` pair behind the typed ids.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct RawHandle {
    index: u32,
    generation: u32,
}

impl RawHandle {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slab index of the entry.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation stamp the entry received when it was inserted.
    pub const fn generation(self) -> u32 {
        self.generation
    }

    fn slot(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: T,
}

/// Slab whose handles carry a generation stamp.
#[derive(Debug)]
pub struct Arena<T> {
    entries: Slab<Entry<T>>,
    generation: u32,
}

impl<T> Arena<T> {
    pub const fn new() -> Self {
        Self {
            entries: Slab::new(),
            generation: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Slab::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Insert a value and return its handle.
    ///
    /// The generation counter wraps after `u32::MAX` inserts; a handle would
    /// have to survive that many registrations at the same index to alias.
    pub fn insert(&mut self, value: T) -> RawHandle {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let entry = self.entries.vacant_entry();
        let index = entry.key();
        entry.insert(Entry { generation, value });
        RawHandle::new(index as u32, generation)
    }

    pub fn contains(&self, handle: RawHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: RawHandle) -> Option<&T> {
        self.entries
            .get(handle.slot())
            .filter(|entry| entry.generation == handle.generation)
            .map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, handle: RawHandle) -> Option<&mut T> {
        self.entries
            .get_mut(handle.slot())
            .filter(|entry| entry.generation == handle.generation)
            .map(|entry| &mut entry.value)
    }

    /// Remove the entry behind `handle`, if it is still the one it names.
    pub fn remove(&mut self, handle: RawHandle) -> Option<T> {
        if self.contains(handle) {
            Some(self.entries.remove(handle.slot()).value)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RawHandle, &T)> {
        self.entries.iter().map(|(index, entry)| {
            (
                RawHandle::new(index as u32, entry.generation),
                &entry.value,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RawHandle, &mut T)> {
        self.entries.iter_mut().map(|(index, entry)| {
            (
                RawHandle::new(index as u32, entry.generation),
                &mut entry.value,
            )
        })
    }

    /// Remove every entry, yielding the values.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain().map(|entry| entry.value)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_does_not_resolve_after_index_reuse() {
        let mut arena = Arena::new();
        let first = arena.insert("first");
        assert_eq!(arena.remove(first), Some("first"));

        let second = arena.insert("second");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());

        assert_eq!(arena.get(first), None);
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.get(second), Some(&"second"));
    }

    #[test]
    fn iteration_yields_live_handles() {
        let mut arena = Arena::with_capacity(4);
        let a = arena.insert(1);
        let b = arena.insert(2);
        arena.remove(a);

        let handles: Vec<_> = arena.iter().map(|(handle, _)| handle).collect();
        assert_eq!(handles, vec![b]);

        for (_, value) in arena.iter_mut() {
            *value += 10;
        }
        assert_eq!(arena.get(b), Some(&12));
        assert_eq!(arena.drain().collect::<Vec<_>>(), vec![12]);
        assert!(arena.is_empty());
    }
}
