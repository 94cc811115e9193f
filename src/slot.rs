use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use crate::arena::SlotId;
use crate::callback::{ArgumentType, Callback};
use crate::registry::Registry;

/// Callable held by application code and connected by reference.
///
/// The registry only records the slot's id; the slot itself stays wherever
/// the application keeps it. Dropping it removes all of its connections.
///
/// # Usage
/// ```ignore
/// let on_saved = Slot::new(|path: &PathBuf| println!("saved {}", path.display()));
/// saved.connect(&on_saved, Cardinality::Single);
///
/// // Later emissions call the new body
/// on_saved.set_callback(|path: &PathBuf| tracing::info!("saved {path:?}"));
/// ```
pub struct Slot<A: 'static> {
    id: SlotId,
    registry: Arc<Registry>,
    _args: PhantomData<fn(&A)>,
}

impl<A: 'static> Slot<A> {
    /// Create a slot in the global registry.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        Self::new_in(Registry::global(), callback)
    }

    /// Create a slot in `registry`.
    pub fn new_in<F>(registry: &Arc<Registry>, callback: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = registry.register_slot(Callback::new(callback).erase(), ArgumentType::of::<A>());
        Self {
            id,
            registry: registry.clone(),
            _args: PhantomData,
        }
    }

    /// Registry id of this slot.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// The registry this slot lives in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Replace the body. Connections are kept; emissions that have not taken
    /// their snapshot yet call the new body.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let result = self.registry.replace_callback(
            self.id,
            Callback::new(callback).erase(),
            ArgumentType::of::<A>(),
        );
        if let Err(err) = result {
            warn!(slot = %self.id, %err, "callback not replaced");
        }
    }

    /// Call the slot directly, without going through any signal.
    pub fn invoke(&self, args: &A) {
        self.registry.invoke_slot(self.id, args);
    }
}

impl<A: 'static> Drop for Slot<A> {
    fn drop(&mut self) {
        self.registry.on_slot_destroyed(self.id);
    }
}

impl<A: 'static> fmt::Debug for Slot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("args", &std::any::type_name::<A>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn invoke_calls_the_current_callback() {
        let registry = Registry::new();
        let total = Arc::new(AtomicUsize::new(0));

        let total_clone = total.clone();
        let slot = Slot::new_in(&registry, move |value: &usize| {
            total_clone.fetch_add(*value, Ordering::Relaxed);
        });
        slot.invoke(&2);

        let total_clone = total.clone();
        slot.set_callback(move |value: &usize| {
            total_clone.fetch_add(*value * 10, Ordering::Relaxed);
        });
        slot.invoke(&2);

        assert_eq!(total.load(Ordering::Relaxed), 22);
    }

    #[test]
    fn slot_unregisters_on_drop() {
        let registry = Registry::new();
        let slot = Slot::new_in(&registry, |_: &()| {});
        let id = slot.id();
        assert!(registry.is_slot_registered(id));

        drop(slot);
        assert!(!registry.is_slot_registered(id));
    }
}
