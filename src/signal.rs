use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::arena::{SignalId, SlotId};
use crate::callback::{ArgumentType, Callback};
use crate::connection::{Cardinality, FunctionKey};
use crate::error::RegistryError;
use crate::owner::Receiver;
use crate::registry::Registry;
use crate::slot::Slot;

/// Emission endpoint delivering an `A` to every connected slot.
///
/// Several arguments travel as a tuple: `Signal<(u32, String)>`. Slots get
/// the argument by reference, in connection order, on the emitting thread.
///
/// # Usage
/// ```ignore
/// struct Document {
///     saved: Signal<PathBuf>,
/// }
///
/// let document = Document { saved: Signal::new() };
/// let id = document.saved.connect_fn(|path| println!("saved {}", path.display()));
///
/// document.saved.emit(PathBuf::from("notes.txt"));
/// document.saved.disconnect_fn(id);
/// ```
///
/// # Passing values along
/// Every slot sees the same `&A`. A slot that wants to take ownership of part
/// of the argument needs interior mutability, for example
/// `Signal<Cell<Option<Buffer>>>` with `take()`; slots after it then see the
/// emptied cell.
///
/// # Reference cycles
/// A slot closure that captures the signal it is connected to (or any entity
/// of the same registry) keeps the registry alive through that entity.
/// Capture the [`SignalId`] instead and emit through the registry.
pub struct Signal<A: 'static> {
    id: SignalId,
    registry: Arc<Registry>,
    _args: PhantomData<fn(&A)>,
}

impl<A: 'static> Signal<A> {
    /// Create a signal in the global registry.
    pub fn new() -> Self {
        Self::new_in(Registry::global())
    }

    /// Create a signal in `registry`.
    pub fn new_in(registry: &Arc<Registry>) -> Self {
        Self {
            id: registry.register_signal::<A>(),
            registry: registry.clone(),
            _args: PhantomData,
        }
    }

    /// Registry id of this signal.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// The registry this signal lives in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Call every connected slot with `args`, in connection order.
    pub fn emit(&self, args: A) {
        self.emit_ref(&args);
    }

    /// Like [`emit`](Self::emit), for an argument the caller keeps.
    pub fn emit_ref(&self, args: &A) {
        self.registry.emit(self.id, args);
    }

    /// Number of connections currently registered for this signal.
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count(self.id)
    }

    /// Connect a user-held slot.
    ///
    /// Returns `false` if nothing was added: with [`Cardinality::Single`]
    /// when the slot is already connected, or when `slot` belongs to another
    /// registry.
    pub fn connect(&self, slot: &Slot<A>, cardinality: Cardinality) -> bool {
        if !Arc::ptr_eq(&self.registry, slot.registry()) {
            return self.rejected(RegistryError::ForeignRegistry, false);
        }
        self.registry
            .connect(self.id, slot.id(), cardinality)
            .unwrap_or_else(|err| self.rejected(err, false))
    }

    /// Bind `method` of `receiver`.
    ///
    /// The registry creates and owns the wrapper; it is freed on disconnect
    /// or when the receiver's [`SlotOwner`](crate::SlotOwner) drops. With
    /// [`Cardinality::Single`], binding the same method of the same receiver
    /// again returns `false` and changes nothing.
    ///
    /// Dropping the signal does not free the wrapper: it stays registered,
    /// unreachable, until the receiver goes away. A long-lived receiver bound
    /// to many short-lived signals should call
    /// [`disconnect_method`](Self::disconnect_method) before each signal
    /// drops.
    pub fn connect_method<R: Receiver>(
        &self,
        receiver: &Arc<R>,
        method: fn(&R, &A),
        cardinality: Cardinality,
    ) -> bool {
        let owner = receiver.slot_owner();
        if !Arc::ptr_eq(&self.registry, owner.registry()) {
            return self.rejected(RegistryError::ForeignRegistry, false);
        }

        let weak: Weak<R> = Arc::downgrade(receiver);
        let callback = Callback::new(move |args: &A| match weak.upgrade() {
            Some(receiver) => method(&receiver, args),
            None => {
                cov_mark::hit!(binding_skipped_dropped_receiver);
            }
        });

        self.registry
            .bind(
                self.id,
                callback.erase(),
                ArgumentType::of::<A>(),
                Some(owner.id()),
                Some(FunctionKey::of_method(method)),
                cardinality,
            )
            .map(|slot| slot.is_some())
            .unwrap_or_else(|err| self.rejected(err, false))
    }

    /// Connect a free callable. Every call adds a new connection.
    ///
    /// The returned id is the only handle to the wrapper; pass it to
    /// [`disconnect_fn`](Self::disconnect_fn) to remove it.
    pub fn connect_fn<F>(&self, callback: F) -> Option<SlotId>
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.registry
            .bind(
                self.id,
                Callback::new(callback).erase(),
                ArgumentType::of::<A>(),
                None,
                None,
                Cardinality::Multi,
            )
            .unwrap_or_else(|err| self.rejected(err, None))
    }

    /// Remove connections of `slot`: the first one with
    /// [`Cardinality::Single`], all of them with [`Cardinality::Multi`].
    pub fn disconnect(&self, slot: &Slot<A>, cardinality: Cardinality) -> usize {
        if !Arc::ptr_eq(&self.registry, slot.registry()) {
            return 0;
        }
        self.registry.disconnect(self.id, slot.id(), cardinality)
    }

    /// Remove bindings of `method` on `receiver` and free their wrappers.
    pub fn disconnect_method<R: Receiver>(
        &self,
        receiver: &R,
        method: fn(&R, &A),
        cardinality: Cardinality,
    ) -> usize {
        let owner = receiver.slot_owner();
        if !Arc::ptr_eq(&self.registry, owner.registry()) {
            return 0;
        }
        self.registry.disconnect_binding(
            self.id,
            owner.id(),
            FunctionKey::of_method(method),
            cardinality,
        )
    }

    /// Remove a callable connected with [`connect_fn`](Self::connect_fn).
    pub fn disconnect_fn(&self, slot: SlotId) -> usize {
        self.registry.disconnect(self.id, slot, Cardinality::Multi)
    }

    fn rejected<T>(&self, err: RegistryError, fallback: T) -> T {
        warn!(signal = %self.id, %err, "connect rejected");
        fallback
    }
}

impl<A: 'static> Drop for Signal<A> {
    fn drop(&mut self) {
        self.registry.on_signal_destroyed(self.id);
    }
}

// NOTE: Signal intentionally does NOT implement Clone.
// Each signal is one registry entry; a clone would unregister it for every
// copy as soon as one of them is dropped. Share it behind an Arc instead.

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("args", &std::any::type_name::<A>())
            .finish()
    }
}
