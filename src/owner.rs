use std::fmt;
use std::sync::Arc;

use crate::arena::OwnerId;
use crate::registry::Registry;

/// Marker embedded in a receiver whose methods get bound to signals.
///
/// Dropping it removes every connection made on the receiver's behalf and
/// frees the wrappers the registry created for them. Embed it as a field and
/// expose it through [`Receiver`]; since the receiver's fields drop with the
/// receiver, nothing bound to it outlives it.
///
/// # Usage
/// ```ignore
/// struct Display {
///     owner: SlotOwner,
///     lines: Mutex<Vec<String>>,
/// }
///
/// impl Receiver for Display {
///     fn slot_owner(&self) -> &SlotOwner {
///         &self.owner
///     }
/// }
///
/// impl Display {
///     fn show(&self, line: &String) {
///         self.lines.lock().push(line.clone());
///     }
/// }
///
/// let display = Arc::new(Display { owner: SlotOwner::new(), lines: Mutex::default() });
/// text_changed.connect_method(&display, Display::show, Cardinality::Single);
/// ```
pub struct SlotOwner {
    id: OwnerId,
    registry: Arc<Registry>,
}

impl SlotOwner {
    /// Register an owner in the global registry.
    pub fn new() -> Self {
        Self::new_in(Registry::global())
    }

    /// Register an owner in `registry`.
    pub fn new_in(registry: &Arc<Registry>) -> Self {
        Self {
            id: registry.register_owner(),
            registry: registry.clone(),
        }
    }

    /// Handle identifying this owner in its registry.
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// The registry this owner lives in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl Default for SlotOwner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SlotOwner {
    fn drop(&mut self) {
        self.registry.on_owner_destroyed(self.id);
    }
}

impl fmt::Debug for SlotOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotOwner").field(&self.id).finish()
    }
}

// NOTE: SlotOwner intentionally does NOT implement Clone. A clone would
// unregister the owner as soon as either copy is dropped.

/// Receivers whose methods can be bound with
/// [`Signal::connect_method`](crate::Signal::connect_method).
///
/// Bindings hold the receiver through a `Weak`, so they never keep it alive;
/// once the last `Arc` is gone, its `SlotOwner` drops and the bindings with it.
pub trait Receiver: Send + Sync + 'static {
    /// The marker embedded in this receiver.
    fn slot_owner(&self) -> &SlotOwner;
}
