//! The connection registry
//!
//! All bookkeeping lives in one `RegistryState` behind one
//! `parking_lot::RwLock`:
//!
//! - `signals`: per signal, the ordered connection list (insertion order is
//!   emission order)
//! - `slots`: every callable, user-held or registry-owned, stored type-erased
//! - `owners`: marker entries of receivers, each listing the wrappers bound on
//!   its behalf
//! - `bindings`: `{signal, function}` → wrappers, used to recognize the same
//!   method binding across connect calls
//!
//! Every mutation, including each duplicate check, runs under the write lock.
//! Emission takes the read lock only long enough to clone the callbacks of the
//! connection list, then runs them with no lock held. Entries removed under
//! the lock are dropped after it is released, since a callback's captures may
//! themselves call back into the registry when dropped.

use std::any::type_name;
use std::cell::Cell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::arena::{Arena, OwnerId, SignalId, SlotId};
use crate::callback::{ArgumentType, Callback, ErasedCallback};
use crate::config::{DispatchMode, RegistryConfig};
use crate::connection::{
    BindingKey, Cardinality, Connection, FunctionKey, SlotKind, remove_matching,
};
use crate::error::RegistryError;
use crate::hash::{FastHashMap, FastIndexSet};

/// Process-wide registry, built on first use.
static GLOBAL_REGISTRY: LazyLock<Arc<Registry>> = LazyLock::new(Registry::new);

thread_local! {
    /// Sequenced emissions currently running on this thread.
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct SignalEntry {
    args: ArgumentType,
    connections: Vec<Connection>,
}

struct SlotEntry {
    callback: ErasedCallback,
    args: ArgumentType,
    kind: SlotKind,
    owner: Option<OwnerId>,
    binding: Option<BindingKey>,
    /// Connections referencing this wrapper. Only maintained for
    /// `SlotKind::InternalBinding`.
    links: usize,
}

#[derive(Default)]
struct OwnerEntry {
    wrappers: FastIndexSet<SlotId>,
}

#[derive(Default)]
struct RegistryState {
    signals: Arena<SignalEntry>,
    slots: Arena<SlotEntry>,
    owners: Arena<OwnerEntry>,
    bindings: FastHashMap<BindingKey, FastIndexSet<SlotId>>,
}

impl RegistryState {
    /// Drop one link from every internal wrapper in `removed` and free the
    /// ones left without connections. With `keep_owned`, wrappers bound to an
    /// owner stay registered until that owner goes away.
    fn unlink(&mut self, removed: &[Connection], keep_owned: bool, garbage: &mut Vec<SlotEntry>) {
        for connection in removed {
            if connection.kind != SlotKind::InternalBinding {
                continue;
            }
            let Some(entry) = self.slots.get_mut(connection.slot.raw()) else {
                continue;
            };
            entry.links = entry.links.saturating_sub(1);
            if entry.links == 0 && !(keep_owned && entry.owner.is_some()) {
                garbage.extend(self.remove_slot(connection.slot));
            }
        }
    }

    /// Unregister a slot and every index entry pointing at it.
    fn remove_slot(&mut self, slot: SlotId) -> Option<SlotEntry> {
        let entry = self.slots.remove(slot.raw())?;
        if let Some(key) = entry.binding {
            if let Some(wrappers) = self.bindings.get_mut(&key) {
                wrappers.shift_remove(&slot);
                if wrappers.is_empty() {
                    self.bindings.remove(&key);
                }
            }
        }
        if let Some(owner) = entry.owner.and_then(|owner| self.owners.get_mut(owner.raw())) {
            owner.wrappers.shift_remove(&slot);
        }
        Some(entry)
    }

    /// Remove every connection matching `predicate` from every signal.
    fn purge(&mut self, mut predicate: impl FnMut(&Connection) -> bool) -> usize {
        let mut removed = 0;
        for (_, signal) in self.signals.iter_mut() {
            let before = signal.connections.len();
            signal.connections.retain(|connection| !predicate(connection));
            removed += before - signal.connections.len();
        }
        removed
    }
}

/// Write access to the state; in [`DispatchMode::Sequenced`] also holds the
/// dispatch gate exclusively.
///
/// Fields drop in declaration order, so the state lock is released before
/// the gate.
struct StateWriteGuard<'a> {
    state: RwLockWriteGuard<'a, RegistryState>,
    _gate: Option<RwLockWriteGuard<'a, ()>>,
}

impl Deref for StateWriteGuard<'_> {
    type Target = RegistryState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl DerefMut for StateWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

/// Shared hold on the dispatch gate for one Sequenced emission.
///
/// The outermost emission on a thread queues behind mutations already
/// waiting for the gate, so steady emission from several threads cannot
/// starve them. Nested emissions run while this thread already holds the
/// gate and must not queue, or they would wait on themselves.
struct DispatchPass<'a> {
    _gate: RwLockReadGuard<'a, ()>,
}

impl<'a> DispatchPass<'a> {
    fn enter(gate: &'a RwLock<()>) -> Self {
        let depth = DISPATCH_DEPTH.with(|depth| depth.replace(depth.get() + 1));
        let gate = if depth == 0 {
            gate.read()
        } else {
            cov_mark::hit!(nested_sequenced_emit);
            gate.read_recursive()
        };
        Self { _gate: gate }
    }
}

impl Drop for DispatchPass<'_> {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Thread-safe table of signal→slot connections.
///
/// Most code goes through [`Signal`](crate::Signal), [`Slot`](crate::Slot)
/// and [`SlotOwner`](crate::SlotOwner), which register themselves here and
/// unregister from `Drop`. The id-level methods below are the same contract
/// without the typed wrappers.
///
/// Every entity keeps an `Arc` to its registry, so the registry outlives all
/// of them. Whatever is still registered when the last reference goes away
/// is swept in `Drop`.
pub struct Registry {
    state: RwLock<RegistryState>,
    dispatch_gate: RwLock<()>,
    dispatch: DispatchMode,
}

impl Registry {
    /// Create a registry with the default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Arc<Self> {
        let state = RegistryState {
            signals: Arena::with_capacity(config.signal_capacity),
            slots: Arena::with_capacity(config.slot_capacity),
            ..RegistryState::default()
        };
        Arc::new(Self {
            state: RwLock::new(state),
            dispatch_gate: RwLock::new(()),
            dispatch: config.dispatch,
        })
    }

    /// The process-wide registry used by `Signal::new`, `Slot::new` and
    /// `SlotOwner::new`.
    ///
    /// Statics are never dropped, so wrappers still registered here at exit
    /// are released with the process.
    pub fn global() -> &'static Arc<Registry> {
        &GLOBAL_REGISTRY
    }

    /// How emissions are sequenced against mutations.
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch
    }

    fn write(&self) -> StateWriteGuard<'_> {
        let gate = match self.dispatch {
            DispatchMode::Sequenced => Some(self.dispatch_gate.write()),
            DispatchMode::Snapshot => None,
        };
        StateWriteGuard {
            state: self.state.write(),
            _gate: gate,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================
    //
    // Registering does not affect any emission, so it skips the dispatch gate
    // and stays callable from slots in Sequenced mode.

    pub(crate) fn register_signal<A: 'static>(&self) -> SignalId {
        let entry = SignalEntry {
            args: ArgumentType::of::<A>(),
            connections: Vec::new(),
        };
        let signal = SignalId::from_raw(self.state.write().signals.insert(entry));
        trace!(%signal, args = type_name::<A>(), "signal registered");
        signal
    }

    pub(crate) fn register_slot(&self, callback: ErasedCallback, args: ArgumentType) -> SlotId {
        let entry = SlotEntry {
            callback,
            args,
            kind: SlotKind::ExternalObject,
            owner: None,
            binding: None,
            links: 0,
        };
        let slot = SlotId::from_raw(self.state.write().slots.insert(entry));
        trace!(%slot, args = args.name(), "slot registered");
        slot
    }

    pub(crate) fn register_owner(&self) -> OwnerId {
        let owner = OwnerId::from_raw(self.state.write().owners.insert(OwnerEntry::default()));
        trace!(%owner, "owner registered");
        owner
    }

    /// Swap the callable behind `slot`. Emissions that already took their
    /// snapshot keep calling the previous one.
    ///
    /// The previous callable is dropped here, after the lock is released. In
    /// Sequenced mode no emission can still hold it by then.
    pub(crate) fn replace_callback(
        &self,
        slot: SlotId,
        callback: ErasedCallback,
        args: ArgumentType,
    ) -> Result<(), RegistryError> {
        let _previous = {
            let mut state = self.write();
            let entry = state
                .slots
                .get_mut(slot.raw())
                .ok_or(RegistryError::StaleSlot(slot))?;
            entry.args.accepts(args)?;
            std::mem::replace(&mut entry.callback, callback)
        };
        trace!(%slot, "slot callback replaced");
        Ok(())
    }

    /// Call `slot` directly, outside of any signal.
    pub(crate) fn invoke_slot<A: 'static>(&self, slot: SlotId, args: &A) {
        let callback = self
            .state
            .read()
            .slots
            .get(slot.raw())
            .map(|entry| entry.callback.clone());
        if let Some(callback) = callback.and_then(Callback::<A>::downcast) {
            callback.call(args);
        }
    }

    // =========================================================================
    // Connect / disconnect
    // =========================================================================

    /// Connect an already registered slot to `signal`.
    ///
    /// With [`Cardinality::Single`], returns `Ok(false)` without touching
    /// anything if `slot` is already connected to `signal`. Otherwise the
    /// connection is appended to the end of the signal's list and `Ok(true)`
    /// is returned.
    pub fn connect(
        &self,
        signal: SignalId,
        slot: SlotId,
        cardinality: Cardinality,
    ) -> Result<bool, RegistryError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let signal_entry = state
            .signals
            .get_mut(signal.raw())
            .ok_or(RegistryError::StaleSignal(signal))?;
        let slot_entry = state
            .slots
            .get_mut(slot.raw())
            .ok_or(RegistryError::StaleSlot(slot))?;
        signal_entry.args.accepts(slot_entry.args)?;

        if cardinality == Cardinality::Single
            && signal_entry.connections.iter().any(|c| c.slot == slot)
        {
            cov_mark::hit!(single_connect_slot_already_connected);
            trace!(%signal, %slot, "slot already connected");
            return Ok(false);
        }

        signal_entry.connections.push(Connection {
            slot,
            owner: slot_entry.owner,
            kind: slot_entry.kind,
            cardinality,
        });
        if slot_entry.kind == SlotKind::InternalBinding {
            slot_entry.links += 1;
        }
        trace!(%signal, %slot, ?cardinality, "connected");
        Ok(true)
    }

    /// Register `callback` as a registry-owned wrapper and connect it to
    /// `signal`.
    ///
    /// With [`Cardinality::Single`] and a `function`, nothing is registered
    /// when `signal` already has a connection of the same owner to a wrapper
    /// of the same function; `Ok(None)` is returned and `callback` dropped.
    pub(crate) fn bind(
        &self,
        signal: SignalId,
        callback: ErasedCallback,
        args: ArgumentType,
        owner: Option<OwnerId>,
        function: Option<FunctionKey>,
        cardinality: Cardinality,
    ) -> Result<Option<SlotId>, RegistryError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let signal_entry = state
            .signals
            .get_mut(signal.raw())
            .ok_or(RegistryError::StaleSignal(signal))?;
        signal_entry.args.accepts(args)?;
        if let Some(owner) = owner {
            if !state.owners.contains(owner.raw()) {
                return Err(RegistryError::StaleOwner(owner));
            }
        }

        let binding = function.map(|function| BindingKey { signal, function });
        if cardinality == Cardinality::Single {
            let existing = binding.and_then(|key| state.bindings.get(&key));
            if let Some(wrappers) = existing {
                if signal_entry
                    .connections
                    .iter()
                    .any(|c| c.owner == owner && wrappers.contains(&c.slot))
                {
                    cov_mark::hit!(single_bind_already_connected);
                    trace!(%signal, "binding already connected");
                    return Ok(None);
                }
            }
        }

        let slot = SlotId::from_raw(state.slots.insert(SlotEntry {
            callback,
            args,
            kind: SlotKind::InternalBinding,
            owner,
            binding,
            links: 1,
        }));
        signal_entry.connections.push(Connection {
            slot,
            owner,
            kind: SlotKind::InternalBinding,
            cardinality,
        });
        if let Some(key) = binding {
            state.bindings.entry(key).or_default().insert(slot);
        }
        if let Some(entry) = owner.and_then(|owner| state.owners.get_mut(owner.raw())) {
            entry.wrappers.insert(slot);
        }
        trace!(%signal, %slot, ?owner, ?cardinality, "bound");
        Ok(Some(slot))
    }

    /// Remove connections of `slot` from `signal`: the first one with
    /// [`Cardinality::Single`], all of them with [`Cardinality::Multi`].
    ///
    /// A user-held slot stays registered. A registry-owned wrapper left with
    /// no connection is freed. Returns how many connections were removed.
    pub fn disconnect(&self, signal: SignalId, slot: SlotId, cardinality: Cardinality) -> usize {
        let mut garbage = Vec::new();
        let removed = {
            let mut guard = self.write();
            let state = &mut *guard;
            let Some(entry) = state.signals.get_mut(signal.raw()) else {
                return 0;
            };
            let removed = remove_matching(&mut entry.connections, cardinality, |c| c.slot == slot);
            state.unlink(&removed, false, &mut garbage);
            removed.len()
        };
        trace!(%signal, %slot, removed, freed = garbage.len(), "disconnected");
        removed
    }

    /// Remove connections from `signal` that bind `function` on behalf of
    /// `owner`, freeing their wrappers. Returns how many were removed.
    pub fn disconnect_binding(
        &self,
        signal: SignalId,
        owner: OwnerId,
        function: FunctionKey,
        cardinality: Cardinality,
    ) -> usize {
        let key = BindingKey { signal, function };
        let mut garbage = Vec::new();
        let removed = {
            let mut guard = self.write();
            let state = &mut *guard;
            let (Some(entry), Some(wrappers)) =
                (state.signals.get_mut(signal.raw()), state.bindings.get(&key))
            else {
                return 0;
            };
            let removed = remove_matching(&mut entry.connections, cardinality, |c| {
                c.owner == Some(owner) && wrappers.contains(&c.slot)
            });
            state.unlink(&removed, false, &mut garbage);
            removed.len()
        };
        trace!(%signal, %owner, removed, freed = garbage.len(), "binding disconnected");
        removed
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Call every slot connected to `signal`, in connection order.
    ///
    /// A stale signal, or an `A` that is not the signal's argument type, is
    /// ignored. A panicking slot unwinds straight out of `emit`; later slots
    /// are not called for this emission.
    pub fn emit<A: 'static>(&self, signal: SignalId, args: &A) {
        let _pass = match self.dispatch {
            DispatchMode::Sequenced => Some(DispatchPass::enter(&self.dispatch_gate)),
            DispatchMode::Snapshot => None,
        };

        let callbacks: Vec<ErasedCallback> = {
            let state = self.state.read();
            let Some(entry) = state.signals.get(signal.raw()) else {
                cov_mark::hit!(emit_on_unregistered_signal);
                return;
            };
            if !entry.args.is::<A>() {
                warn!(
                    %signal,
                    expected = entry.args.name(),
                    found = type_name::<A>(),
                    "emission with the wrong argument type ignored"
                );
                return;
            }
            entry
                .connections
                .iter()
                .filter_map(|c| state.slots.get(c.slot.raw()))
                .map(|slot| slot.callback.clone())
                .collect()
        };

        trace!(%signal, slots = callbacks.len(), "emitting");
        for callback in callbacks {
            if let Some(callback) = Callback::<A>::downcast(callback) {
                callback.call(args);
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Forget `signal` and all of its connections.
    ///
    /// Wrappers without an owner are freed with it; wrappers bound on behalf
    /// of an owner stay until that owner is destroyed. Their binding index
    /// entries go with the signal, since its id never resolves again.
    pub fn on_signal_destroyed(&self, signal: SignalId) {
        let mut garbage = Vec::new();
        let removed = {
            let mut guard = self.write();
            let state = &mut *guard;
            let Some(entry) = state.signals.remove(signal.raw()) else {
                return;
            };
            state.unlink(&entry.connections, true, &mut garbage);
            state.bindings.retain(|key, _| key.signal != signal);
            entry.connections.len()
        };
        debug!(%signal, removed, freed = garbage.len(), "signal destroyed");
    }

    /// Remove every connection of `slot` from every signal and unregister it.
    pub fn on_slot_destroyed(&self, slot: SlotId) {
        let (removed, entry) = {
            let mut guard = self.write();
            let state = &mut *guard;
            let removed = state.purge(|c| c.slot == slot);
            (removed, state.remove_slot(slot))
        };
        if entry.is_none() {
            cov_mark::hit!(destroyed_slot_not_registered);
        }
        debug!(%slot, removed, "slot destroyed");
    }

    /// Remove every connection made on behalf of `owner`, free the wrappers
    /// bound for it, and unregister it. Other owners' connections on the same
    /// signals are left alone.
    pub fn on_owner_destroyed(&self, owner: OwnerId) {
        let (removed, garbage) = {
            let mut guard = self.write();
            let state = &mut *guard;
            let Some(entry) = state.owners.remove(owner.raw()) else {
                return;
            };
            let removed = state.purge(|c| c.owner == Some(owner));
            let garbage: Vec<SlotEntry> = entry
                .wrappers
                .iter()
                .filter_map(|slot| state.remove_slot(*slot))
                .collect();
            (removed, garbage)
        };
        if !garbage.is_empty() {
            cov_mark::hit!(owner_wrappers_freed);
        }
        debug!(%owner, removed, freed = garbage.len(), "owner destroyed");
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of connections on `signal`; 0 for a stale id.
    pub fn connection_count(&self, signal: SignalId) -> usize {
        self.state
            .read()
            .signals
            .get(signal.raw())
            .map_or(0, |entry| entry.connections.len())
    }

    /// Connections of `signal` in emission order.
    pub fn connections(&self, signal: SignalId) -> Vec<Connection> {
        self.state
            .read()
            .signals
            .get(signal.raw())
            .map(|entry| entry.connections.clone())
            .unwrap_or_default()
    }

    /// Whether `signal` still names a live signal.
    pub fn is_signal_registered(&self, signal: SignalId) -> bool {
        self.state.read().signals.contains(signal.raw())
    }

    /// Whether `slot` still names a live slot or wrapper.
    pub fn is_slot_registered(&self, slot: SlotId) -> bool {
        self.state.read().slots.contains(slot.raw())
    }

    /// Whether `owner` is still registered.
    pub fn is_owner_registered(&self, owner: OwnerId) -> bool {
        self.state.read().owners.contains(owner.raw())
    }

    /// Live signals.
    pub fn signal_count(&self) -> usize {
        self.state.read().signals.len()
    }

    /// Registered callables, user-held and registry-owned.
    pub fn slot_count(&self) -> usize {
        self.state.read().slots.len()
    }

    /// Registry-owned wrappers currently alive.
    pub fn internal_wrapper_count(&self) -> usize {
        self.state
            .read()
            .slots
            .iter()
            .filter(|(_, entry)| entry.kind == SlotKind::InternalBinding)
            .count()
    }

    /// Live owners.
    pub fn owner_count(&self) -> usize {
        self.state.read().owners.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("dispatch", &self.dispatch)
            .field("signals", &state.signals.len())
            .field("slots", &state.slots.len())
            .field("owners", &state.owners.len())
            .finish()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let wrappers = state
            .slots
            .iter()
            .filter(|(_, entry)| entry.kind == SlotKind::InternalBinding)
            .count();
        if wrappers > 0 || !state.signals.is_empty() {
            debug!(
                signals = state.signals.len(),
                wrappers, "registry dropped with live entries, sweeping"
            );
        }
        state.bindings.clear();
        state.signals.drain().for_each(drop);
        state.owners.drain().for_each(drop);
        state.slots.drain().for_each(drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn recording_slot(registry: &Registry, log: &Arc<Mutex<Vec<u32>>>, tag: u32) -> SlotId {
        let log = log.clone();
        registry.register_slot(
            Callback::new(move |value: &u32| log.lock().unwrap().push(tag * 100 + value)).erase(),
            ArgumentType::of::<u32>(),
        )
    }

    #[test]
    fn id_level_connect_and_emit_follow_connection_order() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = registry.register_signal::<u32>();
        let a = recording_slot(&registry, &log, 1);
        let b = recording_slot(&registry, &log, 2);

        assert_eq!(registry.connect(signal, b, Cardinality::Multi), Ok(true));
        assert_eq!(registry.connect(signal, a, Cardinality::Multi), Ok(true));
        registry.emit(signal, &7u32);

        assert_eq!(*log.lock().unwrap(), vec![207, 107]);
    }

    #[test]
    fn single_connect_of_connected_slot_is_a_no_op() {
        cov_mark::check!(single_connect_slot_already_connected);
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = registry.register_signal::<u32>();
        let slot = recording_slot(&registry, &log, 1);

        assert_eq!(registry.connect(signal, slot, Cardinality::Single), Ok(true));
        assert_eq!(registry.connect(signal, slot, Cardinality::Single), Ok(false));
        assert_eq!(registry.connection_count(signal), 1);
    }

    #[test]
    fn connect_rejects_stale_and_mismatched_handles() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = registry.register_signal::<u32>();
        let text = registry.register_signal::<String>();
        let slot = recording_slot(&registry, &log, 1);

        assert_matches!(
            registry.connect(text, slot, Cardinality::Multi),
            Err(RegistryError::ArgumentMismatch { .. })
        );

        registry.on_signal_destroyed(signal);
        assert_eq!(
            registry.connect(signal, slot, Cardinality::Multi),
            Err(RegistryError::StaleSignal(signal))
        );

        registry.on_slot_destroyed(slot);
        assert_eq!(
            registry.connect(text, slot, Cardinality::Multi),
            Err(RegistryError::StaleSlot(slot))
        );
    }

    #[test]
    fn stale_signal_id_does_not_reach_its_successor() {
        cov_mark::check!(emit_on_unregistered_signal);
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let old = registry.register_signal::<u32>();
        registry.on_signal_destroyed(old);

        let new = registry.register_signal::<u32>();
        assert_eq!(old.index(), new.index());
        let slot = recording_slot(&registry, &log, 1);
        registry.connect(new, slot, Cardinality::Multi).unwrap();

        registry.emit(old, &1u32);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(registry.disconnect(old, slot, Cardinality::Multi), 0);
        assert_eq!(registry.connection_count(new), 1);
    }

    #[test]
    fn emit_with_wrong_argument_type_is_ignored() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = registry.register_signal::<u32>();
        let slot = recording_slot(&registry, &log, 1);
        registry.connect(signal, slot, Cardinality::Multi).unwrap();

        registry.emit(signal, &"not a u32");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn disconnect_does_not_unregister_user_slots() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = registry.register_signal::<u32>();
        let slot = recording_slot(&registry, &log, 1);
        registry.connect(signal, slot, Cardinality::Multi).unwrap();
        registry.connect(signal, slot, Cardinality::Multi).unwrap();

        assert_eq!(registry.disconnect(signal, slot, Cardinality::Multi), 2);
        assert!(registry.is_slot_registered(slot));
        assert_eq!(registry.disconnect(signal, slot, Cardinality::Multi), 0);
    }

    #[test]
    fn internal_wrapper_is_freed_with_its_last_connection() {
        let registry = Registry::new();
        let signal = registry.register_signal::<u32>();
        let other = registry.register_signal::<u32>();
        let wrapper = registry
            .bind(
                signal,
                Callback::new(|_: &u32| {}).erase(),
                ArgumentType::of::<u32>(),
                None,
                None,
                Cardinality::Multi,
            )
            .unwrap()
            .unwrap();
        registry.connect(other, wrapper, Cardinality::Multi).unwrap();

        assert_eq!(registry.disconnect(signal, wrapper, Cardinality::Multi), 1);
        assert!(registry.is_slot_registered(wrapper));
        assert_eq!(registry.disconnect(other, wrapper, Cardinality::Multi), 1);
        assert!(!registry.is_slot_registered(wrapper));
        assert_eq!(registry.internal_wrapper_count(), 0);
    }

    #[test]
    fn bind_rejects_stale_owner() {
        let registry = Registry::new();
        let signal = registry.register_signal::<u32>();
        let owner = registry.register_owner();
        registry.on_owner_destroyed(owner);

        assert_eq!(
            registry.bind(
                signal,
                Callback::new(|_: &u32| {}).erase(),
                ArgumentType::of::<u32>(),
                Some(owner),
                None,
                Cardinality::Multi,
            ),
            Err(RegistryError::StaleOwner(owner))
        );
        assert_eq!(registry.slot_count(), 0);
    }

    #[test]
    fn destroying_unknown_slot_is_a_no_op() {
        cov_mark::check!(destroyed_slot_not_registered);
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let slot = recording_slot(&registry, &log, 1);
        registry.on_slot_destroyed(slot);
        registry.on_slot_destroyed(slot);
        assert_eq!(registry.slot_count(), 0);
    }

    #[test]
    fn destroyed_signal_drops_binding_index_but_keeps_owned_wrapper() {
        fn on_value(_: &(), _: &u32) {}

        let registry = Registry::new();
        let signal = registry.register_signal::<u32>();
        let owner = registry.register_owner();
        let wrapper = registry
            .bind(
                signal,
                Callback::new(|_: &u32| {}).erase(),
                ArgumentType::of::<u32>(),
                Some(owner),
                Some(FunctionKey::of_method::<(), u32>(on_value)),
                Cardinality::Single,
            )
            .unwrap()
            .unwrap();
        assert_eq!(registry.state.read().bindings.len(), 1);

        registry.on_signal_destroyed(signal);
        assert!(registry.state.read().bindings.is_empty());
        assert!(registry.is_slot_registered(wrapper));

        registry.on_owner_destroyed(owner);
        assert!(!registry.is_slot_registered(wrapper));
        assert_eq!(registry.internal_wrapper_count(), 0);
    }

    #[test]
    fn dropping_the_registry_frees_remaining_wrappers() {
        struct Tracked(Arc<Mutex<bool>>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                *self.0.lock().unwrap() = true;
            }
        }

        let freed = Arc::new(Mutex::new(false));
        let registry = Registry::new();
        let signal = registry.register_signal::<u32>();
        let tracked = Tracked(freed.clone());
        registry
            .bind(
                signal,
                Callback::new(move |_: &u32| {
                    let _ = &tracked;
                })
                .erase(),
                ArgumentType::of::<u32>(),
                None,
                None,
                Cardinality::Multi,
            )
            .unwrap();

        assert!(!*freed.lock().unwrap());
        drop(registry);
        assert!(*freed.lock().unwrap());
    }

    #[test]
    fn debug_output_reports_counts() {
        let registry = Registry::new();
        let _signal = registry.register_signal::<()>();
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("signals: 1"), "{rendered}");
        assert!(rendered.contains("Snapshot"), "{rendered}");
    }
}
