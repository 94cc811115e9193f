//! Registry configuration
//!
//! ```ignore
//! let registry = Registry::with_config(
//!     RegistryConfig::new()
//!         .dispatch(DispatchMode::Sequenced)
//!         .signal_capacity(64)
//!         .slot_capacity(256),
//! );
//! ```

/// How emissions are sequenced against concurrent mutations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum DispatchMode {
    /// The connection list is snapshotted under the registry lock and the
    /// slots run after it is released.
    ///
    /// Slots may freely connect, disconnect, emit, or drop entities. An
    /// emission already in flight can still call a connection that another
    /// thread has just disconnected.
    #[default]
    Snapshot,
    /// Emissions hold a shared dispatch gate across snapshot and invocation;
    /// every mutation takes the gate exclusively.
    ///
    /// Once `disconnect` (or a drop) returns, no emission that started
    /// earlier is still running. A mutation waiting for the gate holds back
    /// emissions that have not started yet, so it is not starved by
    /// emitters on other threads.
    ///
    /// Slots running under this mode must not connect, disconnect, replace a
    /// slot's callback, or drop signals, slots, or owners of the same
    /// registry: that would wait on the gate the slot's own emission holds.
    /// Nested emits are fine.
    Sequenced,
}

/// Construction parameters for a [`Registry`](crate::Registry).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct RegistryConfig {
    pub(crate) dispatch: DispatchMode,
    pub(crate) signal_capacity: usize,
    pub(crate) slot_capacity: usize,
}

impl RegistryConfig {
    /// Snapshot dispatch, no preallocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch mode.
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = mode;
        self
    }

    /// Preallocate room for this many signals.
    pub fn signal_capacity(mut self, capacity: usize) -> Self {
        self.signal_capacity = capacity;
        self
    }

    /// Preallocate room for this many slots and internal wrappers.
    pub fn slot_capacity(mut self, capacity: usize) -> Self {
        self.slot_capacity = capacity;
        self
    }

    /// The configured dispatch mode.
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_snapshot_without_preallocation() {
        let config = RegistryConfig::new();
        assert_eq!(config.dispatch_mode(), DispatchMode::Snapshot);
        assert_eq!(config.signal_capacity, 0);
        assert_eq!(config.slot_capacity, 0);
    }

    #[test]
    fn setters_chain() {
        let config = RegistryConfig::new()
            .dispatch(DispatchMode::Sequenced)
            .signal_capacity(8)
            .slot_capacity(32);
        assert_eq!(config.dispatch_mode(), DispatchMode::Sequenced);
        assert_eq!(config.signal_capacity, 8);
        assert_eq!(config.slot_capacity, 32);
    }
}
