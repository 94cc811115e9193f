use crate::arena::{OwnerId, SignalId, SlotId};

/// Rejections reported by the id-level [`Registry`](crate::Registry) API.
///
/// The binding methods on [`Signal`](crate::Signal) never surface these; they
/// log them and report that nothing was connected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The signal was dropped, or the id comes from another registry.
    #[error("{0} is not registered")]
    StaleSignal(SignalId),

    /// The slot or wrapper was dropped or freed.
    #[error("{0} is not registered")]
    StaleSlot(SlotId),

    /// The owner was dropped.
    #[error("{0} is not registered")]
    StaleOwner(OwnerId),

    /// The slot's argument type is not the signal's.
    #[error("slot takes `{found}` but the signal emits `{expected}`")]
    ArgumentMismatch {
        /// Argument type of the signal.
        expected: &'static str,
        /// Argument type of the slot.
        found: &'static str,
    },

    /// The two ends of a connection were registered in different registries.
    #[error("entities belong to different registries")]
    ForeignRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::RawHandle;

    #[test]
    fn messages_name_the_offending_entity() {
        let err = RegistryError::StaleSignal(SignalId::from_raw(RawHandle::new(2, 5)));
        assert_eq!(err.to_string(), "signal#2v5 is not registered");

        let err = RegistryError::ArgumentMismatch {
            expected: "u32",
            found: "alloc::string::String",
        };
        assert_eq!(
            err.to_string(),
            "slot takes `alloc::string::String` but the signal emits `u32`"
        );
    }
}
