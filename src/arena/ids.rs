// Typed handles for the three kinds of registered entity.
//
// All three share the `{index, generation}` layout of `RawHandle` but are
// distinct types, so a slot handle can never be passed where a signal handle
// is expected.

use std::fmt;

use super::RawHandle;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
        pub struct $name(RawHandle);

        impl $name {
            pub(crate) const fn from_raw(raw: RawHandle) -> Self {
                Self(raw)
            }

            pub(crate) const fn raw(self) -> RawHandle {
                self.0
            }

            /// Slab index of this entity inside its registry.
            pub const fn index(self) -> u32 {
                self.0.index()
            }

            /// Generation stamp distinguishing this entity from earlier
            /// occupants of the same index.
            pub const fn generation(self) -> u32 {
                self.0.generation()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}v{}", $tag, self.index(), self.generation())
            }
        }
    };
}

entity_id!(
    /// Identity of a registered [`Signal`](crate::Signal).
    ///
    /// Stays unique for the whole life of its registry: once the signal is
    /// dropped, the id never resolves again.
    SignalId,
    "signal"
);

entity_id!(
    /// Identity of a registered callable: a user-held [`Slot`](crate::Slot)
    /// or a wrapper the registry created for a free callable or method.
    SlotId,
    "slot"
);

entity_id!(
    /// Identity of a [`SlotOwner`](crate::SlotOwner), the marker embedded in
    /// receivers whose methods are bound to signals.
    OwnerId,
    "owner"
);
