// Type-erased slot callbacks.
//
// The registry is not generic: it stores every callable as
// `Arc<dyn Any + Send + Sync>` next to the `TypeId` of the argument it takes.
// Emission clones the `Arc`s under the lock and downcasts them back to
// `Callback<A>` after releasing it, so a wrapper freed concurrently stays
// alive until the call that is already running returns.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::error::RegistryError;

pub(crate) type ErasedCallback = Arc<dyn Any + Send + Sync>;

/// A slot body taking the signal's argument by reference.
pub(crate) struct Callback<A: 'static> {
    body: Box<dyn Fn(&A) + Send + Sync>,
}

impl<A: 'static> Callback<A> {
    pub(crate) fn new<F>(body: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        Self {
            body: Box::new(body),
        }
    }

    pub(crate) fn erase(self) -> ErasedCallback {
        Arc::new(self)
    }

    pub(crate) fn call(&self, args: &A) {
        (self.body)(args)
    }

    pub(crate) fn downcast(erased: ErasedCallback) -> Option<Arc<Self>> {
        erased.downcast::<Self>().ok()
    }
}

/// Runtime tag of a signal's or slot's argument type.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ArgumentType {
    id: TypeId,
    name: &'static str,
}

impl ArgumentType {
    pub(crate) fn of<A: 'static>() -> Self {
        Self {
            id: TypeId::of::<A>(),
            name: type_name::<A>(),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    pub(crate) fn is<A: 'static>(self) -> bool {
        self.id == TypeId::of::<A>()
    }

    /// Check that a slot taking `found` can be called by a signal emitting
    /// `self`.
    pub(crate) fn accepts(self, found: ArgumentType) -> Result<(), RegistryError> {
        if self.id == found.id {
            Ok(())
        } else {
            Err(RegistryError::ArgumentMismatch {
                expected: self.name,
                found: found.name,
            })
        }
    }
}
