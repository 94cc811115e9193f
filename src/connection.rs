use std::any::TypeId;

use crate::arena::{OwnerId, SignalId, SlotId};

/// Binding semantics requested by a connect or disconnect call.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Cardinality {
    /// Every connect appends a new connection; disconnect removes all matches.
    #[default]
    Multi,
    /// Connect is a no-op when a matching connection already exists;
    /// disconnect removes only the first match.
    Single,
}

/// Who owns the callable behind a connection.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SlotKind {
    /// A [`Slot`](crate::Slot) held by application code.
    ExternalObject,
    /// A wrapper the registry allocated for a free callable or method.
    InternalBinding,
}

/// Identity of a bound method, used to recognize "the same binding" across
/// separate connect calls.
///
/// Made of the method's full `fn` pointer type and its address. Distinct
/// functions that the compiler merges into one body compare equal, which only
/// matters if both are bound with [`Cardinality::Single`] on the same
/// receiver and signal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionKey {
    signature: TypeId,
    address: usize,
}

impl FunctionKey {
    /// Key of a receiver method taking the signal's arguments by reference.
    pub fn of_method<R: 'static, A: 'static>(method: fn(&R, &A)) -> Self {
        Self {
            signature: TypeId::of::<fn(&R, &A)>(),
            address: method as usize,
        }
    }
}

/// One registered signal→slot association.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Connection {
    /// The callable invoked on emission.
    pub slot: SlotId,
    /// Receiver the callable was bound for, if it is a method binding.
    pub owner: Option<OwnerId>,
    /// Whether the callable is user-held or a registry-owned wrapper.
    pub kind: SlotKind,
    /// Cardinality the connection was made with.
    pub cardinality: Cardinality,
}

/// Key of the auxiliary binding map: one ordered wrapper set per
/// `{signal, function}` pair.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) struct BindingKey {
    pub(crate) signal: SignalId,
    pub(crate) function: FunctionKey,
}

/// Remove connections matching `predicate` from `connections`, keeping the
/// order of the rest. With [`Cardinality::Single`] only the first match goes.
pub(crate) fn remove_matching(
    connections: &mut Vec<Connection>,
    cardinality: Cardinality,
    mut predicate: impl FnMut(&Connection) -> bool,
) -> Vec<Connection> {
    match cardinality {
        Cardinality::Single => {
            let first = connections.iter().position(|connection| predicate(connection));
            first
                .map(|index| vec![connections.remove(index)])
                .unwrap_or_default()
        }
        Cardinality::Multi => {
            let mut removed = Vec::new();
            connections.retain(|connection| {
                if predicate(connection) {
                    removed.push(*connection);
                    false
                } else {
                    true
                }
            });
            removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::RawHandle;

    struct Receiver;

    impl Receiver {
        fn first(&self, _: &u32) {}
        fn second(&self, _: &u32) {}
    }

    fn connection(index: u32) -> Connection {
        Connection {
            slot: SlotId::from_raw(RawHandle::new(index, 1)),
            owner: None,
            kind: SlotKind::ExternalObject,
            cardinality: Cardinality::Multi,
        }
    }

    #[test]
    fn function_key_tells_methods_apart() {
        let first = FunctionKey::of_method(Receiver::first as fn(&Receiver, &u32));
        let again = FunctionKey::of_method(Receiver::first as fn(&Receiver, &u32));
        let second = FunctionKey::of_method(Receiver::second as fn(&Receiver, &u32));

        assert_eq!(first, again);
        assert_ne!(first, second);
    }

    #[test]
    fn single_removal_stops_at_first_match() {
        let mut connections = vec![connection(1), connection(2), connection(1)];
        let removed = remove_matching(&mut connections, Cardinality::Single, |c| {
            c.slot.index() == 1
        });

        assert_eq!(removed, vec![connection(1)]);
        assert_eq!(connections, vec![connection(2), connection(1)]);
    }

    #[test]
    fn multi_removal_takes_every_match_and_keeps_order() {
        let mut connections = vec![connection(1), connection(2), connection(1), connection(3)];
        let removed = remove_matching(&mut connections, Cardinality::Multi, |c| {
            c.slot.index() == 1
        });

        assert_eq!(removed.len(), 2);
        assert_eq!(connections, vec![connection(2), connection(3)]);
    }

    #[test]
    fn removal_without_match_is_a_no_op() {
        let mut connections = vec![connection(2)];
        assert!(remove_matching(&mut connections, Cardinality::Single, |_| false).is_empty());
        assert!(remove_matching(&mut connections, Cardinality::Multi, |_| false).is_empty());
        assert_eq!(connections, vec![connection(2)]);
    }
}
