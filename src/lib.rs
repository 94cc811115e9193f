#![deny(missing_docs)]

//! Synchronous signal/slot dispatch for a single process.
//!
//! Signals announce events with a typed argument; slots register to be called
//! when the event fires. Neither side knows the other's type. All bookkeeping
//! lives in a thread-safe [`Registry`] that records connections, enforces
//! single-vs-multi binding, dispatches in connection order, and drops
//! connections when either end goes away.
//!
//! # Quick Start
//!
//! ```ignore
//! use slotwire::{Cardinality, Receiver, Signal, Slot, SlotOwner};
//!
//! struct Thermometer {
//!     reading: Signal<f64>,
//! }
//!
//! struct Panel {
//!     owner: SlotOwner,
//! }
//!
//! impl Receiver for Panel {
//!     fn slot_owner(&self) -> &SlotOwner {
//!         &self.owner
//!     }
//! }
//!
//! impl Panel {
//!     fn show(&self, celsius: &f64) {
//!         println!("{celsius:.1} °C");
//!     }
//! }
//!
//! let thermometer = Thermometer { reading: Signal::new() };
//! let panel = Arc::new(Panel { owner: SlotOwner::new() });
//!
//! // Bind a method; a second Single bind of the same method is a no-op
//! thermometer.reading.connect_method(&panel, Panel::show, Cardinality::Single);
//!
//! // Or a user-held slot, or a free closure
//! let logger = Slot::new(|celsius: &f64| eprintln!("reading {celsius}"));
//! thermometer.reading.connect(&logger, Cardinality::Multi);
//! thermometer.reading.connect_fn(|celsius| assert!(*celsius > -273.15));
//!
//! thermometer.reading.emit(21.5);   // show, logger, closure - in that order
//!
//! drop(panel);                      // its binding is gone with it
//! thermometer.reading.emit(22.0);   // logger, closure
//! ```
//!
//! # Core Types
//!
//! - [`Signal<A>`] - Emission endpoint. [`emit`](Signal::emit) calls every connected slot.
//! - [`Slot<A>`] - Callable owned by application code, connected by reference.
//! - [`SlotOwner`] / [`Receiver`] - Marker letting a receiver's drop purge its bindings.
//! - [`Registry`] - The connection table. [`Registry::global()`] backs the `new()`
//!   constructors; `new_in` constructors take an explicit registry.
//!
//! # Cardinality
//!
//! ```ignore
//! signal.connect(&slot, Cardinality::Multi);    // appends every time
//! signal.connect(&slot, Cardinality::Single);   // no-op if already connected
//! signal.disconnect(&slot, Cardinality::Single);  // removes the first match
//! signal.disconnect(&slot, Cardinality::Multi);   // removes all matches
//! ```
//!
//! # Lifetimes
//!
//! Every entity unregisters itself when dropped:
//!
//! - dropping a [`Signal`] removes its connections; later emits reach nobody
//! - dropping a [`Slot`] removes it from every signal
//! - dropping a [`SlotOwner`] removes and frees every binding made for it
//!
//! Ids are generation-checked, so a stale id never reaches an entity that
//! later reused its storage.
//!
//! # Threading
//!
//! Slots run synchronously on the emitting thread, with no registry lock
//! held. See [`DispatchMode`] for how emissions are ordered against
//! concurrent disconnects.

// Internal modules
pub(crate) mod arena;
mod callback;
mod config;
mod connection;
mod error;
mod hash;
mod owner;
mod registry;
mod signal;
mod slot;

// Core types
pub use owner::{Receiver, SlotOwner};
pub use registry::Registry;
pub use signal::Signal;
pub use slot::Slot;

// Identities and connection metadata
pub use arena::{OwnerId, SignalId, SlotId};
pub use connection::{Cardinality, Connection, FunctionKey, SlotKind};

// Configuration and errors
pub use config::{DispatchMode, RegistryConfig};
pub use error::RegistryError;
