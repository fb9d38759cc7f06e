#![forbid(unsafe_code)]

//! Reactive state for oof.
//!
//! This crate provides the observable graph that components render from:
//!
//! - [`Changeable`] / [`Value`]: a shared cell that notifies listeners on
//!   every `set`.
//! - [`Dictionary`]: a keyed map that notifies listeners on every property
//!   write.
//! - [`Reference`]: a cell mirroring `object[key]`, where object and key may
//!   themselves be cells.
//! - [`Computed`]: a cell derived from a fixed list of dependencies,
//!   synchronously or through a future.
//! - [`Emitter`] / [`Subscription`]: the listener substrate under all of the
//!   above.
//!
//! # Architecture
//!
//! Everything is single-threaded and `Rc`-based. Derived cells own their
//! input subscriptions and hold only weak handles to the cell they update, so
//! dropping the last handle to a derived cell detaches it from the graph.
//!
//! # Invariants
//!
//! 1. Propagation is synchronous and depth-first, in subscription order.
//! 2. Listeners registered during a notification are not invoked by it.
//! 3. No cascade is coalesced: a dependent of two cells changed by one
//!    cascade is updated twice.
//! 4. Listener invocation is unguarded; a panic interrupts the rest of the
//!    notification cycle.

pub mod changeable;
pub mod computed;
pub mod deps;
pub mod dictionary;
pub mod emitter;
pub mod error;
pub mod reference;

pub use changeable::{Changeable, Source, Value, WeakChangeable, value_of};
pub use computed::{AsyncPolicy, Computed};
pub use deps::{AnyChangeable, Dependencies, Values};
pub use dictionary::{Dictionary, PropertyChange};
pub use emitter::{Emitter, Subscription};
pub use error::ValuesError;
pub use reference::{Key, Keyed, Reference};
