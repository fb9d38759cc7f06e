#![forbid(unsafe_code)]

//! The observable cell every other primitive is built from.
//!
//! [`Changeable<T>`] holds at most one value and notifies its listeners on
//! every [`set`](Changeable::set). [`Value`] is the same type, created with a
//! starting value. [`Reference`](crate::Reference) and
//! [`Computed`](crate::Computed) are constructors that attach an update
//! routine to a fresh cell; they differ only in how the value is produced.
//!
//! # Invariants
//!
//! 1. `get()` returns the argument of the most recent `set`, or `None` while
//!    the cell has never been set.
//! 2. `version()` counts `set` calls. Setting an equal value still notifies.
//! 3. The new value is stored before any listener runs, so listeners (and
//!    anything they call) observe it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::emitter::{Emitter, Subscription};

struct CellInner<T: 'static> {
    value: RefCell<Option<T>>,
    version: Cell<u64>,
    changed: Emitter<T>,
    /// State owned by derived cells (their update routine and input
    /// subscriptions). Never read, only kept alive with the cell.
    attachments: RefCell<Vec<Box<dyn Any>>>,
}

/// A shared observable cell.
///
/// Cloning a `Changeable` creates a new handle to the **same** cell.
pub struct Changeable<T: 'static> {
    inner: Rc<CellInner<T>>,
}

/// A [`Changeable`] created with a starting value: `Value::new(0)`.
pub type Value<T> = Changeable<T>;

impl<T: 'static> Clone for Changeable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Changeable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changeable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("listeners", &self.inner.changed.listener_count())
            .finish()
    }
}

impl<T: Clone + 'static> Default for Changeable<T> {
    fn default() -> Self {
        Self::unset()
    }
}

impl<T: Clone + 'static> Changeable<T> {
    /// Create a cell holding `initial`. No listener exists yet, so nothing is
    /// notified.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let cell = Self::unset();
        cell.set(initial);
        cell
    }

    /// Create a cell that has never been set.
    #[must_use]
    pub fn unset() -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(None),
                version: Cell::new(0),
                changed: Emitter::new(),
                attachments: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Store `value` and notify every listener registered before this call.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = Some(value.clone());
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        tracing::trace!(
            message = "changeable.set",
            version,
            listeners = self.inner.changed.listener_count()
        );
        self.inner.changed.emit(&value);
    }

    /// Replace the value with `f(current)` and notify.
    pub fn update(&self, f: impl FnOnce(Option<&T>) -> T) {
        let next = {
            let current = self.inner.value.borrow();
            f(current.as_ref())
        };
        self.set(next);
    }

    /// Clone of the current value, `None` while unset.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }

    /// Register a listener for every future `set`.
    pub fn on_change(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        self.inner.changed.subscribe(listener)
    }
}

impl<T: 'static> Changeable<T> {
    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls `set` on the same cell.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.value.borrow().as_ref())
    }

    /// Whether the cell has been set at least once.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Number of `set` calls so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.changed.listener_count()
    }

    /// Whether both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the cell alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakChangeable<T> {
        WeakChangeable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn attach(&self, state: Box<dyn Any>) {
        self.inner.attachments.borrow_mut().push(state);
    }
}

/// Non-owning handle to a [`Changeable`].
pub struct WeakChangeable<T: 'static> {
    inner: Weak<CellInner<T>>,
}

impl<T: 'static> Clone for WeakChangeable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: 'static> WeakChangeable<T> {
    /// The cell, if some strong handle still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Changeable<T>> {
        self.inner.upgrade().map(|inner| Changeable { inner })
    }
}

impl<T: 'static> fmt::Debug for WeakChangeable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakChangeable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// An input that is either a plain value or a [`Changeable`].
///
/// Derived cells accept `Source`s so callers can pass either form.
pub enum Source<T: 'static> {
    /// A value that never changes.
    Fixed(T),
    /// A cell whose current value is read on every update.
    Cell(Changeable<T>),
}

impl<T: Clone + 'static> Source<T> {
    /// Wrap a plain value.
    #[must_use]
    pub fn fixed(value: T) -> Self {
        Self::Fixed(value)
    }

    /// Current value: the plain value, or the cell's value (`None` while
    /// unset).
    #[must_use]
    pub fn value(&self) -> Option<T> {
        match self {
            Self::Fixed(value) => Some(value.clone()),
            Self::Cell(cell) => cell.get(),
        }
    }

    /// The cell behind this source, if any.
    #[must_use]
    pub fn cell(&self) -> Option<&Changeable<T>> {
        match self {
            Self::Fixed(_) => None,
            Self::Cell(cell) => Some(cell),
        }
    }
}

impl<T: Clone + 'static> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(value) => Self::Fixed(value.clone()),
            Self::Cell(cell) => Self::Cell(cell.clone()),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Cell(cell) => f.debug_tuple("Cell").field(cell).finish(),
        }
    }
}

impl<T: 'static> From<Changeable<T>> for Source<T> {
    fn from(cell: Changeable<T>) -> Self {
        Self::Cell(cell)
    }
}

impl<T: 'static> From<&Changeable<T>> for Source<T> {
    fn from(cell: &Changeable<T>) -> Self {
        Self::Cell(cell.clone())
    }
}

impl From<&str> for Source<String> {
    fn from(value: &str) -> Self {
        Self::Fixed(value.to_string())
    }
}

impl From<String> for Source<String> {
    fn from(value: String) -> Self {
        Self::Fixed(value)
    }
}

/// Current value of a [`Source`]: the plain value itself, or the cell's value.
#[must_use]
pub fn value_of<T: Clone + 'static>(source: &Source<T>) -> Option<T> {
    source.value()
}
