#![forbid(unsafe_code)]

//! Ordered listener lists with removable subscriptions.
//!
//! [`Emitter<E>`] is the substrate under every observable in this crate:
//! [`Changeable`](crate::Changeable) emits its new value, and
//! [`Dictionary`](crate::Dictionary) emits a [`PropertyChange`](crate::PropertyChange).
//!
//! # Invariants
//!
//! 1. Listeners run in registration order, synchronously, once per `emit`.
//! 2. A listener registered while an `emit` is running is not invoked by that
//!    `emit`.
//! 3. A listener removed while an `emit` is running is not invoked afterwards,
//!    not even later in the same `emit`.
//! 4. No borrow of the listener list is held while a listener runs, so
//!    listeners may subscribe, unsubscribe and emit re-entrantly.
//! 5. Invocation is unguarded. A panicking listener unwinds out of `emit` and
//!    the remaining listeners of that cycle are skipped.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

type Callback<E> = Rc<dyn Fn(&E)>;

struct Entry<E: ?Sized> {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback<E>,
}

struct EmitterInner<E: ?Sized> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

/// Removal hook shared by every emitter, so [`Subscription`] stays untyped.
trait Unsubscribe {
    fn unsubscribe(&self, id: u64);
}

impl<E: ?Sized> Unsubscribe for RefCell<EmitterInner<E>> {
    fn unsubscribe(&self, id: u64) {
        self.borrow_mut().entries.retain(|entry| entry.id != id);
    }
}

/// An ordered list of listeners for events of type `E`.
///
/// Cloning an `Emitter` creates a new handle to the **same** listener list.
pub struct Emitter<E: ?Sized + 'static> {
    inner: Rc<RefCell<EmitterInner<E>>>,
}

impl<E: ?Sized + 'static> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: ?Sized + 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E: ?Sized + 'static> Emitter<E> {
    /// Create an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EmitterInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is removed or dropped.
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry {
                id,
                active: Rc::clone(&active),
                callback: Rc::new(listener),
            });
            id
        };
        let source: Weak<dyn Unsubscribe> = Rc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
        Subscription {
            source,
            id,
            active,
            detached: false,
        }
    }

    /// Invoke every listener registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let snapshot: SmallVec<[(Rc<Cell<bool>>, Callback<E>); 4]> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|entry| (Rc::clone(&entry.active), Rc::clone(&entry.callback)))
            .collect();

        for (active, callback) in snapshot {
            if active.get() {
                callback(event);
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0
    }
}

/// Handle for one registered listener.
///
/// Dropping the handle removes the listener. Call [`detach`](Self::detach)
/// to keep the listener for as long as the emitter lives.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    source: Weak<dyn Unsubscribe>,
    id: u64,
    active: Rc<Cell<bool>>,
    detached: bool,
}

impl Subscription {
    /// Remove the listener. Removing twice, or after the emitter is gone, is
    /// a no-op.
    pub fn remove(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(source) = self.source.upgrade() {
            source.unsubscribe(self.id);
        }
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get() && self.source.strong_count() > 0
    }

    /// Give up the handle without removing the listener.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .field("detached", &self.detached)
            .finish()
    }
}
