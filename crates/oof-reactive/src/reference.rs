#![forbid(unsafe_code)]

//! A cell that mirrors `object[key]`.
//!
//! Either input may be plain or a [`Changeable`]. The resulting cell is
//! recomputed by a single `update` routine from three triggers:
//!
//! - the object cell changes,
//! - the key cell changes,
//! - the currently watched [`Dictionary`] writes the property named by the
//!   current key.
//!
//! The watched dictionary is whatever the object resolves to right now. When
//! that identity changes, the old property listener is dropped and a new one
//! is subscribed.
//!
//! # Falsy inputs
//!
//! A key that is empty, zero, `None` or unset counts as "no key" and forces
//! the value to `None`, as does an object that is `None` or unset. A key of
//! `0` therefore never reads index `"0"`; callers wanting that must use a
//! non-zero or string key.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::changeable::{Changeable, Source, WeakChangeable};
use crate::dictionary::Dictionary;
use crate::emitter::Subscription;

/// Something a [`Reference`] can read a property from.
pub trait Keyed<V>: Clone + 'static {
    /// Falsy objects resolve every key to `None`.
    fn is_truthy(&self) -> bool {
        true
    }

    fn lookup(&self, key: &str) -> Option<V>;

    /// The dictionary to watch for property writes. Plain maps are readable
    /// but not observable.
    fn watchable(&self) -> Option<Dictionary<V>> {
        None
    }
}

impl<V: Clone + 'static> Keyed<V> for Dictionary<V> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.get(key)
    }

    fn watchable(&self) -> Option<Dictionary<V>> {
        Some(self.clone())
    }
}

impl<V, O: Keyed<V>> Keyed<V> for Option<O> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(|object| object.is_truthy())
    }

    fn lookup(&self, key: &str) -> Option<V> {
        self.as_ref().and_then(|object| object.lookup(key))
    }

    fn watchable(&self) -> Option<Dictionary<V>> {
        self.as_ref().and_then(|object| object.watchable())
    }
}

impl<V: Clone + 'static, S: BuildHasher + Clone + 'static> Keyed<V> for HashMap<String, V, S> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<V: Clone + 'static> Keyed<V> for BTreeMap<String, V> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<V: Clone + 'static, S: BuildHasher + Clone + 'static> Keyed<V> for IndexMap<String, V, S> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.get(key).cloned()
    }
}

/// A property name as used by [`Reference`]. `None` means "no key".
pub trait Key: Clone + 'static {
    fn resolve(&self) -> Option<String>;
}

impl Key for String {
    fn resolve(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.clone())
    }
}

impl Key for &'static str {
    fn resolve(&self) -> Option<String> {
        (!self.is_empty()).then(|| (*self).to_string())
    }
}

impl<K: Key> Key for Option<K> {
    fn resolve(&self) -> Option<String> {
        self.as_ref().and_then(Key::resolve)
    }
}

macro_rules! impl_integer_key {
    ($($ty:ty),*) => {
        $(
            impl Key for $ty {
                fn resolve(&self) -> Option<String> {
                    (*self != 0).then(|| self.to_string())
                }
            }
        )*
    };
}

impl_integer_key!(i32, i64, u32, u64, usize);

/// Constructor for cells mirroring `object[key]`.
pub struct Reference;

impl Reference {
    /// Create a cell holding `object[key]`, kept current as described in the
    /// [module docs](self).
    ///
    /// ```
    /// use oof_reactive::{Dictionary, Reference, Source, Value};
    ///
    /// let user = Dictionary::from_entries([("name", "Ada".to_string())]);
    /// let field = Value::new("name".to_string());
    /// let name = Reference::new(Source::fixed(user.clone()), &field);
    /// assert_eq!(name.get(), Some(Some("Ada".to_string())));
    ///
    /// user.set("name", "Grace".to_string());
    /// assert_eq!(name.get(), Some(Some("Grace".to_string())));
    /// ```
    pub fn new<V, O, K>(object: impl Into<Source<O>>, key: impl Into<Source<K>>) -> Changeable<Option<V>>
    where
        V: Clone + 'static,
        O: Keyed<V>,
        K: Key,
    {
        let cell = Changeable::unset();
        let state = Rc::new(ReferenceState {
            object: object.into(),
            key: key.into(),
            target: cell.downgrade(),
            watched: RefCell::new(None),
            inputs: RefCell::new(Vec::new()),
        });

        let mut inputs = Vec::new();
        if let Some(object_cell) = state.object.cell() {
            let weak = Rc::downgrade(&state);
            inputs.push(object_cell.on_change(move |_| ReferenceState::refresh(&weak)));
        }
        if let Some(key_cell) = state.key.cell() {
            let weak = Rc::downgrade(&state);
            inputs.push(key_cell.on_change(move |_| ReferenceState::refresh(&weak)));
        }
        *state.inputs.borrow_mut() = inputs;

        state.update();
        cell.attach(Box::new(state));
        cell
    }
}

struct Watched<V: 'static> {
    dictionary: Dictionary<V>,
    _subscription: Subscription,
}

struct ReferenceState<V: 'static, O: 'static, K: 'static> {
    object: Source<O>,
    key: Source<K>,
    target: WeakChangeable<Option<V>>,
    /// Current dictionary listener, replaced whenever the resolved object
    /// identity changes.
    watched: RefCell<Option<Watched<V>>>,
    inputs: RefCell<Vec<Subscription>>,
}

impl<V, O, K> ReferenceState<V, O, K>
where
    V: Clone + 'static,
    O: Keyed<V>,
    K: Key,
{
    fn refresh(weak: &Weak<Self>) {
        if let Some(state) = weak.upgrade() {
            state.update();
        }
    }

    fn current_key(&self) -> Option<String> {
        self.key.value().and_then(|key| key.resolve())
    }

    fn update(self: &Rc<Self>) {
        let key = self.current_key();
        let object = self.object.value().filter(|object| object.is_truthy());

        // Rebind before publishing: a listener reacting to the new value may
        // re-enter `update`, and its binding must be the one that sticks.
        self.rebind(object.as_ref().and_then(|object| object.watchable()));

        let next = match (&object, &key) {
            (Some(object), Some(key)) => object.lookup(key),
            _ => None,
        };
        if let Some(target) = self.target.upgrade() {
            target.set(next);
        }
    }

    fn rebind(self: &Rc<Self>, dictionary: Option<Dictionary<V>>) {
        let unchanged = match (self.watched.borrow().as_ref(), dictionary.as_ref()) {
            (Some(watched), Some(next)) => watched.dictionary.ptr_eq(next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        // Drop the old listener outside the borrow.
        let previous = self.watched.borrow_mut().take();
        drop(previous);

        if let Some(dictionary) = dictionary {
            tracing::debug!(message = "reference.rebind", watching = true);
            let weak = Rc::downgrade(self);
            let subscription = dictionary.on_property_change(move |name, _| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if state.current_key().as_deref() == Some(name) {
                    state.update();
                }
            });
            *self.watched.borrow_mut() = Some(Watched {
                dictionary,
                _subscription: subscription,
            });
        } else {
            tracing::debug!(message = "reference.rebind", watching = false);
        }
    }
}
