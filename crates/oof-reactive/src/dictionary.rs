#![forbid(unsafe_code)]

//! Observable keyed map.
//!
//! A [`Dictionary`] behaves like a plain ordered map, except that every write
//! emits a [`PropertyChange`] to its listeners. It is not a
//! [`Changeable`](crate::Changeable): there is no single value and no
//! version, only "property `name` was set to `value`".

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::emitter::{Emitter, Subscription};

/// Payload emitted for each property write.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange<V> {
    pub name: String,
    pub value: V,
}

struct DictionaryInner<V: 'static> {
    properties: RefCell<IndexMap<String, V>>,
    changed: Emitter<PropertyChange<V>>,
}

/// A shared map that notifies listeners on every property write.
///
/// Cloning a `Dictionary` creates a new handle to the **same** map; identity
/// is compared with [`ptr_eq`](Self::ptr_eq).
pub struct Dictionary<V: 'static> {
    inner: Rc<DictionaryInner<V>>,
}

impl<V: 'static> Clone for Dictionary<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + 'static> Default for Dictionary<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug + 'static> fmt::Debug for Dictionary<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.properties.borrow().iter())
            .finish()
    }
}

impl<V: Clone + 'static> Dictionary<V> {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(std::iter::empty::<(String, V)>())
    }

    /// Create a dictionary from initial entries. The entries are copied in;
    /// no notification is emitted for them.
    #[must_use]
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let properties = entries
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        Self {
            inner: Rc::new(DictionaryInner {
                properties: RefCell::new(properties),
                changed: Emitter::new(),
            }),
        }
    }

    /// Write a property and notify every listener with `(name, value)`.
    pub fn set(&self, name: impl Into<String>, value: V) {
        let name = name.into();
        self.inner
            .properties
            .borrow_mut()
            .insert(name.clone(), value.clone());
        self.inner.changed.emit(&PropertyChange { name, value });
    }

    /// Write `f(current)` to a property and notify.
    pub fn update(&self, name: impl Into<String>, f: impl FnOnce(Option<&V>) -> V) {
        let name = name.into();
        let next = {
            let properties = self.inner.properties.borrow();
            f(properties.get(&name))
        };
        self.set(name, next);
    }

    /// Write several properties, one notification per entry, in order.
    pub fn extend<K: Into<String>>(&self, entries: impl IntoIterator<Item = (K, V)>) {
        for (name, value) in entries {
            self.set(name, value);
        }
    }

    /// Clone of a property's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<V> {
        self.inner.properties.borrow().get(name).cloned()
    }

    /// Register a listener called with `(name, value)` after each write.
    pub fn on_property_change(&self, listener: impl Fn(&str, &V) + 'static) -> Subscription {
        self.inner
            .changed
            .subscribe(move |change: &PropertyChange<V>| listener(&change.name, &change.value))
    }
}

impl<V: 'static> Dictionary<V> {
    /// Borrow the underlying map.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<String, V>) -> R) -> R {
        f(&self.inner.properties.borrow())
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.properties.borrow().contains_key(name)
    }

    /// Property names in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.properties.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.properties.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered property listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.changed.listener_count()
    }

    /// Whether both handles point at the same dictionary.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K: Into<String>, V: Clone + 'static> FromIterator<(K, V)> for Dictionary<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn changes(dict: &Dictionary<i32>) -> (Rc<RefCell<Vec<(String, i32)>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let sub = dict.on_property_change(move |name, value| {
            log_clone.borrow_mut().push((name.to_string(), *value));
        });
        (log, sub)
    }

    #[test]
    fn initial_entries_do_not_notify() {
        let source = vec![("a", 1), ("b", 2)];
        let dict = Dictionary::from_entries(source.clone());
        let (log, _sub) = changes(&dict);

        assert_eq!(dict.get("a"), Some(1));
        assert_eq!(dict.get("b"), Some(2));
        assert_eq!(dict.keys(), vec!["a", "b"]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn every_write_notifies() {
        let dict = Dictionary::<i32>::new();
        let (log, _sub) = changes(&dict);

        dict.set("x", 1);
        dict.set("x", 1);
        dict.update("x", |v| v.copied().unwrap_or(0) + 1);
        dict.extend([("y", 5), ("z", 6)]);

        assert_eq!(
            *log.borrow(),
            vec![
                ("x".to_string(), 1),
                ("x".to_string(), 1),
                ("x".to_string(), 2),
                ("y".to_string(), 5),
                ("z".to_string(), 6),
            ]
        );
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn reads_have_no_side_effects() {
        let dict: Dictionary<i32> = [("a", 1)].into_iter().collect();
        let (log, _sub) = changes(&dict);

        let _ = dict.get("a");
        let _ = dict.get("missing");
        let _ = dict.contains_key("a");
        dict.with(|map| assert_eq!(map.len(), 1));

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn removed_listener_stops_hearing() {
        let dict = Dictionary::<i32>::new();
        let (log, sub) = changes(&dict);
        dict.set("a", 1);
        sub.remove();
        dict.set("a", 2);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(dict.listener_count(), 0);
    }

    #[test]
    fn clones_share_identity() {
        let a = Dictionary::<i32>::new();
        let b = a.clone();
        let c = Dictionary::<i32>::new();
        b.set("k", 1);
        assert_eq!(a.get("k"), Some(1));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
