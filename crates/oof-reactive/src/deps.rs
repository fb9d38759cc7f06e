#![forbid(unsafe_code)]

//! Type-erased dependency lists.
//!
//! Components and computed cells depend on an ordered list of cells whose
//! value types differ. [`Dependencies`] stores them behind [`AnyChangeable`];
//! [`Values`] is a snapshot of their current values, read back with a type at
//! each index.

use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

use crate::changeable::Changeable;
use crate::emitter::Subscription;
use crate::error::ValuesError;

/// Object-safe view of a [`Changeable`] of any value type.
pub trait AnyChangeable {
    /// Subscribe a listener that ignores the new value.
    fn subscribe_erased(&self, listener: Rc<dyn Fn()>) -> Subscription;

    /// Clone of the current value, boxed. `None` while unset.
    fn snapshot_erased(&self) -> Option<Box<dyn Any>>;

    /// Name of the cell's value type, for error messages.
    fn value_type_name(&self) -> &'static str;
}

impl<T: Clone + 'static> AnyChangeable for Changeable<T> {
    fn subscribe_erased(&self, listener: Rc<dyn Fn()>) -> Subscription {
        self.on_change(move |_| listener())
    }

    fn snapshot_erased(&self) -> Option<Box<dyn Any>> {
        self.get().map(|value| Box::new(value) as Box<dyn Any>)
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// An ordered list of cells, fixed once built.
#[derive(Clone, Default)]
pub struct Dependencies {
    cells: Vec<Rc<dyn AnyChangeable>>,
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.cells.iter().map(|cell| cell.value_type_name()))
            .finish()
    }
}

impl Dependencies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell (builder form).
    #[must_use]
    pub fn with<T: Clone + 'static>(mut self, cell: &Changeable<T>) -> Self {
        self.push(cell);
        self
    }

    /// Append a cell.
    pub fn push<T: Clone + 'static>(&mut self, cell: &Changeable<T>) {
        self.cells.push(Rc::new(cell.clone()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Current values in declaration order.
    #[must_use]
    pub fn snapshot(&self) -> Values {
        Values {
            items: self
                .cells
                .iter()
                .map(|cell| Slot {
                    value: cell.snapshot_erased(),
                    type_name: cell.value_type_name(),
                })
                .collect(),
        }
    }

    /// Subscribe `listener` to every cell, in declaration order. The listener
    /// receives the index of the cell that changed.
    pub fn subscribe_each(&self, listener: impl Fn(usize) + 'static) -> Vec<Subscription> {
        let listener: Rc<dyn Fn(usize)> = Rc::new(listener);
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let listener = Rc::clone(&listener);
                cell.subscribe_erased(Rc::new(move || listener(index)))
            })
            .collect()
    }
}

/// Build [`Dependencies`] from a list of cells: `deps![count, name]`.
#[macro_export]
macro_rules! deps {
    ($($cell:expr),* $(,)?) => {
        $crate::Dependencies::new()$(.with(&$cell))*
    };
}

struct Slot {
    value: Option<Box<dyn Any>>,
    type_name: &'static str,
}

/// Values of a [`Dependencies`] list at one point in time.
pub struct Values {
    items: Vec<Slot>,
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.items
                    .iter()
                    .map(|slot| (slot.type_name, slot.value.is_some())),
            )
            .finish()
    }
}

impl Values {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The value at `index`, which must be set and of type `T`.
    pub fn get<T: 'static>(&self, index: usize) -> Result<&T, ValuesError> {
        self.try_get(index)?
            .ok_or(ValuesError::Unset { index })
    }

    /// The value at `index` as `T`, or `None` if that cell is unset.
    pub fn try_get<T: 'static>(&self, index: usize) -> Result<Option<&T>, ValuesError> {
        let slot = self.items.get(index).ok_or(ValuesError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })?;
        match &slot.value {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or(ValuesError::TypeMismatch {
                    index,
                    expected: type_name::<T>(),
                    found: slot.type_name,
                }),
        }
    }

    /// Whether the cell at `index` was set when the snapshot was taken.
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        self.items.get(index).is_some_and(|slot| slot.value.is_some())
    }
}
