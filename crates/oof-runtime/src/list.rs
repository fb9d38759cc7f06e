#![forbid(unsafe_code)]

//! List components that patch one child per operation.
//!
//! An [`ElList`] owns a `Vec<T>` of item states and a render function for a
//! single item. Every mutating operation renders only the affected item and
//! touches only the corresponding child of each mount target, so the nodes
//! of untouched items keep their identity.
//!
//! # Invariants
//!
//! 1. After every successful operation each target's children are exactly
//!    the rendered items, in state order.
//! 2. A failed operation changes neither the state nor any target.
//! 3. With several targets an item is rendered once and deep-cloned for the
//!    other targets. Nested mountables stay live only in the first target.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use oof_dom::{Child, Document, Mountable, NodeId};

use crate::el::short_type_name;
use crate::error::{Contract, ElError};
use crate::target::MountTarget;

/// Output of an item render function.
pub enum Item {
    /// Becomes a text node.
    Text(String),
    /// A detached node, used as is.
    Node(NodeId),
    /// Wrapped in an element built from the list's item tag spec.
    Many(Vec<Child>),
    /// Mounted into an element built from the list's item tag spec.
    Mount(Rc<dyn Mountable>),
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Many(children) => f.debug_tuple("Many").field(children).finish(),
            Self::Mount(_) => f.write_str("Mount(..)"),
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NodeId> for Item {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<Child>> for Item {
    fn from(children: Vec<Child>) -> Self {
        Self::Many(children)
    }
}

impl From<Child> for Item {
    fn from(child: Child) -> Self {
        match child {
            Child::Text(text) => Self::Text(text),
            Child::Node(node) => Self::Node(node),
            Child::Mount(mountable) => Self::Mount(mountable),
        }
    }
}

type RenderItem<T> = Box<dyn Fn(&Document, &T) -> Result<Item, ElError>>;

struct ListMount {
    target: NodeId,
    /// One node per item, in state order.
    nodes: Vec<NodeId>,
}

struct ListInner<T: 'static> {
    doc: Document,
    name: &'static str,
    render: RenderItem<T>,
    item_tag: RefCell<String>,
    items: RefCell<Vec<T>>,
    mounts: RefCell<Vec<ListMount>>,
}

/// A list component.
///
/// Cloning creates a new handle to the **same** list.
pub struct ElList<T: 'static> {
    inner: Rc<ListInner<T>>,
}

impl<T: 'static> Clone for ElList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ElList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElList")
            .field("items", &*self.inner.items.borrow())
            .field("targets", &self.inner.mounts.borrow().len())
            .finish()
    }
}

impl<T: 'static> ElList<T> {
    /// Create an unmounted list.
    pub fn new(
        doc: &Document,
        initial: impl IntoIterator<Item = T>,
        render: impl Fn(&Document, &T) -> Result<Item, ElError> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ListInner {
                doc: doc.clone(),
                name: short_type_name::<Self>(),
                render: Box::new(render),
                item_tag: RefCell::new(String::new()),
                items: RefCell::new(initial.into_iter().collect()),
                mounts: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Tag spec for wrapper elements (default `div`). Applies to items
    /// rendered afterwards.
    #[must_use]
    pub fn with_item_tag(self, spec: &str) -> Self {
        *self.inner.item_tag.borrow_mut() = spec.to_string();
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the item states.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Live mount targets.
    #[must_use]
    pub fn targets(&self) -> Vec<NodeId> {
        self.inner.mounts.borrow().iter().map(|m| m.target).collect()
    }

    /// Add an item at the end.
    pub fn append(&self, item: T) -> Result<(), ElError> {
        let nodes = self.render_for_targets(&item)?;
        for (mount, node) in self.inner.mounts.borrow_mut().iter_mut().zip(nodes) {
            self.inner.doc.append_child(mount.target, node)?;
            mount.nodes.push(node);
        }
        self.inner.items.borrow_mut().push(item);
        tracing::debug!(message = "list.append", component = self.inner.name, len = self.len());
        Ok(())
    }

    /// Add an item at the front.
    pub fn prepend(&self, item: T) -> Result<(), ElError> {
        let nodes = self.render_for_targets(&item)?;
        for (mount, node) in self.inner.mounts.borrow_mut().iter_mut().zip(nodes) {
            let first = self.inner.doc.first_child(mount.target)?;
            self.inner.doc.insert_before(mount.target, node, first)?;
            mount.nodes.insert(0, node);
        }
        self.inner.items.borrow_mut().insert(0, item);
        tracing::debug!(message = "list.prepend", component = self.inner.name, len = self.len());
        Ok(())
    }

    /// Replace the state at `index` and re-render that item only.
    pub fn set(&self, index: usize, item: T) -> Result<(), ElError> {
        self.check_index(index)?;
        let nodes = self.render_for_targets(&item)?;
        for (mount, node) in self.inner.mounts.borrow_mut().iter_mut().zip(nodes) {
            let old = mount.nodes[index];
            self.inner.doc.replace_child(mount.target, node, old)?;
            self.inner.doc.discard(old)?;
            mount.nodes[index] = node;
        }
        self.inner.items.borrow_mut()[index] = item;
        tracing::debug!(message = "list.set", component = self.inner.name, index);
        Ok(())
    }

    /// Remove the item at `index` and its node in every target.
    pub fn remove(&self, index: usize) -> Result<T, ElError> {
        self.check_index(index)?;
        self.prune();
        for mount in self.inner.mounts.borrow_mut().iter_mut() {
            let old = mount.nodes.remove(index);
            self.inner.doc.discard(old)?;
        }
        let item = self.inner.items.borrow_mut().remove(index);
        tracing::debug!(message = "list.remove", component = self.inner.name, index);
        Ok(item)
    }

    /// Render the whole list into every target `target` resolves to, once,
    /// and keep those targets in sync from now on. Targets already mounted
    /// are skipped.
    pub fn mount(&self, target: impl Into<MountTarget>) -> Result<(), ElError> {
        let targets = target.into().resolve(&self.inner.doc)?;
        let span = tracing::debug_span!(
            "list.mount",
            component = self.inner.name,
            targets = targets.len(),
            items = self.len()
        );
        let _guard = span.enter();

        for target in targets {
            if self.inner.mounts.borrow().iter().any(|mount| mount.target == target) {
                continue;
            }
            let nodes = self.render_whole(target)?;
            self.inner.mounts.borrow_mut().push(ListMount { target, nodes });
        }
        Ok(())
    }

    /// Render every item into `target` once, without tracking it. Returns the
    /// appended nodes.
    pub fn render_whole(&self, target: NodeId) -> Result<Vec<NodeId>, ElError> {
        let items = self.inner.items.borrow();
        let mut nodes = Vec::with_capacity(items.len());
        for item in items.iter() {
            match self.render_item(item) {
                Ok(node) => nodes.push(node),
                Err(error) => {
                    for node in nodes {
                        self.inner.doc.discard(node)?;
                    }
                    return Err(error);
                }
            }
        }
        for &node in &nodes {
            self.inner.doc.append_child(target, node)?;
        }
        Ok(nodes)
    }

    fn check_index(&self, index: usize) -> Result<(), ElError> {
        let len = self.len();
        if index >= len {
            return Err(ElError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn prune(&self) {
        let doc = &self.inner.doc;
        self.inner
            .mounts
            .borrow_mut()
            .retain(|mount| doc.is_live(mount.target));
    }

    /// One detached node per live target: the rendered node for the first,
    /// deep clones for the rest.
    fn render_for_targets(&self, item: &T) -> Result<Vec<NodeId>, ElError> {
        self.prune();
        let count = self.inner.mounts.borrow().len();
        let node = self.render_item(item)?;
        if count == 0 {
            self.inner.doc.discard(node)?;
            return Ok(Vec::new());
        }
        let mut nodes = Vec::with_capacity(count);
        nodes.push(node);
        for _ in 1..count {
            nodes.push(self.inner.doc.deep_clone(node)?);
        }
        Ok(nodes)
    }

    fn render_item(&self, item: &T) -> Result<NodeId, ElError> {
        let doc = &self.inner.doc;
        match (self.inner.render)(doc, item)? {
            Item::Text(text) => Ok(doc.create_text(text)),
            Item::Node(node) => {
                if !doc.is_live(node) {
                    return Err(ElError::contract(self.inner.name, Contract::StaleNode(node)));
                }
                if doc.parent(node)?.is_some() || node == doc.body() {
                    return Err(ElError::contract(self.inner.name, Contract::AttachedNode(node)));
                }
                Ok(node)
            }
            Item::Many(children) => {
                let wrapper = doc.create_element(&self.inner.item_tag.borrow());
                for child in doc.node_list(children) {
                    doc.append_child(wrapper, child)?;
                }
                Ok(wrapper)
            }
            Item::Mount(mountable) => {
                let wrapper = doc.create_element(&self.inner.item_tag.borrow());
                mountable.mount_into(doc, wrapper);
                Ok(wrapper)
            }
        }
    }
}

impl<T: Clone + 'static> ElList<T> {
    /// Clone of the state at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }
}

impl<T: 'static> Mountable for ElList<T> {
    fn mount_into(&self, doc: &Document, target: NodeId) {
        let result = if doc.ptr_eq(&self.inner.doc) {
            self.mount(target)
        } else {
            Err(ElError::contract(self.inner.name, Contract::ForeignDocument))
        };
        if let Err(error) = result {
            tracing::error!(message = "list.mount_failed", component = self.inner.name, %error);
        }
    }
}

impl<T: 'static> From<ElList<T>> for Child {
    fn from(list: ElList<T>) -> Self {
        Child::Mount(Rc::new(list))
    }
}
