#![forbid(unsafe_code)]

//! The render tree.
//!
//! A [`Document`] owns an arena of nodes addressed by [`NodeId`]. Every
//! document has a `body` root; nodes created by the `create_*` methods start
//! detached and become part of the page once appended under `body`.
//!
//! # Invariants
//!
//! 1. A node has at most one parent, and appears exactly once in that
//!    parent's child list.
//! 2. The tree is acyclic: inserting a node under itself or one of its
//!    descendants fails with [`DomError::Cycle`].
//! 3. Appending a node that already has a parent moves it.
//! 4. A discarded node and all of its descendants are removed from the
//!    arena; their ids become stale and every operation on them fails with
//!    [`DomError::StaleNode`].
//!
//! No borrow of the arena is held while an event listener runs, so listeners
//! may freely mutate the document.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use indexmap::IndexMap;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::error::DomError;
use crate::selector::Selector;
use crate::spec::TagSpec;

new_key_type! {
    /// Stable handle to a node of a [`Document`].
    pub struct NodeId;
}

/// An event delivered to listeners of a single node. Events do not bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

pub(crate) type Listener = Rc<dyn Fn(&Event)>;

#[derive(Clone)]
pub(crate) struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
    pub attributes: IndexMap<String, String>,
    pub listeners: AHashMap<String, SmallVec<[Listener; 1]>>,
    pub children: SmallVec<[NodeId; 4]>,
}

impl ElementData {
    fn new(spec: TagSpec) -> Self {
        Self {
            tag: spec.tag,
            id: spec.id,
            classes: spec.classes,
            attributes: IndexMap::new(),
            listeners: AHashMap::new(),
            children: SmallVec::new(),
        }
    }
}

#[derive(Clone)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

pub(crate) struct NodeData {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

pub(crate) struct Tree {
    pub nodes: SlotMap<NodeId, NodeData>,
    pub body: NodeId,
}

impl Tree {
    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id).ok_or(DomError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::StaleNode(id))
    }

    pub(crate) fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(node) = cursor {
            if node == candidate {
                return true;
            }
            cursor = self.parent_of(node);
        }
        false
    }

    fn unlink(&mut self, child: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        if let Ok(element) = self.element_mut(parent) {
            element.children.retain(|c| *c != child);
        }
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Insert `child` under `parent` at `index` (clamped), moving it if it is
    /// attached elsewhere.
    fn insert(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        self.unlink(child)?;
        let element = self.element_mut(parent)?;
        let index = index.map_or(element.children.len(), |i| i.min(element.children.len()));
        element.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.element(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let kind = self.node(id)?.kind.clone();
        let children = match &kind {
            NodeKind::Element(element) => element.children.clone(),
            NodeKind::Text(_) => SmallVec::new(),
        };
        let kind = match kind {
            NodeKind::Element(mut element) => {
                element.children.clear();
                NodeKind::Element(element)
            }
            text => text,
        };
        let copy = self.nodes.insert(NodeData { parent: None, kind });
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.insert(copy, child_copy, None)?;
        }
        Ok(copy)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        if let NodeKind::Element(element) = node.kind {
            for child in element.children {
                self.remove_subtree(child);
            }
        }
    }

    pub(crate) fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Ok(element) = self.element(root) {
            for &child in &element.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }
}

/// Shared handle to a render tree.
///
/// Cloning a `Document` creates a new handle to the **same** tree.
#[derive(Clone)]
pub struct Document {
    pub(crate) tree: Rc<RefCell<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .field("body", &tree.body)
            .finish()
    }
}

impl Document {
    /// Create a document holding only an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData::new(TagSpec::parse("body"))),
        });
        Self {
            tree: Rc::new(RefCell::new(Tree { nodes, body })),
        }
    }

    /// The root element.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.tree.borrow().body
    }

    /// Whether both handles point at the same tree.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Number of nodes in the arena, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    // ── Creation ────────────────────────────────────────────────────────

    /// Create a detached element from a tag spec.
    pub fn create_element(&self, spec: &str) -> NodeId {
        let element = ElementData::new(TagSpec::parse(spec));
        self.tree.borrow_mut().nodes.insert(NodeData {
            parent: None,
            kind: NodeKind::Element(element),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.tree.borrow_mut().nodes.insert(NodeData {
            parent: None,
            kind: NodeKind::Text(text.into()),
        })
    }

    /// Create a detached element from a tag spec, set `attrs` on it, and
    /// append `children` after coercing them with
    /// [`node_list`](Self::node_list).
    ///
    /// ```
    /// use oof_dom::{Document, children};
    ///
    /// let doc = Document::new();
    /// let link = doc.element("a#home.nav", &[("href", "/")], children!["Home"]).unwrap();
    /// assert_eq!(doc.outer_html(link).unwrap(), r#"<a id="home" class="nav" href="/">Home</a>"#);
    /// ```
    pub fn element(
        &self,
        spec: &str,
        attrs: &[(&str, &str)],
        children: impl IntoIterator<Item = crate::Child>,
    ) -> Result<NodeId, DomError> {
        let node = self.create_element(spec);
        for (name, value) in attrs {
            self.set_attribute(node, name, *value)?;
        }
        for child in self.node_list(children) {
            self.append_child(node, child)?;
        }
        Ok(node)
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Whether `node` still exists.
    #[must_use]
    pub fn is_live(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes.contains_key(node)
    }

    pub fn is_element(&self, node: NodeId) -> Result<bool, DomError> {
        Ok(matches!(self.tree.borrow().node(node)?.kind, NodeKind::Element(_)))
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.tree.borrow().node(node)?.parent)
    }

    /// Whether `node` is reachable from `body`.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.tree.borrow();
        tree.nodes.contains_key(node) && tree.is_ancestor_or_self(tree.body, node)
    }

    /// Children of `node`. Text nodes have none.
    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        let tree = self.tree.borrow();
        match &tree.node(node)?.kind {
            NodeKind::Element(element) => Ok(element.children.to_vec()),
            NodeKind::Text(_) => Ok(Vec::new()),
        }
    }

    pub fn first_child(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.children(node)?.first().copied())
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.borrow_mut().insert(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let index = match reference {
            Some(reference) if reference == child => return Ok(()),
            Some(reference) => Some(tree.position(parent, reference)?),
            None => None,
        };
        // Moving an earlier sibling shifts the reference left by one.
        let index = index.map(|i| match tree.position(parent, child) {
            Ok(current) if current < i => i - 1,
            _ => i,
        });
        tree.insert(parent, child, index)
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> Result<(), DomError> {
        if new == old {
            return self.tree.borrow().position(parent, old).map(|_| ());
        }
        let mut tree = self.tree.borrow_mut();
        tree.position(parent, old)?;
        tree.node(new)?;
        if tree.is_ancestor_or_self(new, parent) {
            return Err(DomError::Cycle { parent, child: new });
        }
        tree.unlink(new)?;
        let index = tree.position(parent, old)?;
        tree.unlink(old)?;
        tree.insert(parent, new, Some(index))
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        tree.position(parent, child)?;
        tree.unlink(child)
    }

    /// Detach `node` from its parent, if any.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        self.tree.borrow_mut().unlink(node)
    }

    /// Detach `node` and free it together with all its descendants.
    pub fn discard(&self, node: NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        if node == tree.body {
            return Err(DomError::Cycle {
                parent: node,
                child: node,
            });
        }
        tree.unlink(node)?;
        tree.remove_subtree(node);
        Ok(())
    }

    /// Detach and free every child of `node`.
    pub fn clear_children(&self, node: NodeId) -> Result<(), DomError> {
        for child in self.children(node)? {
            self.discard(child)?;
        }
        Ok(())
    }

    /// Copy `node` and its subtree, listeners included. The copy is
    /// detached.
    pub fn deep_clone(&self, node: NodeId) -> Result<NodeId, DomError> {
        self.tree.borrow_mut().clone_subtree(node)
    }

    // ── Element properties ──────────────────────────────────────────────

    pub fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.tree.borrow().element(node)?.tag.clone())
    }

    pub fn id(&self, node: NodeId) -> Result<Option<String>, DomError> {
        Ok(self.tree.borrow().element(node)?.id.clone())
    }

    pub fn set_id(&self, node: NodeId, id: Option<&str>) -> Result<(), DomError> {
        self.tree.borrow_mut().element_mut(node)?.id = id.map(str::to_string);
        Ok(())
    }

    pub fn classes(&self, node: NodeId) -> Result<Vec<String>, DomError> {
        Ok(self.tree.borrow().element(node)?.classes.to_vec())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> Result<bool, DomError> {
        Ok(self.tree.borrow().element(node)?.classes.iter().any(|c| c == class))
    }

    /// Add a class. Adding a class already present is a no-op.
    pub fn add_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        if !class.is_empty() && !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .classes
            .retain(|c| c != class);
        Ok(())
    }

    /// Read an attribute. `id` and `class` read the dedicated properties.
    pub fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let tree = self.tree.borrow();
        let element = tree.element(node)?;
        Ok(match name {
            "id" => element.id.clone(),
            "class" if element.classes.is_empty() => None,
            "class" => Some(element.classes.join(" ")),
            _ => element.attributes.get(name).cloned(),
        })
    }

    /// Set an attribute. `id` and `class` write the dedicated properties.
    pub fn set_attribute(
        &self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let value = value.into();
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        match name {
            "id" => element.id = Some(value),
            "class" => {
                element.classes = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {
                element.attributes.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        match name {
            "id" => element.id = None,
            "class" => element.classes.clear(),
            _ => {
                element.attributes.shift_remove(name);
            }
        }
        Ok(())
    }

    // ── Text ────────────────────────────────────────────────────────────

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        let tree = self.tree.borrow();
        let mut out = String::new();
        collect_text(&tree, node, &mut out)?;
        Ok(out)
    }

    /// Replace the text of a text node, or replace every child of an element
    /// with a single text node.
    pub fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        {
            let mut tree = self.tree.borrow_mut();
            if let NodeKind::Text(current) = &mut tree.node_mut(node)?.kind {
                text.clone_into(current);
                return Ok(());
            }
        }
        self.clear_children(node)?;
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(node, child)?;
        }
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Every element matching `selector`, `body` included, in document
    /// order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        let tree = self.tree.borrow();
        let mut nodes = vec![tree.body];
        tree.descendants(tree.body, &mut nodes);
        Ok(nodes
            .into_iter()
            .filter(|&node| selector.matches(&tree, node))
            .collect())
    }

    /// Every descendant of `root` matching `selector`, in document order.
    pub fn query_selector_all_in(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        let tree = self.tree.borrow();
        tree.node(root)?;
        let mut nodes = Vec::new();
        tree.descendants(root, &mut nodes);
        Ok(nodes
            .into_iter()
            .filter(|&node| selector.matches(&tree, node))
            .collect())
    }

    /// First match of `selector` in document order.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Register `listener` for events named `event` on `node`.
    pub fn on(
        &self,
        node: NodeId,
        event: &str,
        listener: impl Fn(&Event) + 'static,
    ) -> Result<(), DomError> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(Rc::new(listener));
        Ok(())
    }

    /// Number of listeners for `event` on `node`.
    pub fn listener_count(&self, node: NodeId, event: &str) -> Result<usize, DomError> {
        Ok(self
            .tree
            .borrow()
            .element(node)?
            .listeners
            .get(event)
            .map_or(0, SmallVec::len))
    }

    /// Invoke the listeners for `event` registered on `node` itself, in
    /// registration order. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event: &str) -> Result<usize, DomError> {
        let listeners: SmallVec<[Listener; 2]> = self
            .tree
            .borrow()
            .element(node)?
            .listeners
            .get(event)
            .map(|listeners| listeners.iter().cloned().collect())
            .unwrap_or_default();

        let payload = Event {
            name: event.to_string(),
            target: node,
        };
        tracing::trace!(message = "dom.dispatch", event, listeners = listeners.len());
        for listener in &listeners {
            listener(&payload);
        }
        Ok(listeners.len())
    }

    // ── Crate-internal access ───────────────────────────────────────────

    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        f(&self.tree.borrow())
    }

    /// Copy id, classes, attributes and listeners of `from` onto `to`.
    pub(crate) fn copy_element_properties(&self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let source = tree.element(from)?;
        let (id, classes, attributes, listeners) = (
            source.id.clone(),
            source.classes.clone(),
            source.attributes.clone(),
            source.listeners.clone(),
        );
        let target = tree.element_mut(to)?;
        target.id = id;
        target.classes = classes;
        target.attributes = attributes;
        target.listeners = listeners;
        Ok(())
    }
}

fn collect_text(tree: &Tree, node: NodeId, out: &mut String) -> Result<(), DomError> {
    match &tree.node(node)?.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(element) => {
            for &child in &element.children {
                collect_text(tree, child, out)?;
            }
        }
    }
    Ok(())
}
