#![forbid(unsafe_code)]

//! Reconciliation of a mounted node against a freshly rendered one.
//!
//! Both strategies leave the target serializing to the same HTML; they
//! differ in which node identities survive.
//!
//! - [`ReplaceSubtree`] puts the new node where the old one was and discards
//!   the old subtree.
//! - [`PatchInPlace`] keeps the old node and edits it to match the new one,
//!   recursing into children by position. A child whose kind or tag differs
//!   is replaced. The new node is discarded afterwards.
//!
//! In both cases the node that loses is freed from the document.

use crate::NodeId;
use crate::document::{Document, NodeKind};
use crate::error::DomError;

/// Strategy for bringing a mounted node in line with a new render.
pub trait Reconcile {
    /// Reconcile `old` (currently mounted under `target`) with the detached
    /// node `new`. Returns the node mounted afterwards.
    ///
    /// If `old` is no longer a child of `target`, `new` is appended to
    /// `target`.
    fn reconcile(
        &self,
        doc: &Document,
        target: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<NodeId, DomError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Replace the old subtree with the new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceSubtree;

impl Reconcile for ReplaceSubtree {
    fn reconcile(
        &self,
        doc: &Document,
        target: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<NodeId, DomError> {
        if !mounted_under(doc, target, old) {
            doc.append_child(target, new)?;
            return Ok(new);
        }
        replace(doc, target, old, new)?;
        tracing::trace!(message = "dom.reconcile", strategy = self.name(), replaced = 1);
        Ok(new)
    }

    fn name(&self) -> &'static str {
        "replace"
    }
}

/// Patch the old subtree in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchInPlace;

impl Reconcile for PatchInPlace {
    fn reconcile(
        &self,
        doc: &Document,
        target: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<NodeId, DomError> {
        if !mounted_under(doc, target, old) {
            doc.append_child(target, new)?;
            return Ok(new);
        }
        let mut stats = PatchStats::default();
        let mounted = patch(doc, target, old, new, &mut stats)?;
        tracing::trace!(
            message = "dom.reconcile",
            strategy = self.name(),
            patched = stats.patched,
            replaced = stats.replaced,
            appended = stats.appended,
            removed = stats.removed
        );
        Ok(mounted)
    }

    fn name(&self) -> &'static str {
        "patch"
    }
}

#[derive(Debug, Default)]
struct PatchStats {
    patched: usize,
    replaced: usize,
    appended: usize,
    removed: usize,
}

fn mounted_under(doc: &Document, target: NodeId, node: NodeId) -> bool {
    doc.is_live(node) && doc.parent(node).ok().flatten() == Some(target)
}

fn replace(doc: &Document, parent: NodeId, old: NodeId, new: NodeId) -> Result<(), DomError> {
    doc.replace_child(parent, new, old)?;
    doc.discard(old)
}

#[derive(PartialEq, Eq)]
enum Shape {
    Text,
    Element(String),
}

fn shape(doc: &Document, node: NodeId) -> Result<Shape, DomError> {
    doc.with_tree(|tree| {
        Ok(match &tree.node(node)?.kind {
            NodeKind::Text(_) => Shape::Text,
            NodeKind::Element(element) => Shape::Element(element.tag.clone()),
        })
    })
}

fn patch(
    doc: &Document,
    parent: NodeId,
    old: NodeId,
    new: NodeId,
    stats: &mut PatchStats,
) -> Result<NodeId, DomError> {
    let old_shape = shape(doc, old)?;
    if old_shape != shape(doc, new)? {
        replace(doc, parent, old, new)?;
        stats.replaced += 1;
        return Ok(new);
    }

    stats.patched += 1;
    if old_shape == Shape::Text {
        let text = doc.text_content(new)?;
        if doc.text_content(old)? != text {
            doc.set_text_content(old, &text)?;
        }
        doc.discard(new)?;
        return Ok(old);
    }

    doc.copy_element_properties(new, old)?;
    let old_children = doc.children(old)?;
    let new_children = doc.children(new)?;
    for (index, &new_child) in new_children.iter().enumerate() {
        match old_children.get(index) {
            Some(&old_child) => {
                patch(doc, old, old_child, new_child, stats)?;
            }
            None => {
                doc.append_child(old, new_child)?;
                stats.appended += 1;
            }
        }
    }
    for &extra in old_children.iter().skip(new_children.len()) {
        doc.discard(extra)?;
        stats.removed += 1;
    }
    doc.discard(new)?;
    Ok(old)
}
