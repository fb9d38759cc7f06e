#![forbid(unsafe_code)]

//! HTML serialization.

use std::fmt::Write as _;

use crate::NodeId;
use crate::document::{Document, NodeKind, Tree};
use crate::error::DomError;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    /// Serialize `node` and its subtree.
    pub fn outer_html(&self, node: NodeId) -> Result<String, DomError> {
        self.with_tree(|tree| {
            let mut out = String::new();
            write_node(tree, node, &mut out)?;
            Ok(out)
        })
    }

    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> Result<String, DomError> {
        self.with_tree(|tree| {
            let mut out = String::new();
            if let NodeKind::Element(element) = &tree.node(node)?.kind {
                for &child in &element.children {
                    write_node(tree, child, &mut out)?;
                }
            }
            Ok(out)
        })
    }
}

fn write_node(tree: &Tree, node: NodeId, out: &mut String) -> Result<(), DomError> {
    let element = match &tree.node(node)?.kind {
        NodeKind::Text(text) => {
            escape_text(text, out);
            return Ok(());
        }
        NodeKind::Element(element) => element,
    };

    let _ = write!(out, "<{}", element.tag);
    if let Some(id) = &element.id {
        write_attribute(out, "id", id);
    }
    if !element.classes.is_empty() {
        write_attribute(out, "class", &element.classes.join(" "));
    }
    for (name, value) in &element.attributes {
        write_attribute(out, name, value);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
        return Ok(());
    }
    for &child in &element.children {
        write_node(tree, child, out)?;
    }
    let _ = write!(out, "</{}>", element.tag);
    Ok(())
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"");
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
