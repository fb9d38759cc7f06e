#![forbid(unsafe_code)]

//! Coercion of heterogeneous child values into nodes.

use std::fmt;
use std::rc::Rc;

use crate::NodeId;
use crate::document::Document;

/// Something that can render itself into a target element and, if it is
/// reactive, keep that element current afterwards.
///
/// Mounting is infallible from the caller's point of view: implementors
/// report their own failures.
pub trait Mountable {
    fn mount_into(&self, doc: &Document, target: NodeId);
}

/// One child value, before coercion to a node.
#[derive(Clone)]
pub enum Child {
    /// Becomes a text node.
    Text(String),
    /// Used as is.
    Node(NodeId),
    /// Mounted into a fresh `div` wrapper.
    Mount(Rc<dyn Mountable>),
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Mount(_) => f.write_str("Mount(..)"),
        }
    }
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for Child {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl<M: Mountable + 'static> From<Rc<M>> for Child {
    fn from(mountable: Rc<M>) -> Self {
        Self::Mount(mountable)
    }
}

macro_rules! impl_display_child {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_display_child!(char, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Build a `Vec<Child>` from values of mixed types: `children![label, 3, node]`.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {{
        let children: ::std::vec::Vec<$crate::Child> =
            ::std::vec![$($crate::Child::from($child)),*];
        children
    }};
}

impl Document {
    /// Turn child values into detached nodes, in order.
    ///
    /// Text becomes a text node, nodes pass through, and every
    /// [`Mountable`] is mounted into its own new `div`. Never fails.
    pub fn node_list(&self, children: impl IntoIterator<Item = Child>) -> Vec<NodeId> {
        children
            .into_iter()
            .map(|child| match child {
                Child::Text(text) => self.create_text(text),
                Child::Node(node) => node,
                Child::Mount(mountable) => {
                    let wrapper = self.create_element("");
                    mountable.mount_into(self, wrapper);
                    wrapper
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting(&'static str);

    impl Mountable for Greeting {
        fn mount_into(&self, doc: &Document, target: NodeId) {
            let text = doc.create_text(self.0);
            let _ = doc.append_child(target, text);
        }
    }

    #[test]
    fn primitives_become_text() {
        let doc = Document::new();
        let nodes = doc.node_list(children!["a", 1, 2.5, true, 'c', String::from("s")]);
        let texts: Vec<String> = nodes
            .iter()
            .map(|&n| doc.text_content(n).unwrap())
            .collect();
        assert_eq!(texts, ["a", "1", "2.5", "true", "c", "s"]);
        assert!(nodes.iter().all(|&n| !doc.is_element(n).unwrap()));
    }

    #[test]
    fn nodes_pass_through() {
        let doc = Document::new();
        let span = doc.create_element("span");
        assert_eq!(doc.node_list(children![span]), vec![span]);
    }

    #[test]
    fn mountables_get_a_div_wrapper() {
        let doc = Document::new();
        let nodes = doc.node_list(children![Rc::new(Greeting("hi"))]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.outer_html(nodes[0]).unwrap(), "<div>hi</div>");
    }

    #[test]
    fn empty_list() {
        let doc = Document::new();
        assert!(doc.node_list(children![]).is_empty());
    }

    #[test]
    fn element_builds_tree() {
        let doc = Document::new();
        let inner = doc.element("em", &[], children!["x"]).unwrap();
        let outer = doc
            .element("p.note", &[("title", "t")], children!["before ", inner, 2])
            .unwrap();
        assert_eq!(
            doc.outer_html(outer).unwrap(),
            r#"<p class="note" title="t">before <em>x</em>2</p>"#
        );
        assert_eq!(doc.parent(inner).unwrap(), Some(outer));
    }
}
