#![forbid(unsafe_code)]

//! Where a component is mounted.

use oof_dom::{Document, DomError, NodeId};

/// A mount target: one node, or every element a selector matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    Node(NodeId),
    /// Resolved once, in document order. Zero matches is valid.
    Query(String),
}

impl MountTarget {
    /// The target elements.
    ///
    /// Fails for an invalid selector, or when a given node is stale or not an
    /// element.
    pub fn resolve(&self, doc: &Document) -> Result<Vec<NodeId>, DomError> {
        match self {
            Self::Node(node) => {
                if !doc.is_element(*node)? {
                    return Err(DomError::NotAnElement(*node));
                }
                Ok(vec![*node])
            }
            Self::Query(selector) => doc.query_selector_all(selector),
        }
    }
}

impl From<NodeId> for MountTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        Self::Query(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        Self::Query(selector)
    }
}
