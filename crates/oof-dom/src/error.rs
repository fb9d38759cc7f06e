use thiserror::Error;

use crate::NodeId;

/// Failure of a structural document operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} is no longer in the document")]
    StaleNode(NodeId),

    #[error("node {0:?} is a text node, not an element")]
    NotAnElement(NodeId),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        selector: String,
        reason: &'static str,
    },
}
