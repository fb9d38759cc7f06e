#![forbid(unsafe_code)]

//! A small subset of CSS selectors, for resolving mount targets.
//!
//! Supported: type (`li`), universal (`*`), id (`#main`), class (`.item`),
//! compounds of those (`li.item#first`), descendant combinators
//! (`ul .item`) and comma-separated groups (`h1, h2`).

use std::str::FromStr;

use smallvec::SmallVec;

use crate::NodeId;
use crate::document::{NodeKind, Tree};
use crate::error::DomError;
use crate::spec::scan;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    /// `None` matches any tag.
    tag: Option<String>,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each group is a chain of compounds, outermost first.
    groups: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let invalid = |reason| DomError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };

        let mut groups = Vec::new();
        for group in selector.split(',') {
            let chain = group
                .split_whitespace()
                .map(|compound| parse_compound(compound).map_err(invalid))
                .collect::<Result<Vec<_>, _>>()?;
            if chain.is_empty() {
                return Err(invalid("empty selector group"));
            }
            groups.push(chain);
        }
        Ok(Self { groups })
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|chain| matches_chain(tree, node, chain))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_compound(text: &str) -> Result<Compound, &'static str> {
    let parts = scan(text);
    if parts.id.as_deref() == Some("") {
        return Err("empty id");
    }
    if parts.classes.iter().any(String::is_empty) {
        return Err("empty class name");
    }
    let tag = match parts.tag.as_str() {
        "*" => None,
        "" if parts.id.is_none() && parts.classes.is_empty() => return Err("empty compound"),
        "" => None,
        tag if tag.contains(['>', '+', '~', '[', ':']) => return Err("unsupported syntax"),
        tag => Some(tag.to_ascii_lowercase()),
    };
    Ok(Compound {
        tag,
        id: parts.id,
        classes: parts.classes,
    })
}

fn matches_compound(tree: &Tree, node: NodeId, compound: &Compound) -> bool {
    let Some(NodeKind::Element(element)) = tree.nodes.get(node).map(|data| &data.kind) else {
        return false;
    };
    compound
        .tag
        .as_deref()
        .is_none_or(|tag| element.tag.eq_ignore_ascii_case(tag))
        && compound
            .id
            .as_deref()
            .is_none_or(|id| element.id.as_deref() == Some(id))
        && compound
            .classes
            .iter()
            .all(|class| element.classes.iter().any(|c| c == class))
}

/// The last compound must match `node`; each earlier one must match some
/// ancestor, in order. Greedy nearest-ancestor matching is exact for
/// descendant-only chains.
fn matches_chain(tree: &Tree, node: NodeId, chain: &[Compound]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !matches_compound(tree, node, last) {
        return false;
    }
    let mut pending = rest.iter().rev().peekable();
    let mut cursor = tree.parent_of(node);
    while let Some(ancestor) = cursor {
        let Some(compound) = pending.peek() else {
            break;
        };
        if matches_compound(tree, ancestor, compound) {
            pending.next();
        }
        cursor = tree.parent_of(ancestor);
    }
    pending.peek().is_none()
}
