#![forbid(unsafe_code)]

//! In-memory render tree for oof.
//!
//! [`Document`] is a small DOM: element and text nodes with stable
//! [`NodeId`]s, ids, classes and attributes, selector queries, per-node event
//! listeners and HTML serialization. Components render into it through two
//! contracts:
//!
//! - [`Document::node_list`] turns [`Child`] values (text-like primitives,
//!   existing nodes, nested [`Mountable`]s) into nodes.
//! - [`Reconcile`] brings a mounted node in line with a newly rendered one,
//!   either by replacing it ([`ReplaceSubtree`]) or by patching it
//!   ([`PatchInPlace`]).
//!
//! # Example
//!
//! ```
//! use oof_dom::{Document, children};
//!
//! let doc = Document::new();
//! let list = doc.element("ul#todo", &[], children![
//!     doc.element("li.done", &[], children!["write docs"]).unwrap(),
//!     doc.element("li", &[], children!["ship"]).unwrap(),
//! ]).unwrap();
//! doc.append_child(doc.body(), list).unwrap();
//!
//! assert_eq!(doc.query_selector_all("#todo li").unwrap().len(), 2);
//! assert_eq!(
//!     doc.inner_html(doc.body()).unwrap(),
//!     r#"<ul id="todo"><li class="done">write docs</li><li>ship</li></ul>"#
//! );
//! ```

pub mod child;
pub mod document;
pub mod error;
mod html;
pub mod reconcile;
pub mod selector;
pub mod spec;

pub use child::{Child, Mountable};
pub use document::{Document, Event, NodeId};
pub use error::DomError;
pub use reconcile::{PatchInPlace, Reconcile, ReplaceSubtree};
pub use selector::Selector;
pub use spec::TagSpec;
