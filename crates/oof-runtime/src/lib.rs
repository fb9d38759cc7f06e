#![forbid(unsafe_code)]

//! Components for oof.
//!
//! - [`El`] / [`ElHandle`]: a component bound to a fixed list of reactive
//!   dependencies. It renders once at mount and again on every dependency
//!   change, reconciling each target with the new node.
//! - [`ElList`]: a list component whose operations patch one child per
//!   target instead of re-rendering the whole list.
//! - [`MountConfig`]: reconciliation strategy, settable from
//!   `OOF_RECONCILER`.
//! - [`Timers`]: a virtual clock for intervals and timeouts.
//!
//! # Example
//!
//! ```
//! use oof_dom::{Document, NodeId, children};
//! use oof_reactive::{Dependencies, Value, deps};
//! use oof_runtime::{El, ElError, ElHandle, RenderCx};
//!
//! struct Counter {
//!     count: Value<i64>,
//! }
//!
//! impl El for Counter {
//!     type Options = i64;
//!
//!     fn init(&mut self, start: i64) -> Dependencies {
//!         self.count.set(start);
//!         deps![self.count]
//!     }
//!
//!     fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
//!         let count: &i64 = cx.get(0)?;
//!         Ok(cx.doc().element("span.count", &[], children![*count])?)
//!     }
//! }
//!
//! let doc = Document::new();
//! let app = doc.create_element("#app");
//! doc.append_child(doc.body(), app).unwrap();
//!
//! let counter = ElHandle::mount(&doc, "#app", Counter { count: Value::new(0) }, 3).unwrap();
//! assert_eq!(doc.text_content(app).unwrap(), "3");
//!
//! counter.with(|c| c.count.update(|n| n.copied().unwrap_or(0) + 1));
//! assert_eq!(doc.text_content(app).unwrap(), "4");
//! ```

pub mod config;
pub mod el;
pub mod error;
pub mod list;
pub mod target;
pub mod timers;

pub use config::{MountConfig, ParseStrategyError, RECONCILER_ENV, ReconcileStrategy};
pub use el::{El, ElHandle, Lifecycle, RenderCx, UpdateReason};
pub use error::{Contract, ElError};
pub use list::{ElList, Item};
pub use target::MountTarget;
pub use timers::{MIN_PERIOD, TimerId, Timers};
