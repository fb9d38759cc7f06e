#![forbid(unsafe_code)]

//! oof public facade crate.
//!
//! Re-exports the reactive graph, the document and the component runtime.
//! Most programs only need the prelude:
//!
//! ```
//! use oof::prelude::*;
//!
//! let doc = Document::new();
//! let name = Value::new("world".to_string());
//! let greeting = Computed::map(&name, |name| format!("hello {name}"));
//! name.set("oof".to_string());
//! assert_eq!(greeting.get().as_deref(), Some("hello oof"));
//! assert!(doc.query_selector("p").unwrap().is_none());
//! ```

pub use oof_dom as dom;
pub use oof_reactive as reactive;
pub use oof_runtime as runtime;

pub mod prelude {
    pub use oof_dom::{Child, Document, Event, Mountable, NodeId, children};
    pub use oof_reactive::{
        AsyncPolicy, Changeable, Computed, Dependencies, Dictionary, Reference, Subscription,
        Value, Values, deps,
    };
    pub use oof_runtime::{
        El, ElError, ElHandle, ElList, Item, Lifecycle, MountConfig, MountTarget,
        ReconcileStrategy, RenderCx, Timers, UpdateReason,
    };

    pub use oof_dom as dom;
    pub use oof_reactive as reactive;
    pub use oof_runtime as runtime;
}
