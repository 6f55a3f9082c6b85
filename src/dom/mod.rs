//! Page document model: nodes, listeners and result identifiers.
//!
//! The client never talks to a live browser. Form values are read from and
//! results are rendered into a [`Document`], which can be serialized to
//! HTML once the exchange completes.

pub mod document;
pub mod events;
pub mod ids;

pub use document::{Document, Node, NodeId, escape_html};
pub use events::{EventKind, Listener, UiAction};
pub use ids::ResultId;
