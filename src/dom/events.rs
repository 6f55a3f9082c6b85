//! Event listeners attached to generated nodes.
//!
//! Listeners are plain data: an [`EventKind`] paired with the [`UiAction`]
//! it triggers. [`super::Document::dispatch`] resolves the action's target
//! by element id at dispatch time.

use serde::Serialize;

/// User interaction a listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Click or tap.
    Click,
    /// Pointer enters the node.
    MouseEnter,
    /// Pointer leaves the node.
    MouseLeave,
}

impl EventKind {
    /// Returns the DOM event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
        }
    }
}

/// Document mutation performed when a listener fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    /// Make the element with this id visible.
    Show {
        /// Target element id.
        target: String,
    },
    /// Hide the element with this id.
    Hide {
        /// Target element id.
        target: String,
    },
    /// Flip the visibility of the element with this id.
    Toggle {
        /// Target element id.
        target: String,
    },
    /// Load `src` into the zoom image `target` and show it.
    Focus {
        /// Zoom image element id.
        target: String,
        /// Image URL to focus.
        src: String,
    },
}

impl UiAction {
    /// Returns the id of the element this action mutates.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Show { target }
            | Self::Hide { target }
            | Self::Toggle { target }
            | Self::Focus { target, .. } => target,
        }
    }
}

/// A listener registered on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listener {
    /// Triggering event.
    pub event: EventKind,
    /// Mutation to apply.
    pub action: UiAction,
}

impl Listener {
    /// Creates a listener.
    #[must_use]
    pub const fn new(event: EventKind, action: UiAction) -> Self {
        Self { event, action }
    }
}
