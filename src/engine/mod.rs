//! Widget engine - arena tree, dirty tracking and the redraw pipeline.
//!
//! The engine manages the core data structures:
//! - Tree: generational arena of widgets, parent/child links, interaction refs
//! - RenderNode: per-widget dirty flags and memoized child z-order
//! - Widget: the hook trait every node implements, plus its `WidgetBase`
//! - Contexts: what a hook may touch while it runs
//!
//! # Architecture
//!
//! Widgets are NOT linked objects. They live in one arena and refer to each
//! other through [`WidgetId`] handles:
//!
//! ```text
//! root (Linear)  ── children: [title, list]
//!   title (Label)  parent=root, pos=(0,0)   size=(80,1)
//!   list  (Linear) parent=root, pos=(0,1)   size=(80,23) ── children: [...]
//! ```
//!
//! A handle to a removed widget stays harmless: every lookup returns `None`.

mod context;
mod render_node;
mod tree;
mod widget;

pub use context::*;
pub use render_node::*;
pub use tree::*;
pub use widget::*;

slotmap::new_key_type! {
    /// Generational handle to a widget in a [`Tree`].
    pub struct WidgetId;
}
