//! Focus order for Tab / Shift+Tab cycling.
//!
//! The order is every focusable widget in depth-first traversal order (not
//! tab-index order). It is rebuilt lazily whenever the tree's structure
//! version moves.

use crate::engine::{Tree, WidgetId};

#[derive(Debug, Default, Clone)]
pub struct FocusOrder {
    order: Vec<WidgetId>,
    version: Option<u64>,
}

impl FocusOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh from the tree if it changed since the last call.
    pub fn sync(&mut self, tree: &Tree) -> &[WidgetId] {
        if self.version != Some(tree.version()) {
            self.order = match tree.root() {
                Some(root) => tree
                    .descendants(root)
                    .into_iter()
                    .filter(|&w| tree.base(w).is_some_and(|b| b.is_focusable()))
                    .collect(),
                None => Vec::new(),
            };
            self.version = Some(tree.version());
        }
        &self.order
    }

    pub fn order(&self) -> &[WidgetId] {
        &self.order
    }

    /// Entry after `current`, wrapping. With no (or an unknown) current
    /// widget, the first entry.
    pub fn next(&self, current: Option<WidgetId>) -> Option<WidgetId> {
        self.step(current, 1)
    }

    /// Entry before `current`, wrapping. With no current widget, the last.
    pub fn previous(&self, current: Option<WidgetId>) -> Option<WidgetId> {
        self.step(current, -1)
    }

    fn step(&self, current: Option<WidgetId>, direction: isize) -> Option<WidgetId> {
        let len = self.order.len();
        if len == 0 {
            return None;
        }
        let index = current.and_then(|c| self.order.iter().position(|&w| w == c));
        let target = match (index, direction > 0) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.order.get(target).copied()
    }
}
