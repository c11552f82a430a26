//! Component - a widget whose single child comes from a `view` function.
//!
//! The view runs again whenever the component is marked pending by the
//! [`BuildOwner`](super::BuildOwner) (one of its watched states changed) or has
//! no child yet. Inside the view, [`BuildCx::cached`] reuses widgets from the
//! previous build whose item compares equal, so stateful widgets (an open text
//! field, a scrolled list) survive rebuilds of their surroundings.
//!
//! Rebuild order:
//! 1. remember the tab index of the focused widget if it lives below us
//! 2. run the view; reused widgets are protected from teardown
//! 3. install the new child, then tear down the old tree and released widgets
//! 4. move focus to the widget now carrying the remembered tab index, without
//!    firing its `focus` hook
//!
//! # Example
//!
//! ```ignore
//! let todos = State::new(vec!["milk".to_string(), "eggs".to_string()]);
//! let list = todos.clone();
//! let component = tree.insert(
//!     Component::new(move |cx| {
//!         cx.watch(&list);
//!         let rows = cx.cached(&list.get(), |tree, text| {
//!             tree.insert(Label::new(text), Props::content())
//!         });
//!         cx.insert_layout(Linear::column(), Props::expanding(), &rows)
//!     }),
//!     Props::expanding(),
//! );
//! ```

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use super::build_owner::BuildSlot;
use super::observable::State;
use crate::engine::{
    EventCx, LayoutCx, MeasureCx, Props, Tree, Widget, WidgetBase, WidgetId,
};
use crate::layout::fit_child;
use crate::types::{Size, size};

type ViewFn = Box<dyn FnMut(&mut BuildCx<'_>) -> WidgetId>;

/// Items and widgets of one `cached` call site.
struct CacheSlot {
    items: Box<dyn Any>,
    widgets: Vec<WidgetId>,
}

// =============================================================================
// BUILD CONTEXT
// =============================================================================

/// Handed to the view function during a rebuild.
pub struct BuildCx<'a> {
    tree: &'a mut Tree,
    component: WidgetId,
    previous: Vec<CacheSlot>,
    next: Vec<CacheSlot>,
    released: Vec<WidgetId>,
    reused: Vec<WidgetId>,
}

impl BuildCx<'_> {
    pub fn tree(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    /// The component being rebuilt.
    pub fn id(&self) -> WidgetId {
        self.component
    }

    pub fn insert(&mut self, widget: impl Widget + 'static, props: Props) -> WidgetId {
        self.tree.insert(widget, props)
    }

    pub fn insert_layout(
        &mut self,
        widget: impl Widget + 'static,
        props: Props,
        children: &[WidgetId],
    ) -> WidgetId {
        self.tree.insert_layout(widget, props, children)
    }

    /// Rebuild the component whenever `state` changes.
    pub fn watch<T: Clone + PartialEq + 'static>(&mut self, state: &State<T>) {
        self.tree.observe(self.component, state);
    }

    /// One widget per item, reusing the previous build's widget for any item
    /// equal to a previous one. Call sites are matched by call order, so the
    /// view must call `cached` the same number of times on every build.
    pub fn cached<T: PartialEq + Clone + 'static>(
        &mut self,
        items: &[T],
        mut build: impl FnMut(&mut Tree, &T) -> WidgetId,
    ) -> Vec<WidgetId> {
        let index = self.next.len();
        let (old_items, old_widgets) = match self.previous.get_mut(index) {
            Some(slot) => match slot.items.downcast_ref::<Vec<T>>() {
                Some(items) => (items.clone(), std::mem::take(&mut slot.widgets)),
                // item type changed at this call site; the slot is released whole
                None => (Vec::new(), Vec::new()),
            },
            None => (Vec::new(), Vec::new()),
        };

        let mut used = vec![false; old_items.len()];
        let mut widgets = Vec::with_capacity(items.len());
        for item in items {
            let hit = old_items.iter().enumerate().position(|(i, old)| {
                !used[i] && old == item && self.tree.contains(old_widgets[i])
            });
            match hit {
                Some(i) => {
                    used[i] = true;
                    let widget = old_widgets[i];
                    self.tree.protect(widget);
                    self.reused.push(widget);
                    widgets.push(widget);
                }
                None => widgets.push(build(&mut *self.tree, item)),
            }
        }
        self.released.extend(
            old_widgets
                .into_iter()
                .enumerate()
                .filter(|&(i, _)| !used[i])
                .map(|(_, w)| w),
        );

        self.next.push(CacheSlot {
            items: Box::new(items.to_vec()),
            widgets: widgets.clone(),
        });
        widgets
    }
}

// =============================================================================
// COMPONENT
// =============================================================================

pub struct Component {
    view: ViewFn,
    slots: Vec<CacheSlot>,
    build: Option<Rc<BuildSlot>>,
    child: Option<WidgetId>,
    rebuilds: u64,
}

impl Component {
    pub fn new(view: impl FnMut(&mut BuildCx<'_>) -> WidgetId + 'static) -> Self {
        Self {
            view: Box::new(view),
            slots: Vec::new(),
            build: None,
            child: None,
            rebuilds: 0,
        }
    }

    pub fn child(&self) -> Option<WidgetId> {
        self.child
    }

    /// Completed view runs.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn is_pending(&self) -> bool {
        self.build.as_ref().is_some_and(|slot| slot.is_pending())
    }

    fn rebuild(&mut self, tree: &mut Tree, id: WidgetId) {
        let saved_tab = tree
            .interaction()
            .focused
            .filter(|&f| f != id && tree.is_descendant(id, f))
            .and_then(|f| tree.base(f).and_then(WidgetBase::tab_index));

        let mut cx = BuildCx {
            tree,
            component: id,
            previous: std::mem::take(&mut self.slots),
            next: Vec::new(),
            released: Vec::new(),
            reused: Vec::new(),
        };
        let child = (self.view)(&mut cx);
        let BuildCx {
            tree,
            previous,
            next,
            mut released,
            reused,
            ..
        } = cx;
        for slot in previous {
            released.extend(slot.widgets);
        }
        self.slots = next;

        let old = self.child.replace(child);
        if old != Some(child) {
            tree.add_child(id, child);
            if let Some(old) = old {
                tree.teardown(old);
            }
        }
        for widget in released {
            if !tree.is_protected(widget) {
                tree.teardown(widget);
            }
        }
        tree.unprotect_all();
        // reused by the view but not placed anywhere
        for widget in reused {
            if widget != child && tree.contains(widget) && tree.parent(widget).is_none() {
                tree.teardown(widget);
            }
        }

        if let Some(tab) = saved_tab {
            let kept = tree
                .interaction()
                .focused
                .is_some_and(|f| tree.is_descendant(id, f));
            if !kept {
                if let Some(target) = tree.find_by_tab_index(id, tab) {
                    tree.interaction_mut().focused = Some(target);
                    tree.mark_paint_dirty(target);
                    debug!(?target, tab, "focus restored after rebuild");
                }
            }
        }

        if let Some(slot) = &self.build {
            slot.set_pending(false);
        }
        self.rebuilds += 1;
        debug!(?id, rebuilds = self.rebuilds, "component rebuilt");
    }
}

impl Widget for Component {
    fn measure(&self, cx: &MeasureCx<'_>) -> Size {
        let padding = cx.base().map(WidgetBase::padding);
        let inner = cx
            .children()
            .first()
            .map_or(size(0.0, 0.0), |&child| cx.measure(child));
        match padding {
            Some(p) => size(
                inner.width + p.left + p.right,
                inner.height + p.top + p.bottom,
            ),
            None => inner,
        }
    }

    fn layout(&mut self, cx: &mut LayoutCx<'_>) {
        let id = cx.id();
        if self.is_pending() || self.child.is_none() {
            self.rebuild(cx.tree(), id);
        }
        let Some(content) = cx.base().map(WidgetBase::content_rect) else {
            return;
        };
        if let Some(child) = self.child {
            fit_child(cx, child, content, true);
        }
    }

    fn on_mount(&mut self, cx: &mut EventCx<'_>) {
        let id = cx.id();
        let depth = cx.base().map_or(0, WidgetBase::depth);
        let owner = Rc::clone(cx.tree().owner());
        let slot = owner.register(id, depth);
        // remounted: detach dropped our subscriptions, so run the view again
        if self.child.is_some() {
            slot.set_pending(true);
            cx.request_layout();
        }
        self.build = Some(slot);
    }

    fn on_unmount(&mut self, _cx: &mut EventCx<'_>) {
        self.build = None;
    }
}
