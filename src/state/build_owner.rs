//! BuildOwner - batched rebuild scheduler.
//!
//! Components observing state forward their notifications here. Two modes:
//!
//! - Outside a batch, the component is marked pending at once and one repaint
//!   is requested.
//! - Inside a batch (reentrant; nested scopes compose), components are
//!   collected into a dedup set. Leaving the outermost scope marks them all
//!   pending, parents before children, and requests exactly one repaint.
//!
//! The owner is an explicit object shared through `Rc`, not a global.
//!
//! # Example
//!
//! ```ignore
//! let owner = app.owner();
//! owner.batch(|| {
//!     a.set(1);
//!     b.set(2);
//!     c.add(3);
//! }); // one repaint, each affected component rebuilds once
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::observable::Observer;
use crate::engine::WidgetId;

/// Per-component scheduling state, shared with the component itself.
#[derive(Debug)]
pub struct BuildSlot {
    id: WidgetId,
    pending: Cell<bool>,
    depth: Cell<usize>,
}

impl BuildSlot {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    pub fn set_pending(&self, pending: bool) {
        self.pending.set(pending);
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

#[derive(Default)]
pub struct BuildOwner {
    scope_depth: Cell<usize>,
    dirty: RefCell<Vec<WidgetId>>,
    components: RefCell<HashMap<WidgetId, Rc<BuildSlot>>>,
    /// Components marked pending and not yet turned into layout dirt.
    marked: RefCell<Vec<WidgetId>>,
    paint_requests: RefCell<Vec<WidgetId>>,
    repaints: Cell<u64>,
    deferred_repaint: Cell<bool>,
    on_repaint: RefCell<Option<Box<dyn Fn()>>>,
}

impl BuildOwner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every repaint request (the host's redraw trigger).
    pub fn set_repaint_hook(&self, hook: impl Fn() + 'static) {
        *self.on_repaint.borrow_mut() = Some(Box::new(hook));
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a component. Returns its slot (the existing one if already
    /// registered).
    pub fn register(&self, id: WidgetId, depth: usize) -> Rc<BuildSlot> {
        let mut components = self.components.borrow_mut();
        let slot = components.entry(id).or_insert_with(|| {
            Rc::new(BuildSlot {
                id,
                pending: Cell::new(false),
                depth: Cell::new(depth),
            })
        });
        slot.depth.set(depth);
        Rc::clone(slot)
    }

    pub fn unregister(&self, id: WidgetId) {
        self.components.borrow_mut().remove(&id);
        self.dirty.borrow_mut().retain(|&w| w != id);
    }

    pub fn is_registered(&self, id: WidgetId) -> bool {
        self.components.borrow().contains_key(&id)
    }

    /// Keep the depth used for flush ordering current after reparenting.
    pub fn note_depth(&self, id: WidgetId, depth: usize) {
        if let Some(slot) = self.components.borrow().get(&id) {
            slot.depth.set(depth);
        }
    }

    pub fn is_pending(&self, id: WidgetId) -> bool {
        self.components
            .borrow()
            .get(&id)
            .is_some_and(|slot| slot.is_pending())
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    pub fn begin_batch(&self) {
        self.scope_depth.set(self.scope_depth.get() + 1);
    }

    /// Leave a scope. The outermost exit flushes and returns the components it
    /// marked, shallowest first; inner exits return nothing.
    pub fn end_batch(&self) -> Vec<WidgetId> {
        let depth = self.scope_depth.get();
        if depth == 0 {
            return Vec::new();
        }
        self.scope_depth.set(depth - 1);
        if depth > 1 {
            return Vec::new();
        }
        self.flush()
    }

    pub fn in_batch(&self) -> bool {
        self.scope_depth.get() > 0
    }

    /// Run `f` inside a batching scope.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.begin_batch();
        let result = f();
        self.end_batch();
        result
    }

    fn flush(&self) -> Vec<WidgetId> {
        let dirty = std::mem::take(&mut *self.dirty.borrow_mut());
        let mut order: Vec<(usize, WidgetId)> = {
            let components = self.components.borrow();
            dirty
                .into_iter()
                .filter_map(|id| components.get(&id).map(|slot| (slot.depth(), id)))
                .collect()
        };
        // stable: equal depth keeps scheduling order
        order.sort_by_key(|&(depth, _)| depth);
        let order: Vec<WidgetId> = order.into_iter().map(|(_, id)| id).collect();

        for &id in &order {
            self.mark_pending(id);
        }
        let deferred = self.deferred_repaint.replace(false);
        if !order.is_empty() || deferred {
            self.request_repaint();
        }
        debug!(components = order.len(), "build batch flushed");
        order
    }

    // =========================================================================
    // SCHEDULING
    // =========================================================================

    /// A component's observed state changed.
    pub fn schedule_build_for(&self, id: WidgetId) {
        if !self.is_registered(id) {
            return;
        }
        if self.in_batch() {
            let mut dirty = self.dirty.borrow_mut();
            if !dirty.contains(&id) {
                dirty.push(id);
            }
            return;
        }
        self.mark_pending(id);
        self.request_repaint();
    }

    /// A plain widget's observed state changed. Inside a batch the repaint
    /// request is folded into the flush.
    pub fn request_paint(&self, id: WidgetId) {
        {
            let mut requests = self.paint_requests.borrow_mut();
            if !requests.contains(&id) {
                requests.push(id);
            }
        }
        if self.in_batch() {
            self.deferred_repaint.set(true);
        } else {
            self.request_repaint();
        }
    }

    fn mark_pending(&self, id: WidgetId) {
        if let Some(slot) = self.components.borrow().get(&id) {
            slot.set_pending(true);
        }
        let mut marked = self.marked.borrow_mut();
        if !marked.contains(&id) {
            marked.push(id);
        }
        trace!(?id, "component marked for rebuild");
    }

    fn request_repaint(&self) {
        self.repaints.set(self.repaints.get() + 1);
        if let Some(hook) = self.on_repaint.borrow().as_ref() {
            hook();
        }
    }

    /// Number of repaint requests issued so far.
    pub fn repaint_requests(&self) -> u64 {
        self.repaints.get()
    }

    /// Components marked since the last call, in marking order.
    pub fn take_marked(&self) -> Vec<WidgetId> {
        std::mem::take(&mut *self.marked.borrow_mut())
    }

    pub fn take_paint_requests(&self) -> Vec<WidgetId> {
        std::mem::take(&mut *self.paint_requests.borrow_mut())
    }

    pub fn has_work(&self) -> bool {
        !self.marked.borrow().is_empty() || !self.paint_requests.borrow().is_empty()
    }
}

impl fmt::Debug for BuildOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOwner")
            .field("scope_depth", &self.scope_depth.get())
            .field("dirty", &self.dirty.borrow().len())
            .field("components", &self.components.borrow().len())
            .field("repaints", &self.repaints.get())
            .finish()
    }
}

// =============================================================================
// OBSERVERS
// =============================================================================

/// Schedules a component rebuild on notify.
pub struct ComponentObserver {
    id: WidgetId,
    owner: Weak<BuildOwner>,
}

impl ComponentObserver {
    pub fn new(id: WidgetId, owner: Weak<BuildOwner>) -> Self {
        Self { id, owner }
    }
}

impl Observer for ComponentObserver {
    fn on_notify(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.schedule_build_for(self.id);
        }
    }
}

/// Requests a repaint of a plain widget on notify.
pub struct RepaintObserver {
    id: WidgetId,
    owner: Weak<BuildOwner>,
}

impl RepaintObserver {
    pub fn new(id: WidgetId, owner: Weak<BuildOwner>) -> Self {
        Self { id, owner }
    }
}

impl Observer for RepaintObserver {
    fn on_notify(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.request_paint(self.id);
        }
    }
}
