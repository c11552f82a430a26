//! Tree - the widget arena.
//!
//! Owns every widget, its [`WidgetBase`] and its lazily created
//! [`RenderNode`]. All structural and geometric mutation goes through here so
//! that dirty flags stay consistent:
//!
//! - a widget marked dirty sets `SUBTREE` on each ancestor, stopping at the
//!   first one that already has it
//! - `move_to` / `resize` are no-ops when the value is unchanged
//! - changing a z-index invalidates the parent's paint order
//!
//! # Redraw
//!
//! [`Tree::redraw`] runs, per visited widget: layout, own paint if dirty (or
//! forced), then dirty children in z order (culled against the widget's own
//! bounds), then the overlay. With a painter that has a
//! [`SceneCache`](crate::paint::SceneCache), clean children are replayed from
//! their recorded scene instead of being redrawn.

use std::collections::HashSet;
use std::rc::Rc;

use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use super::context::{EventCx, LayoutCx, MeasureCx, PaintCx};
use super::render_node::RenderNode;
use super::widget::{Props, Widget, WidgetBase};
use super::WidgetId;
use crate::event::MouseButton;
use crate::paint::Painter;
use crate::state::{BuildOwner, ComponentObserver, Observer, ObserverList, RepaintObserver, State};
use crate::types::{Insets, Point, Rect, Size, SizePolicy, point, size};

struct Node {
    base: WidgetBase,
    render: Option<RenderNode>,
    widget: Option<Box<dyn Widget>>,
}

// =============================================================================
// INTERACTION / STATS
// =============================================================================

/// Widgets currently pressed, focused and hovered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    pub pressed: Option<WidgetId>,
    pub pressed_button: Option<MouseButton>,
    pub focused: Option<WidgetId>,
    pub hovered: Option<WidgetId>,
    /// Last cursor position in root coordinates.
    pub last_cursor: Option<Point>,
}

impl Interaction {
    fn forget(&mut self, id: WidgetId) {
        if self.pressed == Some(id) {
            self.pressed = None;
            self.pressed_button = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }
}

/// Counters for profiling and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Ancestors visited while propagating `SUBTREE`.
    pub propagation_steps: u64,
    /// Widgets visited by the redraw walk.
    pub redraws: u64,
    /// Children skipped because they lie outside their parent.
    pub culled: u64,
    /// Children replayed from a recorded scene.
    pub scene_hits: u64,
}

// =============================================================================
// TREE
// =============================================================================

pub struct Tree {
    nodes: SlotMap<WidgetId, Node>,
    root: Option<WidgetId>,
    owner: Rc<BuildOwner>,
    interaction: Interaction,
    protected: HashSet<WidgetId>,
    animating: Vec<WidgetId>,
    freed: Vec<WidgetId>,
    stats: TreeStats,
    version: u64,
    /// Widget whose `layout` hook is running. It repaints its subtree in the
    /// same pass, so dirt raised below it stops there.
    laying_out: Option<WidgetId>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(Rc::new(BuildOwner::new()))
    }
}

impl Tree {
    pub fn new(owner: Rc<BuildOwner>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            owner,
            interaction: Interaction::default(),
            protected: HashSet::new(),
            animating: Vec::new(),
            freed: Vec::new(),
            stats: TreeStats::default(),
            version: 0,
            laying_out: None,
        }
    }

    pub fn owner(&self) -> &Rc<BuildOwner> {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TreeStats::default();
    }

    /// Bumped on every structural change (attach, detach, focusability).
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut Interaction {
        &mut self.interaction
    }

    // =========================================================================
    // INSERTION / ROOT
    // =========================================================================

    /// Add a detached widget to the arena.
    pub fn insert(&mut self, widget: impl Widget + 'static, props: Props) -> WidgetId {
        self.insert_boxed(Box::new(widget), props)
    }

    pub fn insert_boxed(&mut self, widget: Box<dyn Widget>, props: Props) -> WidgetId {
        let id = self.nodes.insert(Node {
            base: WidgetBase::from_props(props),
            render: None,
            widget: Some(widget),
        });
        trace!(?id, "widget inserted");
        id
    }

    /// Insert a container and attach `children` to it in order.
    pub fn insert_layout(
        &mut self,
        widget: impl Widget + 'static,
        props: Props,
        children: &[WidgetId],
    ) -> WidgetId {
        let id = self.insert(widget, props);
        for &child in children {
            self.add_child(id, child);
        }
        id
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    /// Make `id` the root. The previous root is detached but stays alive.
    pub fn set_root(&mut self, id: WidgetId) {
        if !self.contains(id) || self.root == Some(id) {
            return;
        }
        if let Some(old) = self.root.take() {
            self.detach(old);
        }
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
        self.set_depth(id, 0);
        self.root = Some(id);
        self.version += 1;
        self.mount_subtree(id);
        self.mark_layout_dirty(id);
        debug!(?id, "root set");
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    pub fn base(&self, id: WidgetId) -> Option<&WidgetBase> {
        self.nodes.get(id).map(|n| &n.base)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|n| n.base.parent)
    }

    /// Children in insertion order.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.nodes
            .get(id)
            .and_then(|n| n.render.as_ref())
            .map_or(&[][..], RenderNode::children)
    }

    pub fn render_node(&self, id: WidgetId) -> Option<&RenderNode> {
        self.nodes.get(id).and_then(|n| n.render.as_ref())
    }

    fn render_mut(&mut self, id: WidgetId) -> Option<&mut RenderNode> {
        self.nodes
            .get_mut(id)
            .map(|n| n.render.get_or_insert_with(RenderNode::new))
    }

    /// Never-painted widgets have no render node and count as dirty.
    pub fn is_dirty(&self, id: WidgetId) -> bool {
        self.render_node(id).is_none_or(RenderNode::is_dirty)
    }

    pub fn is_paint_dirty(&self, id: WidgetId) -> bool {
        self.render_node(id).is_none_or(RenderNode::is_paint_dirty)
    }

    pub fn is_layout_dirty(&self, id: WidgetId) -> bool {
        self.render_node(id).is_none_or(RenderNode::is_layout_dirty)
    }

    pub fn accepts_text_input(&self, id: WidgetId) -> bool {
        self.nodes
            .get(id)
            .and_then(|n| n.widget.as_deref())
            .is_some_and(|w| w.accepts_text_input())
    }

    pub fn widget_ref<T: Widget + 'static>(&self, id: WidgetId) -> Option<&T> {
        self.nodes
            .get(id)?
            .widget
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn widget_mut<T: Widget + 'static>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.nodes
            .get_mut(id)?
            .widget
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Run `f` on a concrete widget with an event context for it.
    pub fn with_widget<T: Widget + 'static, R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut T, &mut EventCx<'_>) -> R,
    ) -> Option<R> {
        self.with_hook(id, |widget, cx| {
            widget.as_any_mut().downcast_mut::<T>().map(|w| f(w, cx))
        })
        .flatten()
    }

    /// Lift the widget out of its slot and run a hook on it.
    ///
    /// Returns `None` for a dead id or a widget already lifted (re-entrant
    /// call from its own hook).
    pub fn with_hook<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut EventCx<'_>) -> R,
    ) -> Option<R> {
        let mut widget = self.take_widget(id)?;
        let result = {
            let mut cx = EventCx { tree: self, id };
            f(widget.as_mut(), &mut cx)
        };
        self.restore_widget(id, widget);
        Some(result)
    }

    fn take_widget(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        self.nodes.get_mut(id)?.widget.take()
    }

    fn restore_widget(&mut self, id: WidgetId, widget: Box<dyn Widget>) {
        // the hook may have freed its own widget; it is dropped here then
        if let Some(node) = self.nodes.get_mut(id) {
            node.widget = Some(widget);
        }
    }

    // =========================================================================
    // STRUCTURE
    // =========================================================================

    /// Attach `child` under `parent`, moving it from its old parent if any.
    ///
    /// Mounts the subtree on first attach and reports it through
    /// [`Widget::on_child_added`]. Refuses to create a cycle.
    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            warn!(?parent, ?child, "add_child ignored: invalid ids");
            return;
        }
        if self.is_descendant(child, parent) {
            warn!(?parent, ?child, "add_child ignored: would create a cycle");
            return;
        }
        let old = self.parent(child);
        if old == Some(parent) {
            return;
        }
        if let Some(old) = old {
            self.unlink(old, child);
        }
        if self.root == Some(child) {
            self.root = None;
        }

        if let Some(render) = self.render_mut(parent) {
            render.push_child(child);
        }
        let depth = self.base(parent).map_or(0, |b| b.depth + 1);
        if let Some(node) = self.nodes.get_mut(child) {
            node.base.parent = Some(parent);
        }
        self.set_depth(child, depth);
        self.version += 1;

        self.mount_subtree(child);
        self.with_hook(parent, |w, cx| w.on_child_added(cx, child));

        if let Some(render) = self.render_mut(parent) {
            render.mark_subtree_dirty();
        }
        self.mark_layout_dirty(parent);
    }

    /// Detach `child` from `parent` without unmounting it. Returns `false` if
    /// `child` was not a child of `parent`.
    pub fn remove_child(&mut self, parent: WidgetId, child: WidgetId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.unlink(parent, child);
        true
    }

    fn unlink(&mut self, parent: WidgetId, child: WidgetId) {
        if let Some(render) = self.nodes.get_mut(parent).and_then(|n| n.render.as_mut()) {
            render.remove_child(child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.base.parent = None;
        }
        self.version += 1;
        self.mark_layout_dirty(parent);
    }

    fn set_depth(&mut self, id: WidgetId, depth: usize) {
        let mut stack = vec![(id, depth)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.base.depth = depth;
            self.owner.note_depth(id, depth);
            stack.extend(self.children(id).iter().map(|&c| (c, depth + 1)));
        }
    }

    fn mount_subtree(&mut self, id: WidgetId) {
        let pending: Vec<WidgetId> = self
            .descendants(id)
            .into_iter()
            .filter(|&w| self.base(w).is_some_and(|b| !b.mounted))
            .collect();
        for w in pending {
            if let Some(node) = self.nodes.get_mut(w) {
                node.base.mounted = true;
            }
            self.with_hook(w, |widget, cx| widget.on_mount(cx));
        }
    }

    /// Pre-order walk that does not enter protected widgets.
    fn collect_unprotected(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(w) = stack.pop() {
            if self.protected.contains(&w) {
                continue;
            }
            out.push(w);
            stack.extend(self.children(w).iter().rev().copied());
        }
        out
    }

    /// Children first, so a container still sees its children while
    /// unmounting.
    fn unmount_all(&mut self, doomed: &[WidgetId]) {
        for &w in doomed.iter().rev() {
            let Some(node) = self.nodes.get_mut(w) else {
                continue;
            };
            let was_mounted = std::mem::replace(&mut node.base.mounted, false);
            let subscriptions = std::mem::take(&mut node.base.subscriptions);
            for list in subscriptions {
                list.unsubscribe(w);
            }
            if was_mounted {
                self.with_hook(w, |widget, cx| widget.on_unmount(cx));
            }
            self.interaction.forget(w);
            self.animating.retain(|&a| a != w);
            self.owner.unregister(w);
        }
    }

    /// Remove a subtree from its parent and unmount it. Widgets stay in the
    /// arena and can be attached again.
    pub fn detach(&mut self, id: WidgetId) {
        if !self.contains(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        let doomed = self.collect_unprotected(id);
        self.unmount_all(&doomed);
    }

    /// Detach and free a subtree. Protected widgets (reused by a rebuild in
    /// progress) are cut loose instead of freed.
    pub fn teardown(&mut self, id: WidgetId) {
        if !self.contains(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
        if self.protected.contains(&id) {
            return;
        }
        if self.root == Some(id) {
            self.root = None;
        }
        let doomed = self.collect_unprotected(id);
        // protected widgets inside the subtree must not keep a dead parent
        let mut cut = Vec::new();
        for &w in &doomed {
            for &c in self.children(w) {
                if self.protected.contains(&c) {
                    cut.push((w, c));
                }
            }
        }
        for (parent, child) in cut {
            self.unlink(parent, child);
        }
        self.unmount_all(&doomed);
        for w in &doomed {
            self.nodes.remove(*w);
        }
        self.freed.extend_from_slice(&doomed);
        self.version += 1;
        debug!(?id, freed = doomed.len(), "subtree torn down");
    }

    /// Ids freed since the last call, for dropping cached scenes.
    pub fn take_freed(&mut self) -> Vec<WidgetId> {
        std::mem::take(&mut self.freed)
    }

    pub fn protect(&mut self, id: WidgetId) {
        self.protected.insert(id);
    }

    pub fn is_protected(&self, id: WidgetId) -> bool {
        self.protected.contains(&id)
    }

    pub fn unprotect_all(&mut self) {
        self.protected.clear();
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// No-op if unchanged. Otherwise the widget and its parent repaint.
    pub fn move_to(&mut self, id: WidgetId, pos: Point) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.pos == pos {
            return;
        }
        node.base.pos = pos;
        let parent = node.base.parent;
        self.mark_paint_dirty(id);
        if let Some(parent) = parent {
            self.mark_paint_dirty(parent);
        }
    }

    /// No-op if unchanged. Otherwise the widget re-lays out and its parent
    /// repaints.
    pub fn resize(&mut self, id: WidgetId, new_size: Size) {
        let new_size = size(new_size.width.max(0.0), new_size.height.max(0.0));
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.size == new_size {
            return;
        }
        node.base.size = new_size;
        let parent = node.base.parent;
        self.mark_layout_dirty(id);
        if let Some(parent) = parent {
            self.mark_paint_dirty(parent);
        }
    }

    pub fn set_z_index(&mut self, id: WidgetId, z_index: i32) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.z_index == z_index {
            return;
        }
        node.base.z_index = z_index;
        let Some(parent) = node.base.parent else {
            return;
        };
        if let Some(render) = self.render_mut(parent) {
            render.invalidate_order();
        }
        self.mark_paint_dirty(parent);
    }

    /// Policy changes force the parent to redistribute space.
    pub fn set_policy(&mut self, id: WidgetId, width: SizePolicy, height: SizePolicy) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.width_policy == width && node.base.height_policy == height {
            return;
        }
        node.base.width_policy = width;
        node.base.height_policy = height;
        self.relayout_with_parent(id);
    }

    pub fn set_flex(&mut self, id: WidgetId, flex: f32) {
        let flex = flex.max(0.0);
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.flex == flex {
            return;
        }
        node.base.flex = flex;
        self.relayout_with_parent(id);
    }

    pub fn set_padding(&mut self, id: WidgetId, padding: Insets) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.base.padding == padding {
            return;
        }
        node.base.padding = padding;
        self.relayout_with_parent(id);
    }

    fn relayout_with_parent(&mut self, id: WidgetId) {
        self.mark_layout_dirty(id);
        if let Some(parent) = self.parent(id) {
            self.mark_layout_dirty(parent);
        }
    }

    pub fn set_tab_index(&mut self, id: WidgetId, tab_index: Option<u32>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.base.tab_index = tab_index;
            self.version += 1;
        }
    }

    pub fn set_focusable(&mut self, id: WidgetId, focusable: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.base.focusable = focusable;
            self.version += 1;
        }
    }

    // =========================================================================
    // DIRTY TRACKING
    // =========================================================================

    pub fn mark_layout_dirty(&mut self, id: WidgetId) {
        let Some(render) = self.render_mut(id) else {
            return;
        };
        render.mark_layout_dirty();
        if self.laying_out != Some(id) {
            self.propagate(self.parent(id));
        }
    }

    pub fn mark_paint_dirty(&mut self, id: WidgetId) {
        let Some(render) = self.render_mut(id) else {
            return;
        };
        render.mark_paint_dirty();
        if self.laying_out != Some(id) {
            self.propagate(self.parent(id));
        }
    }

    /// Set `SUBTREE` upwards until an ancestor already has it, or up to the
    /// widget currently laying out.
    ///
    /// An ancestor without a render node has never been painted, so its own
    /// ancestors were marked when it was attached.
    fn propagate(&mut self, mut cursor: Option<WidgetId>) {
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get_mut(id) else {
                break;
            };
            self.stats.propagation_steps += 1;
            let newly = node
                .render
                .get_or_insert_with(RenderNode::new)
                .mark_subtree_dirty();
            if !newly || self.laying_out == Some(id) {
                break;
            }
            cursor = node.base.parent;
        }
    }

    pub fn clear_dirty(&mut self, id: WidgetId) {
        if let Some(render) = self.render_mut(id) {
            render.clear_dirty();
        }
    }

    /// Ask for [`Widget::tick`] calls on the next animation frames.
    pub fn request_animation(&mut self, id: WidgetId) {
        if self.contains(id) && !self.animating.contains(&id) {
            self.animating.push(id);
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.animating.is_empty()
    }

    pub fn take_animating(&mut self) -> Vec<WidgetId> {
        std::mem::take(&mut self.animating)
    }

    /// Turn scheduled rebuilds and repaint requests into dirty flags.
    pub fn apply_scheduled(&mut self) {
        for id in self.owner.take_marked() {
            self.mark_layout_dirty(id);
        }
        for id in self.owner.take_paint_requests() {
            self.mark_paint_dirty(id);
        }
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    /// Subscribe `id` to `state`. Components registered with the build owner
    /// get scheduled for rebuild, everything else just repaints. The
    /// subscription is dropped when the widget unmounts.
    pub fn observe<T: Clone + PartialEq + 'static>(&mut self, id: WidgetId, state: &State<T>) {
        self.observe_list(id, state.observers());
    }

    pub fn observe_list(&mut self, id: WidgetId, list: &Rc<ObserverList>) {
        if !self.contains(id) {
            return;
        }
        let owner = Rc::downgrade(&self.owner);
        let observer: Rc<dyn Observer> = if self.owner.is_registered(id) {
            Rc::new(ComponentObserver::new(id, owner))
        } else {
            Rc::new(RepaintObserver::new(id, owner))
        };
        list.subscribe(id, observer);
        if let Some(node) = self.nodes.get_mut(id) {
            if !node.base.subscriptions.iter().any(|l| Rc::ptr_eq(l, list)) {
                node.base.subscriptions.push(Rc::clone(list));
            }
        }
    }

    // =========================================================================
    // TRAVERSAL / COORDINATES
    // =========================================================================

    /// Pre-order depth-first walk including `id`.
    pub fn descendants(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(w) = stack.pop() {
            out.push(w);
            stack.extend(self.children(w).iter().rev().copied());
        }
        out
    }

    /// `true` if `id` is `ancestor` or lies below it.
    pub fn is_descendant(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cursor = Some(id);
        while let Some(w) = cursor {
            if w == ancestor {
                return true;
            }
            cursor = self.parent(w);
        }
        false
    }

    /// First focusable widget under `root` carrying `tab_index`.
    pub fn find_by_tab_index(&self, root: WidgetId, tab_index: u32) -> Option<WidgetId> {
        self.descendants(root).into_iter().find(|&w| {
            self.base(w)
                .is_some_and(|b| b.focusable && b.tab_index == Some(tab_index))
        })
    }

    /// Top-left corner in root coordinates.
    pub fn absolute_origin(&self, id: WidgetId) -> Point {
        let mut origin = point(0.0, 0.0);
        let mut cursor = Some(id);
        while let Some(w) = cursor {
            let Some(base) = self.base(w) else {
                break;
            };
            origin.x += base.pos.x;
            origin.y += base.pos.y;
            cursor = base.parent;
        }
        origin
    }

    pub fn absolute_rect(&self, id: WidgetId) -> Rect {
        let size = self.base(id).map_or(size(0.0, 0.0), WidgetBase::size);
        Rect::from_origin_size(self.absolute_origin(id), size)
    }

    /// Root coordinates to `id`'s local space.
    pub fn to_local(&self, id: WidgetId, p: Point) -> Point {
        let origin = self.absolute_origin(id);
        point(p.x - origin.x, p.y - origin.y)
    }

    // =========================================================================
    // HIT TESTING
    // =========================================================================

    /// `p` in parent coordinates.
    pub fn contain(&self, id: WidgetId, p: Point) -> bool {
        self.base(id).is_some_and(|b| b.contain(p))
    }

    /// Children background to foreground.
    pub fn paint_order(&mut self, id: WidgetId) -> Vec<WidgetId> {
        let Some(mut render) = self.nodes.get_mut(id).and_then(|n| n.render.take()) else {
            return Vec::new();
        };
        let order = {
            let nodes = &self.nodes;
            render
                .sorted_children(|c| nodes.get(c).map_or(0, |n| n.base.z_index))
                .to_vec()
        };
        if let Some(node) = self.nodes.get_mut(id) {
            node.render = Some(render);
        }
        order
    }

    /// Children foreground to background.
    pub fn hit_order(&mut self, id: WidgetId) -> Vec<WidgetId> {
        let mut order = self.paint_order(id);
        order.reverse();
        order
    }

    /// Deepest widget under `p` (parent coordinates of `id`), with the point
    /// in that widget's local space.
    ///
    /// Children are clipped to their parent: nothing outside `id` is hit.
    pub fn dispatch(&mut self, id: WidgetId, p: Point) -> Option<(WidgetId, Point)> {
        let node = self.nodes.get(id)?;
        if !node.base.contain(p) {
            return None;
        }
        let local = point(p.x - node.base.pos.x, p.y - node.base.pos.y);
        let intercepted = node
            .widget
            .as_deref()
            .is_some_and(|w| w.intercepts(&node.base, local));
        if intercepted {
            return Some((id, local));
        }
        for child in self.hit_order(id) {
            if let Some(hit) = self.dispatch(child, local) {
                return Some(hit);
            }
        }
        Some((id, local))
    }

    // =========================================================================
    // MEASURE
    // =========================================================================

    /// Size request honouring the size policy: `Fixed` axes report the
    /// explicit size, the others ask the widget. Leaf results are memoized
    /// until the widget is marked layout dirty.
    pub fn measure(&self, id: WidgetId, painter: &dyn Painter) -> Size {
        let Some(node) = self.nodes.get(id) else {
            return size(0.0, 0.0);
        };
        let base = &node.base;
        let fixed_w = base.width_policy == SizePolicy::Fixed;
        let fixed_h = base.height_policy == SizePolicy::Fixed;
        if fixed_w && fixed_h {
            return base.size;
        }
        let content = self.content_size(id, node, painter);
        size(
            if fixed_w { base.size.width } else { content.width },
            if fixed_h { base.size.height } else { content.height },
        )
    }

    fn content_size(&self, id: WidgetId, node: &Node, painter: &dyn Painter) -> Size {
        let leaf = node.render.as_ref().is_none_or(|r| !r.has_children());
        if leaf {
            if let Some(cached) = node.render.as_ref().and_then(RenderNode::cached_measure) {
                return cached;
            }
        }
        let Some(widget) = node.widget.as_deref() else {
            return node.base.size;
        };
        let measured = widget.measure(&MeasureCx {
            tree: self,
            id,
            painter,
        });
        if leaf {
            if let Some(render) = node.render.as_ref() {
                render.store_measure(measured);
            }
        }
        measured
    }

    // =========================================================================
    // REDRAW
    // =========================================================================

    /// Paint the root if anything is dirty (or `force`). Returns whether a
    /// redraw walk happened.
    pub fn paint_root(&mut self, painter: &mut dyn Painter, force: bool) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        if !force && !self.is_dirty(root) {
            return false;
        }
        let origin = self.base(root).map_or(point(0.0, 0.0), WidgetBase::pos);
        painter.save();
        painter.translate(origin.x, origin.y);
        self.redraw(root, painter, force);
        painter.restore();
        self.clear_dirty(root);
        true
    }

    /// Lay out and paint `id` in its local space. The caller clears its flags
    /// afterwards.
    ///
    /// In scene mode every visited widget re-records itself into a fresh
    /// scene, so its own paint always runs; clean children are replayed.
    pub fn redraw(&mut self, id: WidgetId, painter: &mut dyn Painter, force: bool) {
        if !self.contains(id) {
            return;
        }
        self.stats.redraws += 1;

        if let Some(mut widget) = self.take_widget(id) {
            let outer = self.laying_out.replace(id);
            widget.layout(&mut LayoutCx {
                tree: self,
                id,
                painter: &*painter,
            });
            self.laying_out = outer;
            self.restore_widget(id, widget);
        }

        let scenes = painter.scene_cache().is_some();
        let paint_self = force || scenes || self.is_paint_dirty(id);
        if let Some(render) = self.render_mut(id) {
            render.begin_paint();
        }

        if paint_self {
            self.paint_hook(id, painter, false);
        }

        let bounds = Rect::from_origin_size(
            point(0.0, 0.0),
            self.base(id).map_or(size(0.0, 0.0), WidgetBase::size),
        );
        for child in self.paint_order(id) {
            let Some(rect) = self.base(child).map(WidgetBase::rect) else {
                continue;
            };
            if !bounds.intersects(&rect) {
                self.stats.culled += 1;
                continue;
            }
            if scenes {
                self.redraw_child_scene(child, rect, painter, force);
            } else {
                let child_force = force || paint_self;
                if child_force || self.is_dirty(child) {
                    painter.save();
                    painter.translate(rect.x, rect.y);
                    painter.clip(Rect::from_origin_size(point(0.0, 0.0), rect.size()));
                    self.redraw(child, painter, child_force);
                    painter.restore();
                    self.clear_dirty(child);
                }
            }
        }

        if paint_self {
            self.paint_hook(id, painter, true);
        }
    }

    fn redraw_child_scene(
        &mut self,
        child: WidgetId,
        rect: Rect,
        painter: &mut dyn Painter,
        force: bool,
    ) {
        let cached = painter
            .scene_cache()
            .is_some_and(|scenes| scenes.has_scene(child));
        if force || !cached || self.is_dirty(child) {
            if let Some(scenes) = painter.scene_cache() {
                scenes.begin_scene(child);
            }
            self.redraw(child, painter, force);
            if let Some(scenes) = painter.scene_cache() {
                scenes.end_scene();
            }
            self.clear_dirty(child);
        } else {
            self.stats.scene_hits += 1;
        }
        if let Some(scenes) = painter.scene_cache() {
            scenes.append_scene(child, rect.origin());
        }
    }

    fn paint_hook(&mut self, id: WidgetId, painter: &mut dyn Painter, over: bool) {
        let Some(mut widget) = self.take_widget(id) else {
            return;
        };
        {
            let mut cx = PaintCx {
                tree: &*self,
                id,
                painter: &mut *painter,
            };
            if over {
                widget.paint_over(&mut cx);
            } else {
                widget.paint(&mut cx);
            }
        }
        self.restore_widget(id, widget);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::RecordingPainter;

    struct Leaf;
    impl Widget for Leaf {}

    fn setup() -> (Tree, WidgetId, WidgetId, WidgetId) {
        let mut tree = Tree::default();
        let root = tree.insert(Leaf, Props::fixed(100.0, 100.0));
        let mid = tree.insert(Leaf, Props::fixed(50.0, 50.0));
        let leaf = tree.insert(Leaf, Props::fixed(10.0, 10.0));
        tree.set_root(root);
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);
        let mut painter = RecordingPainter::new();
        tree.paint_root(&mut painter, true);
        (tree, root, mid, leaf)
    }

    #[test]
    fn test_paint_clears_everything() {
        let (tree, root, mid, leaf) = setup();
        assert!(!tree.is_dirty(root));
        assert!(!tree.is_dirty(mid));
        assert!(!tree.is_dirty(leaf));
    }

    #[test]
    fn test_propagation_stops_at_dirty_ancestor() {
        let (mut tree, root, mid, leaf) = setup();
        tree.reset_stats();
        tree.mark_paint_dirty(leaf);
        assert!(tree.render_node(mid).is_some_and(RenderNode::is_subtree_dirty));
        assert!(tree.render_node(root).is_some_and(RenderNode::is_subtree_dirty));
        assert_eq!(tree.stats().propagation_steps, 2);

        tree.mark_paint_dirty(leaf);
        assert_eq!(tree.stats().propagation_steps, 3);
    }

    #[test]
    fn test_move_and_resize_noop_when_unchanged() {
        let (mut tree, _root, mid, leaf) = setup();
        tree.move_to(leaf, point(0.0, 0.0));
        tree.resize(leaf, size(10.0, 10.0));
        assert!(!tree.is_dirty(leaf));
        assert!(!tree.is_dirty(mid));

        tree.move_to(leaf, point(5.0, 0.0));
        assert!(tree.is_paint_dirty(leaf));
        assert!(tree.is_paint_dirty(mid));
        assert!(!tree.is_layout_dirty(leaf));
    }

    #[test]
    fn test_resize_marks_layout_and_parent_paint() {
        let (mut tree, _root, mid, leaf) = setup();
        tree.resize(leaf, size(20.0, 10.0));
        assert!(tree.is_layout_dirty(leaf));
        assert!(tree.is_paint_dirty(mid));
        assert!(!tree.is_layout_dirty(mid));
    }

    #[test]
    fn test_add_child_refuses_cycle() {
        let (mut tree, root, mid, leaf) = setup();
        tree.add_child(leaf, mid);
        assert_eq!(tree.parent(mid), Some(root));
        assert_eq!(tree.parent(leaf), Some(mid));
    }

    #[test]
    fn test_reparent_moves_child() {
        let (mut tree, root, mid, leaf) = setup();
        tree.add_child(root, leaf);
        assert_eq!(tree.parent(leaf), Some(root));
        assert!(tree.children(mid).is_empty());
        assert_eq!(tree.children(root), &[mid, leaf]);
        assert_eq!(tree.base(leaf).map(WidgetBase::depth), Some(1));
    }

    #[test]
    fn test_teardown_frees_and_stale_ids_are_harmless() {
        let (mut tree, root, mid, leaf) = setup();
        tree.teardown(mid);
        assert!(!tree.contains(mid));
        assert!(!tree.contains(leaf));
        assert!(tree.children(root).is_empty());
        tree.move_to(leaf, point(3.0, 3.0));
        tree.mark_paint_dirty(leaf);
        assert!(tree.base(leaf).is_none());
        assert_eq!(tree.take_freed().len(), 2);
    }

    #[test]
    fn test_teardown_spares_protected() {
        let (mut tree, root, mid, leaf) = setup();
        tree.protect(leaf);
        tree.teardown(mid);
        tree.unprotect_all();
        assert!(!tree.contains(mid));
        assert!(tree.contains(leaf));
        assert_eq!(tree.parent(leaf), None);
        assert!(tree.base(leaf).is_some_and(WidgetBase::is_mounted));
        tree.add_child(root, leaf);
        assert_eq!(tree.children(root), &[leaf]);
    }

    #[test]
    fn test_dispatch_clips_to_parent() {
        let (mut tree, root, mid, leaf) = setup();
        tree.move_to(mid, point(10.0, 10.0));
        tree.move_to(leaf, point(45.0, 45.0));
        tree.resize(leaf, size(20.0, 20.0));

        assert_eq!(tree.dispatch(root, point(57.0, 57.0)), Some((leaf, point(2.0, 2.0))));
        // inside leaf's rect but outside mid
        assert_eq!(tree.dispatch(root, point(65.0, 65.0)), Some((root, point(65.0, 65.0))));
        assert_eq!(tree.dispatch(root, point(150.0, 5.0)), None);
    }

    #[test]
    fn test_z_index_reorders_hits() {
        let (mut tree, root, mid, _leaf) = setup();
        let top = tree.insert(Leaf, Props::fixed(50.0, 50.0));
        tree.add_child(root, top);
        assert_eq!(tree.dispatch(root, point(1.0, 1.0)).map(|h| h.0), Some(top));
        tree.set_z_index(mid, 5);
        assert_eq!(tree.paint_order(root), vec![top, mid]);
        assert_eq!(tree.hit_order(root), vec![mid, top]);
    }

    #[test]
    fn test_absolute_coordinates() {
        let (mut tree, _root, mid, leaf) = setup();
        tree.move_to(mid, point(10.0, 20.0));
        tree.move_to(leaf, point(1.0, 2.0));
        assert_eq!(tree.absolute_rect(leaf), Rect::new(11.0, 22.0, 10.0, 10.0));
        assert_eq!(tree.to_local(leaf, point(12.0, 25.0)), point(1.0, 3.0));
    }
}
