//! Contexts handed to widget hooks.
//!
//! While a hook runs, the widget itself is lifted out of its arena slot, so a
//! context can hold the tree mutably without aliasing the widget.

use super::{Tree, WidgetBase, WidgetId};
use crate::paint::Painter;
use crate::types::{Point, Size};

// =============================================================================
// MEASURE
// =============================================================================

/// Read-only view used by [`Widget::measure`](super::Widget::measure).
pub struct MeasureCx<'a> {
    pub(crate) tree: &'a Tree,
    pub(crate) id: WidgetId,
    pub(crate) painter: &'a dyn Painter,
}

impl<'a> MeasureCx<'a> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn painter(&self) -> &'a dyn Painter {
        self.painter
    }

    pub fn base(&self) -> Option<&'a WidgetBase> {
        self.tree.base(self.id)
    }

    pub fn children(&self) -> &'a [WidgetId] {
        self.tree.children(self.id)
    }

    /// Policy-aware measurement of a child.
    pub fn measure(&self, child: WidgetId) -> Size {
        self.tree.measure(child, self.painter)
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Mutable tree access for [`Widget::layout`](super::Widget::layout).
pub struct LayoutCx<'a> {
    pub(crate) tree: &'a mut Tree,
    pub(crate) id: WidgetId,
    pub(crate) painter: &'a dyn Painter,
}

impl LayoutCx<'_> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    pub fn painter(&self) -> &dyn Painter {
        self.painter
    }

    pub fn base(&self) -> Option<&WidgetBase> {
        self.tree.base(self.id)
    }

    /// Children in insertion order.
    pub fn children(&self) -> Vec<WidgetId> {
        self.tree.children(self.id).to_vec()
    }

    pub fn base_of(&self, child: WidgetId) -> Option<&WidgetBase> {
        self.tree.base(child)
    }

    pub fn measure(&self, child: WidgetId) -> Size {
        self.tree.measure(child, self.painter)
    }

    pub fn move_child(&mut self, child: WidgetId, pos: Point) {
        self.tree.move_to(child, pos);
    }

    pub fn resize_child(&mut self, child: WidgetId, size: Size) {
        self.tree.resize(child, size);
    }
}

// =============================================================================
// PAINT
// =============================================================================

/// Painter plus read-only tree access for the paint hooks.
pub struct PaintCx<'a> {
    pub(crate) tree: &'a Tree,
    pub(crate) id: WidgetId,
    pub(crate) painter: &'a mut dyn Painter,
}

impl PaintCx<'_> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    pub fn painter(&mut self) -> &mut dyn Painter {
        &mut *self.painter
    }

    pub fn base(&self) -> Option<&WidgetBase> {
        self.tree.base(self.id)
    }

    pub fn size(&self) -> Size {
        self.base().map_or(Size { width: 0.0, height: 0.0 }, WidgetBase::size)
    }

    pub fn is_focused(&self) -> bool {
        self.tree.interaction().focused == Some(self.id)
    }

    pub fn is_hovered(&self) -> bool {
        self.tree.interaction().hovered == Some(self.id)
    }

    pub fn is_pressed(&self) -> bool {
        self.tree.interaction().pressed == Some(self.id)
    }
}

// =============================================================================
// EVENT
// =============================================================================

/// Mutable tree access for input, lifecycle and animation hooks.
pub struct EventCx<'a> {
    pub(crate) tree: &'a mut Tree,
    pub(crate) id: WidgetId,
}

impl<'a> EventCx<'a> {
    pub fn new(tree: &'a mut Tree, id: WidgetId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    pub fn base(&self) -> Option<&WidgetBase> {
        self.tree.base(self.id)
    }

    pub fn request_paint(&mut self) {
        self.tree.mark_paint_dirty(self.id);
    }

    pub fn request_layout(&mut self) {
        self.tree.mark_layout_dirty(self.id);
    }

    /// Ask for [`Widget::tick`](super::Widget::tick) calls until it returns `false`.
    pub fn request_animation(&mut self) {
        self.tree.request_animation(self.id);
    }

    pub fn is_focused(&self) -> bool {
        self.tree.interaction().focused == Some(self.id)
    }
}
