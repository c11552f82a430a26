//! Widget - the base contract every tree node implements
//!
//! A widget is split in two halves:
//! - [`WidgetBase`] - geometry, size policy, z/tab index, parent link. Owned by
//!   the [`Tree`](super::Tree) and mutated only through it, so every change
//!   goes through dirty tracking.
//! - [`Widget`] - the behaviour. Every hook has a no-op default, leaf widgets
//!   override what they need.

use std::any::Any;
use std::rc::Rc;

use super::WidgetId;
use super::context::{EventCx, LayoutCx, MeasureCx, PaintCx};
use crate::event::{Key, Modifiers, MouseButton};
use crate::state::ObserverList;
use crate::types::{Insets, NO_INSETS, Point, Rect, Size, SizePolicy, size};

// =============================================================================
// PROPS
// =============================================================================

/// Initial configuration of a widget, applied by [`Tree::insert`](super::Tree::insert).
#[derive(Debug, Clone, PartialEq)]
pub struct Props {
    pub size: Size,
    pub width: SizePolicy,
    pub height: SizePolicy,
    pub flex: f32,
    pub z_index: i32,
    pub tab_index: Option<u32>,
    pub focusable: bool,
    pub padding: Insets,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            size: size(0.0, 0.0),
            width: SizePolicy::Fixed,
            height: SizePolicy::Fixed,
            flex: 1.0,
            z_index: 0,
            tab_index: None,
            focusable: false,
            padding: NO_INSETS,
        }
    }
}

impl Props {
    /// Fixed on both axes.
    pub fn fixed(width: f32, height: f32) -> Self {
        Self {
            size: size(width, height),
            ..Self::default()
        }
    }

    /// Expanding on both axes.
    pub fn expanding() -> Self {
        Self {
            width: SizePolicy::Expanding,
            height: SizePolicy::Expanding,
            ..Self::default()
        }
    }

    /// Sized to content on both axes.
    pub fn content() -> Self {
        Self {
            width: SizePolicy::Content,
            height: SizePolicy::Content,
            ..Self::default()
        }
    }

    pub fn policy(mut self, width: SizePolicy, height: SizePolicy) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn flex(mut self, flex: f32) -> Self {
        self.flex = flex;
        self
    }

    pub fn z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn tab(mut self, tab_index: u32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    pub fn focusable(mut self) -> Self {
        self.focusable = true;
        self
    }

    pub fn padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }
}

// =============================================================================
// WIDGET BASE
// =============================================================================

/// Geometry and bookkeeping shared by every widget.
///
/// Positions are relative to the parent's top-left corner.
#[derive(Debug)]
pub struct WidgetBase {
    pub(crate) pos: Point,
    pub(crate) size: Size,
    pub(crate) width_policy: SizePolicy,
    pub(crate) height_policy: SizePolicy,
    pub(crate) flex: f32,
    pub(crate) z_index: i32,
    pub(crate) tab_index: Option<u32>,
    pub(crate) focusable: bool,
    pub(crate) padding: Insets,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) depth: usize,
    pub(crate) mounted: bool,
    pub(crate) subscriptions: Vec<Rc<ObserverList>>,
}

impl WidgetBase {
    pub(crate) fn from_props(props: Props) -> Self {
        Self {
            pos: Point { x: 0.0, y: 0.0 },
            size: props.size,
            width_policy: props.width,
            height_policy: props.height,
            flex: props.flex.max(0.0),
            z_index: props.z_index,
            tab_index: props.tab_index,
            focusable: props.focusable,
            padding: props.padding,
            parent: None,
            depth: 0,
            mounted: false,
            subscriptions: Vec::new(),
        }
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Bounds in the parent's coordinate space.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.pos, self.size)
    }

    /// Inner box in the widget's own coordinate space.
    pub fn content_rect(&self) -> Rect {
        Rect::from_origin_size(Point { x: 0.0, y: 0.0 }, self.size).inset(self.padding)
    }

    pub fn width_policy(&self) -> SizePolicy {
        self.width_policy
    }

    pub fn height_policy(&self) -> SizePolicy {
        self.height_policy
    }

    pub fn flex(&self) -> f32 {
        self.flex
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn tab_index(&self) -> Option<u32> {
        self.tab_index
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Point-in-bounds test, `p` in parent coordinates.
    pub fn contain(&self, p: Point) -> bool {
        self.rect().contains(p)
    }
}

// =============================================================================
// WIDGET TRAIT
// =============================================================================

/// Upcast helper so trees can hand back concrete widget types.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour of a tree node.
///
/// Coordinates handed to the mouse hooks are local to the widget (origin at
/// its top-left corner).
#[allow(unused_variables)]
pub trait Widget: AsAny {
    /// Content size request. Must not mutate the tree. Axes with a `Fixed`
    /// policy are overridden by the explicit size afterwards.
    fn measure(&self, cx: &MeasureCx<'_>) -> Size {
        size(0.0, 0.0)
    }

    /// Position and size children. Step one of a container's redraw.
    fn layout(&mut self, cx: &mut LayoutCx<'_>) {}

    /// Draw self in local coordinates, before children.
    fn paint(&mut self, cx: &mut PaintCx<'_>) {}

    /// Draw on top of children (scrollbars, focus rings).
    fn paint_over(&mut self, cx: &mut PaintCx<'_>) {}

    /// Claim a point before children are hit-tested.
    fn intercepts(&self, base: &WidgetBase, local: Point) -> bool {
        false
    }

    fn on_mount(&mut self, cx: &mut EventCx<'_>) {}

    fn on_unmount(&mut self, cx: &mut EventCx<'_>) {}

    /// A child was attached to this widget.
    fn on_child_added(&mut self, cx: &mut EventCx<'_>, child: WidgetId) {}

    fn mouse_down(&mut self, cx: &mut EventCx<'_>, pos: Point, button: MouseButton) {}

    fn mouse_up(&mut self, cx: &mut EventCx<'_>, pos: Point, button: MouseButton) {}

    /// Cursor moved with a button held. Delivered to the pressed widget
    /// wherever the cursor is; `pos` is in this widget's local space.
    fn mouse_drag(&mut self, cx: &mut EventCx<'_>, pos: Point, delta: Point) {}

    fn mouse_enter(&mut self, cx: &mut EventCx<'_>) {}

    fn mouse_leave(&mut self, cx: &mut EventCx<'_>) {}

    /// Return `true` to consume; otherwise the wheel bubbles to the parent.
    fn mouse_wheel(&mut self, cx: &mut EventCx<'_>, delta: Point) -> bool {
        false
    }

    fn input_char(&mut self, cx: &mut EventCx<'_>, ch: char) {}

    /// Return `true` to consume the key.
    fn input_key(&mut self, cx: &mut EventCx<'_>, key: Key, modifiers: Modifiers) -> bool {
        false
    }

    /// IME pre-edit text with cursor position (in chars).
    fn input_ime(&mut self, cx: &mut EventCx<'_>, text: &str, cursor: usize) {}

    /// The user moved focus here (click or tab cycling).
    fn focus(&mut self, cx: &mut EventCx<'_>) {}

    fn unfocus(&mut self, cx: &mut EventCx<'_>) {}

    /// Animation step, `dt` in seconds. Return `true` to keep ticking.
    fn tick(&mut self, cx: &mut EventCx<'_>, dt: f32) -> bool {
        false
    }

    /// Text-input mode is enabled on the host while this widget is focused.
    fn accepts_text_input(&self) -> bool {
        false
    }
}
