//! Linear - column and row containers.
//!
//! Two-pass flex layout over the content box (outer box minus padding):
//!
//! 1. Measure: expanding children only add their flex weight; every other
//!    child takes its measured main-axis extent, which is subtracted from the
//!    remaining space along with one spacing per gap.
//! 2. Distribute: expanding children share what is left by weight; everyone
//!    is stretched across the cross axis and placed in sequence, shifted by
//!    the scroll offset.
//!
//! A scrollable container reserves a scrollbar strip on the cross end while
//! its content overflows, and gives the strip back once it fits. On the
//! scroll axis, expanding children are downgraded to content-sized, both the
//! ones already present and any added later. With pin-to-end the view stays
//! at the end while content grows, until the user scrolls back.

use tracing::trace;

use crate::config::{DEFAULT_SCROLLBAR_WIDTH, DEFAULT_SPACING};
use crate::engine::{EventCx, LayoutCx, MeasureCx, PaintCx, Widget, WidgetBase, WidgetId};
use crate::event::MouseButton;
use crate::types::{Axis, Point, Rect, Rgba, Size, SizePolicy};

const TRACK_COLOR: Rgba = Rgba::new(0, 0, 0, 40);
const THUMB_COLOR: Rgba = Rgba::new(0, 0, 0, 140);

#[derive(Debug, Clone)]
pub struct Linear {
    axis: Axis,
    spacing: f32,
    scrollable: bool,
    scrollbar_width: f32,
    offset: f32,
    content_length: f32,
    viewport: f32,
    pin_to_end: bool,
    pinned: bool,
    dragging: bool,
}

impl Linear {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: DEFAULT_SPACING,
            scrollable: false,
            scrollbar_width: DEFAULT_SCROLLBAR_WIDTH,
            offset: 0.0,
            content_length: 0.0,
            viewport: 0.0,
            pin_to_end: false,
            pinned: false,
            dragging: false,
        }
    }

    /// Vertical stack.
    pub fn column() -> Self {
        Self::new(Axis::Vertical)
    }

    /// Horizontal stack.
    pub fn row() -> Self {
        Self::new(Axis::Horizontal)
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing.max(0.0);
        self
    }

    /// Scrollable along the main axis. Children added later are downgraded
    /// in `on_child_added`.
    pub fn with_scroll(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn with_scrollbar_width(mut self, width: f32) -> Self {
        self.scrollbar_width = width.max(0.0);
        self
    }

    pub fn with_pin_to_end(mut self) -> Self {
        self.pin_to_end = true;
        self.pinned = true;
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Main-axis length of all children plus gaps, from the last layout.
    pub fn content_length(&self) -> f32 {
        self.content_length
    }

    /// Main-axis length of the content box, from the last layout.
    pub fn viewport(&self) -> f32 {
        self.viewport
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_length - self.viewport).max(0.0)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    // =========================================================================
    // SCROLL CONTROL
    // =========================================================================

    /// Turn scrolling on or off. Turning it on downgrades expanding children
    /// on the main axis to content-sized.
    pub fn set_scrollable(&mut self, cx: &mut EventCx<'_>, scrollable: bool) {
        if self.scrollable == scrollable {
            return;
        }
        self.scrollable = scrollable;
        if scrollable {
            let id = cx.id();
            let children = cx.tree().children(id).to_vec();
            for child in children {
                self.downgrade(cx, child);
            }
        } else {
            self.offset = 0.0;
        }
        cx.request_layout();
    }

    pub fn set_pin_to_end(&mut self, cx: &mut EventCx<'_>, pin: bool) {
        self.pin_to_end = pin;
        self.pinned = pin;
        cx.request_layout();
    }

    /// Out-of-range values are clamped on the next layout. Scrolling toward
    /// the start unpins; reaching the end re-pins when pin-to-end is on.
    pub fn scroll_to(&mut self, cx: &mut EventCx<'_>, offset: f32) {
        if offset < self.offset {
            self.pinned = false;
        }
        if self.pin_to_end && offset >= self.max_offset() {
            self.pinned = true;
        }
        if offset != self.offset {
            self.offset = offset;
            cx.request_layout();
        }
    }

    pub fn scroll_by(&mut self, cx: &mut EventCx<'_>, delta: f32) {
        self.scroll_to(cx, self.offset + delta);
    }

    fn downgrade(&self, cx: &mut EventCx<'_>, child: WidgetId) {
        let Some(base) = cx.tree().base(child) else {
            return;
        };
        let (mut wp, mut hp) = (base.width_policy(), base.height_policy());
        match self.axis {
            Axis::Horizontal if wp == SizePolicy::Expanding => wp = SizePolicy::Content,
            Axis::Vertical if hp == SizePolicy::Expanding => hp = SizePolicy::Content,
            _ => return,
        }
        trace!(?child, "expanding child downgraded in scroll axis");
        cx.tree().set_policy(child, wp, hp);
    }

    // =========================================================================
    // SCROLLBAR GEOMETRY
    // =========================================================================

    fn shows_scrollbar(&self) -> bool {
        self.scrollable && self.content_length > self.viewport
    }

    /// Track strip along the cross end of the content box.
    fn track(&self, base: &WidgetBase) -> Rect {
        let content = base.content_rect();
        let bar = self.scrollbar_width.min(self.axis.cross().of(content.size()));
        match self.axis {
            Axis::Vertical => Rect::new(content.right() - bar, content.y, bar, content.height),
            Axis::Horizontal => Rect::new(content.x, content.bottom() - bar, content.width, bar),
        }
    }

    /// Thumb start (relative to the track) and length.
    fn thumb(&self, track_len: f32) -> (f32, f32) {
        if self.content_length <= 0.0 {
            return (0.0, track_len);
        }
        let min_len = (self.scrollbar_width * 2.0).min(track_len);
        let len = (track_len * self.viewport / self.content_length).clamp(min_len, track_len);
        let max = self.max_offset();
        let start = if max > 0.0 {
            (self.offset.clamp(0.0, max) / max) * (track_len - len)
        } else {
            0.0
        };
        (start, len)
    }

    /// Offset that centres the thumb on `pos` (local coordinates).
    fn offset_at(&self, base: &WidgetBase, pos: Point) -> f32 {
        let track = self.track(base);
        let track_start = self.axis.coord(track.origin());
        let track_len = self.axis.of(track.size());
        let (_, thumb_len) = self.thumb(track_len);
        let travel = track_len - thumb_len;
        if travel <= 0.0 {
            return 0.0;
        }
        let t = ((self.axis.coord(pos) - track_start - thumb_len / 2.0) / travel).clamp(0.0, 1.0);
        t * self.max_offset()
    }
}

impl Widget for Linear {
    /// Sum along the main axis (plus gaps), max across, plus padding.
    fn measure(&self, cx: &MeasureCx<'_>) -> Size {
        let children = cx.children();
        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        for &child in children {
            let s = cx.measure(child);
            main += self.axis.of(s);
            cross = cross.max(self.axis.cross().of(s));
        }
        if children.len() > 1 {
            main += self.spacing * (children.len() - 1) as f32;
        }
        if self.shows_scrollbar() {
            cross += self.scrollbar_width;
        }
        let padding = cx.base().map(WidgetBase::padding);
        let (lead, trail) = padding.map_or((0.0, 0.0), |p| self.axis.insets(p));
        let (cross_lead, cross_trail) =
            padding.map_or((0.0, 0.0), |p| self.axis.cross().insets(p));
        self.axis
            .pack_size(main + lead + trail, cross + cross_lead + cross_trail)
    }

    fn layout(&mut self, cx: &mut LayoutCx<'_>) {
        let Some(content) = cx.base().map(WidgetBase::content_rect) else {
            return;
        };
        let axis = self.axis;
        let cross_axis = axis.cross();
        let children = cx.children();
        let count = children.len();

        let main_total = axis.of(content.size());
        let gaps = self.spacing * count.saturating_sub(1) as f32;

        // pass 1: measure fixed and content children
        let mut remaining = main_total - gaps;
        let mut total_flex = 0.0f32;
        let mut extents = vec![0.0f32; count];
        let mut weights = vec![None; count];
        for (i, &child) in children.iter().enumerate() {
            let Some(base) = cx.base_of(child) else {
                continue;
            };
            let policy = match axis {
                Axis::Horizontal => base.width_policy(),
                Axis::Vertical => base.height_policy(),
            };
            if policy == SizePolicy::Expanding {
                total_flex += base.flex();
                weights[i] = Some(base.flex());
                continue;
            }
            extents[i] = axis.of(cx.measure(child));
            remaining -= extents[i];
        }
        let remaining = remaining.max(0.0);

        // pass 2: share the rest by weight
        for (extent, weight) in extents.iter_mut().zip(&weights) {
            if let Some(flex) = weight {
                *extent = if total_flex > 0.0 {
                    remaining * flex / total_flex
                } else {
                    0.0
                };
            }
        }
        self.content_length = extents.iter().sum::<f32>() + gaps;
        self.viewport = main_total;

        if self.scrollable {
            let max = self.max_offset();
            if self.pinned {
                self.offset = max;
            }
            self.offset = self.offset.clamp(0.0, max);
        } else {
            self.offset = 0.0;
        }

        let bar = if self.shows_scrollbar() {
            self.scrollbar_width
        } else {
            0.0
        };
        let cross_total = (cross_axis.of(content.size()) - bar).max(0.0);
        let mut cursor = axis.coord(content.origin()) - self.offset;
        let cross_origin = cross_axis.coord(content.origin());
        for (&child, &extent) in children.iter().zip(&extents) {
            cx.resize_child(child, axis.pack_size(extent, cross_total));
            cx.move_child(child, axis.pack_point(cursor, cross_origin));
            cursor += extent + self.spacing;
        }
    }

    fn paint_over(&mut self, cx: &mut PaintCx<'_>) {
        if !self.shows_scrollbar() {
            return;
        }
        let Some(track) = cx.base().map(|b| self.track(b)) else {
            return;
        };
        let (start, len) = self.thumb(self.axis.of(track.size()));
        let thumb = match self.axis {
            Axis::Vertical => Rect::new(track.x, track.y + start, track.width, len),
            Axis::Horizontal => Rect::new(track.x + start, track.y, len, track.height),
        };
        let painter = cx.painter();
        painter.fill_rect(track, TRACK_COLOR);
        painter.fill_rect(thumb, THUMB_COLOR);
    }

    fn intercepts(&self, base: &WidgetBase, local: Point) -> bool {
        self.shows_scrollbar() && self.track(base).contains(local)
    }

    fn on_child_added(&mut self, cx: &mut EventCx<'_>, child: WidgetId) {
        if self.scrollable {
            self.downgrade(cx, child);
        }
    }

    fn mouse_down(&mut self, cx: &mut EventCx<'_>, pos: Point, button: MouseButton) {
        if button != MouseButton::Left || !self.shows_scrollbar() {
            return;
        }
        let Some(base) = cx.base() else {
            return;
        };
        if !self.track(base).contains(pos) {
            return;
        }
        let target = self.offset_at(base, pos);
        self.dragging = true;
        self.scroll_to(cx, target);
    }

    fn mouse_drag(&mut self, cx: &mut EventCx<'_>, pos: Point, _delta: Point) {
        if !self.dragging {
            return;
        }
        let Some(target) = cx.base().map(|b| self.offset_at(b, pos)) else {
            return;
        };
        self.scroll_to(cx, target);
    }

    fn mouse_up(&mut self, _cx: &mut EventCx<'_>, _pos: Point, _button: MouseButton) {
        self.dragging = false;
    }

    /// Consumed only if the offset actually moves, so the wheel chains to an
    /// outer scroller at the edges.
    fn mouse_wheel(&mut self, cx: &mut EventCx<'_>, delta: Point) -> bool {
        if !self.scrollable {
            return false;
        }
        let step = self.axis.coord(delta);
        let target = (self.offset + step).clamp(0.0, self.max_offset());
        if step == 0.0 || target == self.offset {
            return false;
        }
        self.scroll_to(cx, target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Props, Tree};
    use crate::paint::RecordingPainter;
    use crate::types::{insets, point, size};

    struct Block(f32);
    impl Widget for Block {
        fn measure(&self, _cx: &MeasureCx<'_>) -> Size {
            size(self.0, self.0)
        }
    }

    fn setup(linear: Linear, props: Props) -> (Tree, WidgetId) {
        let mut tree = Tree::default();
        let id = tree.insert(linear, props);
        tree.set_root(id);
        (tree, id)
    }

    fn frame(tree: &mut Tree) {
        tree.paint_root(&mut RecordingPainter::new(), false);
    }

    fn main_extent(tree: &Tree, id: WidgetId) -> f32 {
        tree.base(id).map_or(-1.0, |b| b.size().height)
    }

    #[test]
    fn test_flex_distribution_fills_content_box() {
        let (mut tree, col) = setup(
            Linear::column().with_spacing(4.0),
            Props::fixed(50.0, 200.0).padding(insets(10.0)),
        );
        let fixed = tree.insert(Block(0.0), Props::fixed(10.0, 30.0));
        let content = tree.insert(Block(12.0), Props::content());
        let one = tree.insert(Block(0.0), Props::expanding().flex(1.0));
        let three = tree.insert(Block(0.0), Props::expanding().flex(3.0));
        for c in [fixed, content, one, three] {
            tree.add_child(col, c);
        }
        frame(&mut tree);

        // 180 inner - 12 spacing - 30 - 12 = 126 left
        assert_eq!(main_extent(&tree, fixed), 30.0);
        assert_eq!(main_extent(&tree, content), 12.0);
        assert!((main_extent(&tree, one) - 31.5).abs() < 1e-4);
        assert!((main_extent(&tree, three) - 94.5).abs() < 1e-4);
        let sum: f32 = [fixed, content, one, three].iter().map(|&c| main_extent(&tree, c)).sum();
        assert!((sum + 12.0 + 20.0 - 200.0).abs() < 1e-3);

        // stretched across, stacked along
        assert_eq!(tree.base(fixed).map(|b| b.size().width), Some(30.0));
        assert_eq!(tree.base(content).map(WidgetBase::pos), Some(point(10.0, 44.0)));
        assert_eq!(tree.base(one).map(WidgetBase::pos), Some(point(10.0, 60.0)));
    }

    #[test]
    fn test_overflow_clamps_remaining_to_zero() {
        let (mut tree, row) = setup(Linear::row().with_spacing(0.0), Props::fixed(50.0, 10.0));
        let big = tree.insert(Block(0.0), Props::fixed(80.0, 10.0));
        let fill = tree.insert(Block(0.0), Props::expanding());
        tree.add_child(row, big);
        tree.add_child(row, fill);
        frame(&mut tree);
        assert_eq!(tree.base(fill).map(|b| b.size().width), Some(0.0));
        assert_eq!(tree.base(fill).map(|b| b.pos().x), Some(80.0));
    }

    #[test]
    fn test_zero_total_flex_gives_nothing() {
        let (mut tree, col) = setup(Linear::column(), Props::fixed(10.0, 100.0));
        let a = tree.insert(Block(0.0), Props::expanding().flex(0.0));
        tree.add_child(col, a);
        frame(&mut tree);
        assert_eq!(main_extent(&tree, a), 0.0);
    }

    #[test]
    fn test_scrollable_downgrades_expanding_children() {
        let (mut tree, col) = setup(Linear::column(), Props::fixed(20.0, 100.0));
        let before = tree.insert(Block(5.0), Props::expanding());
        tree.add_child(col, before);
        tree.with_widget::<Linear, _>(col, |l, cx| l.set_scrollable(cx, true));
        let after = tree.insert(Block(5.0), Props::expanding());
        tree.add_child(col, after);

        for c in [before, after] {
            let base = tree.base(c);
            assert_eq!(base.map(WidgetBase::height_policy), Some(SizePolicy::Content));
            assert_eq!(base.map(WidgetBase::width_policy), Some(SizePolicy::Expanding));
        }
    }

    #[test]
    fn test_scroll_offset_clamped_on_layout() {
        let (mut tree, col) = setup(
            Linear::column().with_spacing(0.0).with_scroll(),
            Props::fixed(20.0, 50.0),
        );
        for _ in 0..4 {
            let c = tree.insert(Block(0.0), Props::fixed(10.0, 25.0));
            tree.add_child(col, c);
        }
        frame(&mut tree);
        tree.with_widget::<Linear, _>(col, |l, cx| l.scroll_to(cx, 500.0));
        frame(&mut tree);
        assert_eq!(tree.widget_ref::<Linear>(col).map(Linear::offset), Some(50.0));

        tree.with_widget::<Linear, _>(col, |l, cx| l.scroll_to(cx, -7.0));
        frame(&mut tree);
        assert_eq!(tree.widget_ref::<Linear>(col).map(Linear::offset), Some(0.0));
        let first = tree.children(col)[0];
        assert_eq!(tree.base(first).map(|b| b.pos().y), Some(0.0));
    }

    #[test]
    fn test_pin_to_end_follows_growth_until_scrolled_back() {
        let (mut tree, col) = setup(
            Linear::column().with_spacing(0.0).with_scroll().with_pin_to_end(),
            Props::fixed(20.0, 50.0),
        );
        let add = |tree: &mut Tree| {
            let c = tree.insert(Block(0.0), Props::fixed(10.0, 25.0));
            tree.add_child(col, c);
        };
        for _ in 0..3 {
            add(&mut tree);
        }
        frame(&mut tree);
        let offset = |tree: &Tree| tree.widget_ref::<Linear>(col).map_or(-1.0, Linear::offset);
        assert_eq!(offset(&tree), 25.0);

        add(&mut tree);
        frame(&mut tree);
        assert_eq!(offset(&tree), 50.0);

        tree.with_widget::<Linear, _>(col, |l, cx| l.scroll_by(cx, -10.0));
        add(&mut tree);
        frame(&mut tree);
        assert_eq!(offset(&tree), 40.0);
        assert!(!tree.widget_ref::<Linear>(col).is_some_and(Linear::is_pinned));

        tree.with_widget::<Linear, _>(col, |l, cx| l.scroll_to(cx, 75.0));
        add(&mut tree);
        frame(&mut tree);
        assert_eq!(offset(&tree), 100.0);
    }

    #[test]
    fn test_wheel_consumed_only_when_moving() {
        let (mut tree, col) = setup(
            Linear::column().with_spacing(0.0).with_scroll(),
            Props::fixed(20.0, 50.0),
        );
        let c = tree.insert(Block(0.0), Props::fixed(10.0, 80.0));
        tree.add_child(col, c);
        frame(&mut tree);

        let wheel = |tree: &mut Tree, dy: f32| {
            tree.with_hook(col, |w, cx| w.mouse_wheel(cx, point(0.0, dy)))
        };
        assert_eq!(wheel(&mut tree, -3.0), Some(false));
        assert_eq!(wheel(&mut tree, 10.0), Some(true));
        assert_eq!(wheel(&mut tree, 100.0), Some(true));
        assert_eq!(wheel(&mut tree, 1.0), Some(false));
    }

    #[test]
    fn test_scrollbar_press_jumps_and_drag_tracks() {
        let (mut tree, col) = setup(
            Linear::column()
                .with_spacing(0.0)
                .with_scroll()
                .with_scrollbar_width(4.0),
            Props::fixed(20.0, 100.0),
        );
        let c = tree.insert(Block(0.0), Props::fixed(10.0, 200.0));
        tree.add_child(col, c);
        frame(&mut tree);

        // the track claims the point before the child does
        assert_eq!(tree.dispatch(col, point(18.0, 99.0)).map(|h| h.0), Some(col));

        tree.with_hook(col, |w, cx| w.mouse_down(cx, point(18.0, 99.0), MouseButton::Left));
        let linear = tree.widget_ref::<Linear>(col);
        assert!(linear.is_some_and(Linear::is_dragging));
        assert_eq!(linear.map(Linear::offset), Some(100.0));

        tree.with_hook(col, |w, cx| w.mouse_drag(cx, point(18.0, 0.0), point(0.0, -99.0)));
        assert_eq!(tree.widget_ref::<Linear>(col).map(Linear::offset), Some(0.0));

        tree.with_hook(col, |w, cx| w.mouse_up(cx, point(18.0, 0.0), MouseButton::Left));
        assert!(!tree.widget_ref::<Linear>(col).is_some_and(Linear::is_dragging));
    }

    #[test]
    fn test_scrollbar_strip_reserved_only_on_overflow() {
        let (mut tree, col) = setup(
            Linear::column()
                .with_spacing(0.0)
                .with_scroll()
                .with_scrollbar_width(4.0),
            Props::fixed(20.0, 100.0),
        );
        let a = tree.insert(Block(0.0), Props::fixed(10.0, 40.0));
        tree.add_child(col, a);
        frame(&mut tree);
        assert_eq!(tree.base(a).map(|b| b.size().width), Some(20.0));

        let b = tree.insert(Block(0.0), Props::fixed(10.0, 80.0));
        tree.add_child(col, b);
        frame(&mut tree);
        assert_eq!(tree.base(a).map(|b| b.size().width), Some(16.0));
        assert_eq!(tree.base(b).map(|b| b.size().width), Some(16.0));

        tree.teardown(b);
        frame(&mut tree);
        assert_eq!(tree.base(a).map(|b| b.size().width), Some(20.0));
    }

    #[test]
    fn test_measure_sums_main_and_maxes_cross() {
        let (mut tree, row) = setup(
            Linear::row().with_spacing(2.0),
            Props::content().padding(insets(1.0)),
        );
        let a = tree.insert(Block(4.0), Props::content());
        let b = tree.insert(Block(6.0), Props::content());
        tree.add_child(row, a);
        tree.add_child(row, b);
        let painter = RecordingPainter::new();
        assert_eq!(tree.measure(row, &painter), size(14.0, 8.0));
    }
}
