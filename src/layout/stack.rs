//! Stack - free-positioned container.

use crate::engine::{LayoutCx, MeasureCx, Widget, WidgetBase};
use crate::types::{Size, size};

use super::fit_child;

/// Children keep the positions set with `Tree::move_to`; expanding children
/// fill the content box. Paint and hit order follow z-index.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stack;

impl Stack {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for Stack {
    /// Bounding box of the children's far edges, plus padding.
    fn measure(&self, cx: &MeasureCx<'_>) -> Size {
        let mut extent = size(0.0, 0.0);
        for &child in cx.children() {
            let pos = cx.tree().base(child).map(WidgetBase::pos);
            let measured = cx.measure(child);
            let (x, y) = pos.map_or((0.0, 0.0), |p| (p.x, p.y));
            extent.width = extent.width.max(x + measured.width);
            extent.height = extent.height.max(y + measured.height);
        }
        let padding = cx.base().map(WidgetBase::padding);
        match padding {
            Some(p) => size(
                extent.width + p.left + p.right,
                extent.height + p.top + p.bottom,
            ),
            None => extent,
        }
    }

    fn layout(&mut self, cx: &mut LayoutCx<'_>) {
        let Some(content) = cx.base().map(WidgetBase::content_rect) else {
            return;
        };
        for child in cx.children() {
            fit_child(cx, child, content, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Props, Tree, WidgetId};
    use crate::paint::RecordingPainter;
    use crate::types::{SizePolicy, insets, point};

    struct Block;
    impl Widget for Block {
        fn measure(&self, _cx: &MeasureCx<'_>) -> Size {
            size(7.0, 3.0)
        }
    }

    fn setup() -> (Tree, WidgetId) {
        let mut tree = Tree::default();
        let stack = tree.insert(Stack::new(), Props::fixed(100.0, 50.0).padding(insets(5.0)));
        tree.set_root(stack);
        (tree, stack)
    }

    #[test]
    fn test_positions_are_kept_and_policies_applied() {
        let (mut tree, stack) = setup();
        let fixed = tree.insert(Block, Props::fixed(10.0, 10.0));
        let content = tree.insert(Block, Props::content());
        let fill = tree.insert(Block, Props::expanding());
        tree.add_child(stack, fixed);
        tree.add_child(stack, content);
        tree.add_child(stack, fill);
        tree.move_to(fixed, point(20.0, 30.0));
        tree.move_to(content, point(1.0, 2.0));

        tree.paint_root(&mut RecordingPainter::new(), false);

        let rect = |id| tree.base(id).map(WidgetBase::rect);
        assert_eq!(rect(fixed).map(|r| (r.x, r.y, r.width)), Some((20.0, 30.0, 10.0)));
        assert_eq!(rect(content).map(|r| (r.width, r.height)), Some((7.0, 3.0)));
        assert_eq!(rect(fill).map(|r| (r.x, r.y, r.width, r.height)), Some((5.0, 5.0, 90.0, 40.0)));
        assert_eq!(tree.base(fill).map(WidgetBase::width_policy), Some(SizePolicy::Expanding));
    }

    #[test]
    fn test_measure_is_far_edge_plus_padding() {
        let (mut tree, stack) = setup();
        let a = tree.insert(Block, Props::fixed(10.0, 10.0));
        tree.add_child(stack, a);
        tree.move_to(a, point(30.0, 5.0));
        tree.set_policy(stack, SizePolicy::Content, SizePolicy::Content);
        let painter = RecordingPainter::new();
        assert_eq!(tree.measure(stack, &painter), size(50.0, 25.0));
    }
}
