//! Layout containers.
//!
//! - [`Stack`] - children keep their own positions; for overlays and
//!   z-ordered content
//! - [`Linear`] - column / row with the two-pass flex algorithm, spacing and
//!   scrolling
//!
//! Both run their layout as step one of their own redraw, so a subtree is
//! always laid out before it is painted.

mod linear;
mod stack;

pub use linear::*;
pub use stack::*;

use crate::engine::{LayoutCx, WidgetId};
use crate::types::{Rect, SizePolicy, point, size};

/// Size `child` by its policies inside `content`: expanding axes fill it,
/// the others take the measured size. With `anchor` the child is placed at
/// the content origin, otherwise only expanding axes are moved there.
pub fn fit_child(cx: &mut LayoutCx<'_>, child: WidgetId, content: Rect, anchor: bool) {
    let Some(base) = cx.base_of(child) else {
        return;
    };
    let (wp, hp, pos) = (base.width_policy(), base.height_policy(), base.pos());
    let measured = cx.measure(child);

    let width = if wp == SizePolicy::Expanding { content.width } else { measured.width };
    let height = if hp == SizePolicy::Expanding { content.height } else { measured.height };
    cx.resize_child(child, size(width, height));

    let x = if anchor || wp == SizePolicy::Expanding { content.x } else { pos.x };
    let y = if anchor || hp == SizePolicy::Expanding { content.y } else { pos.y };
    cx.move_child(child, point(x, y));
}
