//! RenderNode - per-widget dirty state and child z-order cache
//!
//! Each widget lazily owns one `RenderNode`. It tracks:
//! - `LAYOUT` - size/position stale (also drops the memoized measurement)
//! - `PAINT` - pixels stale, no re-layout implied
//! - `SUBTREE` - some descendant is dirty (prunes the repaint walk)
//!
//! Flags raised while a node is being repainted are carried over by
//! `clear_dirty`, so dirt produced by a paint step shows up on the next frame
//! instead of being wiped.
//!
//! Container nodes also hold the canonical child list (insertion order) and a
//! memoized stable sort of it by z-index. Paint order is that sort ascending,
//! hit-test order is the same sequence reversed, so ties keep insertion order
//! in both directions.

use std::cell::Cell;

use bitflags::bitflags;

use super::WidgetId;
use crate::types::Size;

bitflags! {
    /// Invalidation flags of a [`RenderNode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const LAYOUT = 1 << 0;
        const PAINT = 1 << 1;
        const SUBTREE = 1 << 2;
    }
}

#[derive(Debug)]
pub struct RenderNode {
    flags: DirtyFlags,
    painting: bool,
    raised_while_painting: DirtyFlags,
    children: Vec<WidgetId>,
    sorted: Vec<WidgetId>,
    order_valid: bool,
    measured: Cell<Option<Size>>,
}

impl Default for RenderNode {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode {
    /// New node, everything dirty.
    pub fn new() -> Self {
        Self {
            flags: DirtyFlags::all(),
            painting: false,
            raised_while_painting: DirtyFlags::empty(),
            children: Vec::new(),
            sorted: Vec::new(),
            order_valid: false,
            measured: Cell::new(None),
        }
    }

    // =========================================================================
    // DIRTY FLAGS
    // =========================================================================

    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    pub fn is_dirty(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn is_layout_dirty(&self) -> bool {
        self.flags.contains(DirtyFlags::LAYOUT)
    }

    pub fn is_paint_dirty(&self) -> bool {
        self.flags.contains(DirtyFlags::PAINT)
    }

    pub fn is_subtree_dirty(&self) -> bool {
        self.flags.contains(DirtyFlags::SUBTREE)
    }

    fn raise(&mut self, flags: DirtyFlags) {
        self.flags.insert(flags);
        if self.painting {
            self.raised_while_painting.insert(flags);
        }
    }

    /// Needs re-measure, so it needs repainting too.
    pub fn mark_layout_dirty(&mut self) {
        self.raise(DirtyFlags::LAYOUT | DirtyFlags::PAINT);
        self.measured.set(None);
    }

    pub fn mark_paint_dirty(&mut self) {
        self.raise(DirtyFlags::PAINT);
    }

    /// Returns `true` if the flag was newly set (and will survive the
    /// `clear_dirty` that ends the current paint, if one is running).
    pub fn mark_subtree_dirty(&mut self) -> bool {
        let was = if self.painting {
            self.raised_while_painting.contains(DirtyFlags::SUBTREE)
        } else {
            self.is_subtree_dirty()
        };
        self.raise(DirtyFlags::SUBTREE);
        !was
    }

    /// The paint step of this node starts now.
    pub fn begin_paint(&mut self) {
        self.painting = true;
        self.raised_while_painting = DirtyFlags::empty();
    }

    pub fn is_painting(&self) -> bool {
        self.painting
    }

    /// Called by the parent right after it repainted this node. Resets all
    /// flags except those raised again during the paint itself.
    pub fn clear_dirty(&mut self) {
        self.flags = if self.painting {
            self.raised_while_painting
        } else {
            DirtyFlags::empty()
        };
        self.painting = false;
        self.raised_while_painting = DirtyFlags::empty();
    }

    // =========================================================================
    // MEASURE MEMO
    // =========================================================================

    pub fn cached_measure(&self) -> Option<Size> {
        if self.is_layout_dirty() {
            return None;
        }
        self.measured.get()
    }

    pub fn store_measure(&self, size: Size) {
        self.measured.set(Some(size));
    }

    // =========================================================================
    // CHILDREN / Z-ORDER
    // =========================================================================

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn push_child(&mut self, child: WidgetId) {
        self.children.push(child);
        self.order_valid = false;
    }

    pub fn insert_child(&mut self, index: usize, child: WidgetId) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        self.order_valid = false;
    }

    /// Returns `true` if `child` was present.
    pub fn remove_child(&mut self, child: WidgetId) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        let removed = self.children.len() != before;
        if removed {
            self.order_valid = false;
        }
        removed
    }

    /// A child's z-index changed.
    pub fn invalidate_order(&mut self) {
        self.order_valid = false;
    }

    pub fn is_order_valid(&self) -> bool {
        self.order_valid
    }

    /// Stable sort by z-index, recomputed only when invalidated.
    pub fn sorted_children(&mut self, z_of: impl Fn(WidgetId) -> i32) -> &[WidgetId] {
        if !self.order_valid {
            self.sorted.clear();
            self.sorted.extend_from_slice(&self.children);
            // slice::sort_by_key is stable: equal z keeps insertion order
            self.sorted.sort_by_key(|&id| z_of(id));
            self.order_valid = true;
        }
        self.sorted_view()
    }

    /// Background to foreground.
    pub fn iter_paint_order(
        &mut self,
        z_of: impl Fn(WidgetId) -> i32,
    ) -> impl DoubleEndedIterator<Item = WidgetId> + '_ {
        self.sorted_children(z_of).iter().copied()
    }

    /// Foreground to background.
    pub fn iter_hit_test_order(
        &mut self,
        z_of: impl Fn(WidgetId) -> i32,
    ) -> impl Iterator<Item = WidgetId> + '_ {
        self.sorted_children(z_of).iter().rev().copied()
    }

    fn sorted_view(&self) -> &[WidgetId] {
        debug_assert!(self.order_valid, "z-order cache read while stale");
        &self.sorted
    }
}
