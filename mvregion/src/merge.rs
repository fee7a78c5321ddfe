//! # Rectangle merging
//!
//! Hardware motion grids tend to split a single moving object into several nearby groups of
//! blocks. The merger fuses them back together by growing each incoming rectangle by a small
//! margin and joining it with everything it then touches.
//!
//! Merging is greedy and order dependent. Rectangles are inserted one by one, and an entry that
//! already grew is never revisited, so the same input in a different order may produce a
//! different (usually equivalent) set of clusters. It is also not transitive: a rectangle bridging
//! two existing entries grows both of them, instead of collapsing them into one.

use crate::rect::Rectangle;
use log::*;

/// Distance (in blocks) within which rectangles are considered to be parts of the same object.
pub const MERGE_MARGIN: usize = 3;

/// Incremental rectangle clustering.
#[derive(Clone, Debug, Default)]
pub struct RectangleMerger {
    rects: Vec<Rectangle>,
    width: usize,
    height: usize,
}

impl RectangleMerger {
    /// Create a merger for a grid of given width and height.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            rects: vec![],
            width,
            height,
        }
    }

    /// Merge a batch of rectangles, in order.
    pub fn merge(
        width: usize,
        height: usize,
        rects: impl IntoIterator<Item = Rectangle>,
    ) -> Vec<Rectangle> {
        let mut merger = Self::new(width, height);
        rects.into_iter().for_each(|r| merger.insert(r));
        merger.into_rects()
    }

    /// Currently accumulated rectangles.
    pub fn rects(&self) -> &[Rectangle] {
        &self.rects
    }

    pub fn into_rects(self) -> Vec<Rectangle> {
        self.rects
    }

    /// Insert a new rectangle into the accumulated list.
    ///
    /// For every existing entry, in order:
    ///
    /// 1. if the new rectangle is within the entry, it is discarded;
    /// 2. if the entry is within the new rectangle, the entry is removed;
    /// 3. if the entry is close to the new rectangle, it is replaced by the union of both.
    ///
    /// The new rectangle is appended only if none of the above happened, except for step 2.
    pub fn insert(&mut self, new: Rectangle) {
        let grown = new.expand(MERGE_MARGIN, self.width, self.height);
        let mut merged = false;
        let mut i = 0;

        while i < self.rects.len() {
            let old = self.rects[i];

            if old.contains(&new) {
                trace!("{new:?} within {old:?}");
                return;
            }

            if new.contains(&old) {
                trace!("{old:?} within {new:?}");
                self.rects.remove(i);
                continue;
            }

            if Self::close(&old, &new, &grown) {
                let union = old.union(&new);
                trace!("join {old:?} and {new:?} into {union:?}");
                self.rects[i] = union;
                merged = true;
            }

            i += 1;
        }

        if !merged {
            self.rects.push(new);
        }
    }

    /// Check if `old` overlaps with `grown`, the expanded `new` rectangle.
    ///
    /// Each axis overlaps when the span covered by both intervals is not larger than their raw
    /// extents plus the margin on both sides.
    fn close(old: &Rectangle, new: &Rectangle, grown: &Rectangle) -> bool {
        if grown.contains(old) {
            return true;
        }

        let span = |a: usize, a_end: usize, b: usize, b_end: usize| {
            std::cmp::max(a_end, b_end) - std::cmp::min(a, b)
        };

        let x_span = span(old.x, old.right(), grown.x, grown.right());
        let y_span = span(old.y, old.bottom(), grown.y, grown.bottom());

        x_span <= old.w + new.w + 2 * MERGE_MARGIN && y_span <= old.h + new.h + 2 * MERGE_MARGIN
    }
}
