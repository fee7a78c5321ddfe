//! # Grid-aligned rectangles

/// Axis aligned rectangle in grid cell units.
///
/// `w` and `h` are always positive for rectangles produced by the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Rectangle {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rectangle {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> usize {
        self.w * self.h
    }

    /// Exclusive right edge.
    pub fn right(&self) -> usize {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> usize {
        self.y + self.h
    }

    /// Returns true if `other` lies fully within `self`. Shared edges count as inside.
    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let x = std::cmp::min(self.x, other.x);
        let y = std::cmp::min(self.y, other.y);
        let right = std::cmp::max(self.right(), other.right());
        let bottom = std::cmp::max(self.bottom(), other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// Grow the rectangle by `margin` on every side, clamped to a `cols` by `rows` grid.
    pub fn expand(&self, margin: usize, cols: usize, rows: usize) -> Self {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = std::cmp::min(self.right() + margin, cols);
        let bottom = std::cmp::min(self.bottom() + margin, rows);
        Self::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    /// Iterate `(x, y)` coordinates of every covered cell, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let Self { x, y, w, h } = *self;
        (y..y + h).flat_map(move |y| (x..x + w).map(move |x| (x, y)))
    }
}
