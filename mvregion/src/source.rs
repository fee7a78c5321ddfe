//! # Motion grid sources

use crate::grid::MotionGrid;
use anyhow::Result;

/// Producer of per-frame motion grids, such as a camera or a recorded capture.
pub trait MotionSource {
    /// Read the next frame.
    ///
    /// This function overwrites `grid` with the next frame of the stream and returns `Ok(true)`.
    /// At the end of the stream `Ok(false)` is returned and `grid` is left untouched. If there is
    /// an error while reading, `Err` is returned.
    fn next_frame(&mut self, grid: &mut MotionGrid) -> Result<bool>;

    /// Get the grid dimensions of the stream, as `(width, height)`.
    fn dim(&self) -> (usize, usize);

    /// Index of the last frame returned by `next_frame`.
    fn frame_index(&self) -> usize;
}
