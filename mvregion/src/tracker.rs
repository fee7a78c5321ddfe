//! # Tracker hand-off

use crate::aggregate::Region;

/// Regions found in a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize))]
pub struct FrameMotionEvent {
    pub frame: usize,
    pub regions: Vec<Region>,
}

/// Multi-frame object tracker consuming per-frame regions.
pub trait Tracker {
    /// Called once, when the grid dimensions become known.
    ///
    /// # Arguments
    ///
    /// * `rows` - number of block rows in every frame.
    /// * `cols` - number of block columns in every frame.
    fn setup_sizes(&mut self, rows: usize, cols: usize) {
        let _ = (rows, cols);
    }

    /// Called for every analysed frame. An empty region list is a valid update.
    fn update_tracks(&mut self, event: &FrameMotionEvent);
}

/// Records every event.
impl Tracker for Vec<FrameMotionEvent> {
    fn update_tracks(&mut self, event: &FrameMotionEvent) {
        self.push(event.clone());
    }
}

impl<T: Tracker + ?Sized> Tracker for &mut T {
    fn setup_sizes(&mut self, rows: usize, cols: usize) {
        (**self).setup_sizes(rows, cols)
    }

    fn update_tracks(&mut self, event: &FrameMotionEvent) {
        (**self).update_tracks(event)
    }
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    fn setup_sizes(&mut self, rows: usize, cols: usize) {
        (**self).setup_sizes(rows, cols)
    }

    fn update_tracks(&mut self, event: &FrameMotionEvent) {
        (**self).update_tracks(event)
    }
}
