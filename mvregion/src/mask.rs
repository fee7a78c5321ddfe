//! # Movement classification
//!
//! Decides which blocks of a grid are moving, and whether the frame as a whole moves too much to
//! contain discrete objects.

use crate::config::AnalyserConfig;
use crate::grid::MotionGrid;

/// Boolean grid marking moving blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementMask {
    cells: Vec<bool>,
    width: usize,
}

impl MovementMask {
    /// Create an empty mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![false; width * height],
            width,
        }
    }

    /// Get width and height of the mask.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.cells.len() / self.width)
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[self.width * y + x]
    }

    pub fn set(&mut self, x: usize, y: usize, moving: bool) {
        self.cells[self.width * y + x] = moving;
    }

    /// Number of moving cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }
}

/// Per-block motion classifier.
///
/// A block is moving when its Manhattan magnitude lies strictly between `v_min` and `v_max`, and,
/// when the confidence mask is enabled, its SAD is strictly above the threshold.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdMasker {
    v_min: u32,
    v_max: u32,
    sad_threshold: u32,
    confidence_mask: bool,
}

impl From<&AnalyserConfig> for ThresholdMasker {
    fn from(config: &AnalyserConfig) -> Self {
        let clamp = |v: usize| std::cmp::min(v, u32::MAX as usize) as u32;

        Self {
            v_min: clamp(config.v_min),
            v_max: clamp(config.v_max),
            sad_threshold: clamp(config.sad_threshold),
            confidence_mask: config.confidence_mask,
        }
    }
}

impl ThresholdMasker {
    /// Classify every block of the grid.
    pub fn mask(&self, grid: &MotionGrid) -> MovementMask {
        let (width, height) = grid.dim();
        let mut mask = MovementMask::new(width, height);

        grid.iter()
            .filter(|(_, _, block)| {
                let mag = block.magnitude();
                mag > self.v_min
                    && mag < self.v_max
                    && (!self.confidence_mask || block.sad as u32 > self.sad_threshold)
            })
            .for_each(|(x, y, _)| mask.set(x, y, true));

        mask
    }
}

/// Frame-level guard against global motion.
///
/// Frames where more than an eighth of the grid moves are treated as camera or lighting changes
/// rather than a collection of objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementCap {
    cells: usize,
}

impl MovementCap {
    /// Derive the cap from grid dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: width * height,
        }
    }

    /// Maximum number of moving cells a frame may have.
    pub fn limit(&self) -> f32 {
        self.cells as f32 / 8.0
    }

    /// Check whether `moving` cells exceed the cap.
    pub fn exceeded(&self, moving: usize) -> bool {
        moving * 8 > self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MotionBlock;

    fn config() -> AnalyserConfig {
        AnalyserConfig {
            v_min: 2,
            v_max: 40,
            sad_threshold: 60,
            ..Default::default()
        }
    }

    #[test]
    fn magnitude_band_is_exclusive() {
        let mut grid = MotionGrid::new(1, 5);
        grid.set(0, 0, MotionBlock::new(1, 1, 100));
        grid.set(1, 0, MotionBlock::new(2, -1, 100));
        grid.set(2, 0, MotionBlock::new(-20, -19, 100));
        grid.set(3, 0, MotionBlock::new(20, 20, 100));
        grid.set(4, 0, MotionBlock::new(0, 3, 100));

        let mask = ThresholdMasker::from(&config()).mask(&grid);

        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(mask.get(2, 0));
        assert!(!mask.get(3, 0));
        assert!(mask.get(4, 0));
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn low_sad_is_not_moving() {
        let mut grid = MotionGrid::new(4, 4);
        grid.fill(MotionBlock::new(3, 3, 60));

        let mask = ThresholdMasker::from(&config()).mask(&grid);
        assert!(mask.is_empty());

        let lenient = AnalyserConfig {
            confidence_mask: false,
            ..config()
        };
        let mask = ThresholdMasker::from(&lenient).mask(&grid);
        assert_eq!(mask.count(), 16);
    }

    #[test]
    fn cap_is_an_eighth() {
        let cap = MovementCap::new(40, 30);
        assert_eq!(cap.limit(), 150.0);
        assert!(!cap.exceeded(150));
        assert!(cap.exceeded(151));

        let cap = MovementCap::new(3, 3);
        assert!(!cap.exceeded(1));
        assert!(cap.exceeded(2));
    }
}
