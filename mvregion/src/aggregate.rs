//! # Noise rejection and vector aggregation

use crate::config::AnalyserConfig;
use crate::grid::MotionGrid;
use crate::rect::Rectangle;
use log::*;
use nalgebra as na;

/// Merged rectangle believed to be the footprint of a single moving object.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize))]
pub struct Region {
    pub rect: Rectangle,
    /// Composite velocity in blocks per frame.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_vector"))]
    pub vector: na::Vector2<f32>,
    /// Raw SAD for single blocks, SAD variance for larger regions.
    pub confidence: f32,
}

#[cfg(feature = "serde")]
fn serialize_vector<S: ::serde::Serializer>(
    vector: &na::Vector2<f32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    use ::serde::ser::SerializeStruct;

    let mut s = serializer.serialize_struct("Vector", 2)?;
    s.serialize_field("vx", &vector.x)?;
    s.serialize_field("vy", &vector.y)?;
    s.end()
}

/// Rejects low variance regions and computes composite vectors of the rest.
///
/// Single blocks keep their raw vector. A single block with SAD below the threshold is counted as
/// a reject, but still reported.
///
/// Larger regions are kept only if the SAD variance within them is at least twice the threshold.
/// Uniform sensor noise spread over many blocks has low variance, while the silhouette of an
/// actual object produces a lot of it. The composite vector is the mean of all vectors in the
/// region.
#[derive(Clone, Copy, Debug)]
pub struct VectorAggregator {
    max_area: usize,
    sad_threshold: f32,
}

impl From<&AnalyserConfig> for VectorAggregator {
    fn from(config: &AnalyserConfig) -> Self {
        Self {
            max_area: config.max_area,
            sad_threshold: config.sad_threshold as f32,
        }
    }
}

impl VectorAggregator {
    /// Produce regions from merged rectangles.
    ///
    /// Returns the surviving regions along with the number of rejection signals raised.
    pub fn aggregate(&self, grid: &MotionGrid, rects: &[Rectangle]) -> (Vec<Region>, usize) {
        let mut rejects = 0;

        let regions = rects
            .iter()
            .filter_map(|&rect| {
                if rect.area() > self.max_area {
                    warn!("merged region too large ({} > {})", rect.area(), self.max_area);
                    rejects += 1;
                    return None;
                }

                if rect.w < 2 && rect.h < 2 {
                    let block = grid.get(rect.x, rect.y);
                    let confidence = block.sad as f32;

                    if confidence < self.sad_threshold {
                        rejects += 1;
                    }

                    return Some(Region {
                        rect,
                        vector: na::Vector2::new(block.vx as f32, block.vy as f32),
                        confidence,
                    });
                }

                let (mean, variance) = sad_stats(grid, rect);
                trace!("{rect:?}: sad mean {mean}, variance {variance}");

                if variance < 2.0 * self.sad_threshold {
                    rejects += 1;
                    return None;
                }

                Some(Region {
                    rect,
                    vector: mean_vector(grid, rect),
                    confidence: variance,
                })
            })
            .collect();

        (regions, rejects)
    }
}

/// Mean and population variance of SAD within a rectangle.
fn sad_stats(grid: &MotionGrid, rect: Rectangle) -> (f32, f32) {
    let n = rect.area() as f64;
    let mean = grid.window(rect).map(|b| b.sad as f64).sum::<f64>() / n;
    let variance = grid
        .window(rect)
        .map(|b| (b.sad as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean as f32, variance as f32)
}

fn mean_vector(grid: &MotionGrid, rect: Rectangle) -> na::Vector2<f32> {
    let sum = grid
        .window(rect)
        .fold(na::Vector2::<f64>::zeros(), |acc, b| {
            acc + na::Vector2::new(b.vx as f64, b.vy as f64)
        });
    (sum / rect.area() as f64).cast::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MotionBlock;
    use assert_approx_eq::assert_approx_eq;

    fn aggregator() -> VectorAggregator {
        VectorAggregator::from(&AnalyserConfig {
            sad_threshold: 60,
            max_area: 40,
            ..Default::default()
        })
    }

    #[test]
    fn single_block_keeps_raw_vector() {
        let mut grid = MotionGrid::new(30, 40);
        grid.set(20, 20, MotionBlock::new(-2, -2, 90));

        let (regions, rejects) = aggregator().aggregate(&grid, &[Rectangle::new(20, 20, 1, 1)]);

        assert_eq!(rejects, 0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].vector, na::Vector2::new(-2.0, -2.0));
        assert_eq!(regions[0].confidence, 90.0);
    }

    #[test]
    fn weak_single_block_is_counted_but_kept() {
        let mut grid = MotionGrid::new(30, 40);
        grid.set(3, 4, MotionBlock::new(5, 1, 10));

        let (regions, rejects) = aggregator().aggregate(&grid, &[Rectangle::new(3, 4, 1, 1)]);

        assert_eq!(rejects, 1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].vector, na::Vector2::new(5.0, 1.0));
    }

    #[test]
    fn uniform_sad_is_rejected() {
        let mut grid = MotionGrid::new(30, 40);
        grid.fill(MotionBlock::new(4, 4, 500));

        let (regions, rejects) = aggregator().aggregate(&grid, &[Rectangle::new(0, 0, 4, 4)]);

        assert!(regions.is_empty());
        assert_eq!(rejects, 1);
    }

    #[test]
    fn varied_region_gets_mean_vector() {
        let mut grid = MotionGrid::new(30, 40);
        grid.set(5, 5, MotionBlock::new(3, 0, 80));
        grid.set(6, 5, MotionBlock::new(4, 1, 80));
        grid.set(5, 6, MotionBlock::new(0, 0, 0));
        grid.set(6, 6, MotionBlock::new(-1, 3, 300));

        let (regions, rejects) = aggregator().aggregate(&grid, &[Rectangle::new(5, 5, 2, 2)]);

        assert_eq!(rejects, 0);
        assert_eq!(regions.len(), 1);
        assert_approx_eq!(regions[0].vector.x, 1.5);
        assert_approx_eq!(regions[0].vector.y, 1.0);
        // Mean 115, deviations -35, -35, -115, 185.
        assert_approx_eq!(regions[0].confidence, 12475.0, 0.01);
    }

    #[test]
    fn oversized_region_is_rejected() {
        let mut grid = MotionGrid::new(30, 40);
        grid.set(0, 0, MotionBlock::new(3, 3, 1000));

        let (regions, rejects) = aggregator().aggregate(&grid, &[Rectangle::new(0, 0, 7, 6)]);

        assert!(regions.is_empty());
        assert_eq!(rejects, 1);
    }
}
