//! # Connected region extraction

use crate::mask::MovementMask;
use crate::rect::Rectangle;
use log::*;

/// Connectivity search over a movement mask.
///
/// Implementations must return one tightly bounding rectangle per 8-connected group of moving
/// cells. An empty mask yields no rectangles.
pub trait ComponentFinder {
    fn bounding_rects(&self, mask: &MovementMask) -> Vec<Rectangle>;
}

/// Flood fill based connectivity search.
///
/// Groups are reported in the row-major order of their first (top-left most) cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloodFill;

impl ComponentFinder for FloodFill {
    fn bounding_rects(&self, mask: &MovementMask) -> Vec<Rectangle> {
        let (width, height) = mask.dim();
        let mut visited = vec![false; width * height];
        let mut rects = vec![];

        for y in 0..height {
            for x in 0..width {
                if !mask.get(x, y) || visited[y * width + x] {
                    continue;
                }

                visited[y * width + x] = true;
                let mut to_fill = vec![(x, y); 1];
                let (mut min, mut max) = ((x, y), (x, y));

                while let Some((x, y)) = to_fill.pop() {
                    min = (std::cmp::min(min.0, x), std::cmp::min(min.1, y));
                    max = (std::cmp::max(max.0, x), std::cmp::max(max.1, y));

                    let neighbor_offs = (-1..=1).flat_map(|x| (-1..=1).map(move |y| (x, y)));

                    // Go through each neighbor and add any unvisited moving cells.
                    for (x, y) in neighbor_offs
                        .map(|(ox, oy)| (x as isize + ox, y as isize + oy))
                        .filter(|&(ox, oy)| {
                            (0..width as isize).contains(&ox) && (0..height as isize).contains(&oy)
                        })
                        .map(|(x, y)| (x as usize, y as usize))
                    {
                        if mask.get(x, y) && !visited[y * width + x] {
                            visited[y * width + x] = true;
                            to_fill.push((x, y));
                        }
                    }
                }

                rects.push(Rectangle::new(
                    min.0,
                    min.1,
                    max.0 - min.0 + 1,
                    max.1 - min.1 + 1,
                ));
            }
        }

        rects
    }
}

/// Turns a movement mask into candidate rectangles.
pub struct RegionExtractor<F = FloodFill> {
    finder: F,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(FloodFill)
    }
}

impl<F: ComponentFinder> RegionExtractor<F> {
    pub fn new(finder: F) -> Self {
        Self { finder }
    }

    /// Extract bounding rectangles of all moving groups.
    ///
    /// Rectangles with area above `max_area` are dropped, as they are more likely to be lighting
    /// changes than objects.
    pub fn extract(&self, mask: &MovementMask, max_area: usize) -> Vec<Rectangle> {
        let mut rects = self.finder.bounding_rects(mask);
        rects.retain(|r| {
            let keep = r.area() <= max_area;
            if !keep {
                trace!("dropping oversized {r:?}");
            }
            keep
        });
        rects
    }
}
