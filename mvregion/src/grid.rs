//! # Motion block grid

use crate::error::Error;
use crate::rect::Rectangle;
use anyhow::Result;
use bytemuck::{Pod, Zeroable};

/// Single cell of a hardware motion estimation grid.
///
/// The layout matches the records produced by common hardware encoders: two signed displacement
/// components followed by the sum of absolute differences of the matched block. Raw frame
/// buffers can be reinterpreted as slices of this type.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MotionBlock {
    pub vx: i8,
    pub vy: i8,
    pub sad: u16,
}

impl MotionBlock {
    pub fn new(vx: i8, vy: i8, sad: u16) -> Self {
        Self { vx, vy, sad }
    }

    /// Manhattan magnitude of the displacement.
    pub fn magnitude(&self) -> u32 {
        self.vx.unsigned_abs() as u32 + self.vy.unsigned_abs() as u32
    }
}

/// Fixed size grid of motion blocks, stored in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionGrid {
    blocks: Vec<MotionBlock>,
    width: usize,
}

impl MotionGrid {
    /// Create a new zeroed grid.
    ///
    /// # Arguments
    ///
    /// * `rows` - number of block rows.
    /// * `cols` - number of block columns.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            blocks: vec![MotionBlock::default(); rows * cols],
            width: cols,
        }
    }

    /// Create a grid from row-major blocks.
    pub fn from_blocks(rows: usize, cols: usize, blocks: Vec<MotionBlock>) -> Result<Self> {
        if blocks.len() != rows * cols {
            return Err(Error::BufferSize {
                expected: rows * cols * std::mem::size_of::<MotionBlock>(),
                got: blocks.len() * std::mem::size_of::<MotionBlock>(),
            }
            .into());
        }

        Ok(Self {
            blocks,
            width: cols,
        })
    }

    /// Create a grid from a raw frame buffer.
    ///
    /// The buffer holds `rows * cols` native-endian [`MotionBlock`] records. It does not need to
    /// be aligned.
    pub fn from_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Result<Self> {
        let mut grid = Self::new(rows, cols);
        grid.copy_from_bytes(bytes)?;
        Ok(grid)
    }

    /// Overwrite the grid contents with a raw frame buffer of the same dimensions.
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.blocks.len() * std::mem::size_of::<MotionBlock>();

        if bytes.len() != expected {
            return Err(Error::BufferSize {
                expected,
                got: bytes.len(),
            }
            .into());
        }

        for (block, raw) in self
            .blocks
            .iter_mut()
            .zip(bytes.chunks_exact(std::mem::size_of::<MotionBlock>()))
        {
            *block = bytemuck::pod_read_unaligned(raw);
        }

        Ok(())
    }

    /// Get the grid as a raw frame buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Get width and height of the grid.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.blocks.len() / self.width)
        }
    }

    pub fn rows(&self) -> usize {
        self.dim().1
    }

    pub fn cols(&self) -> usize {
        self.dim().0
    }

    /// Get the block at given column and row.
    pub fn get(&self, x: usize, y: usize) -> MotionBlock {
        self.blocks[self.width * y + x]
    }

    /// Set the block at given column and row.
    pub fn set(&mut self, x: usize, y: usize, block: MotionBlock) {
        self.blocks[self.width * y + x] = block;
    }

    /// Fill every block of the grid with the same value.
    pub fn fill(&mut self, block: MotionBlock) {
        self.blocks.fill(block);
    }

    /// Iterate every block of the grid.
    ///
    /// The resulting iterator yields `(x, y, block)` entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, MotionBlock)> + '_ {
        let width = self.width.max(1);
        self.blocks
            .iter()
            .enumerate()
            .map(move |(i, b)| (i % width, i / width, *b))
    }

    /// Iterate the blocks covered by a rectangle.
    pub fn window(&self, rect: Rectangle) -> impl Iterator<Item = MotionBlock> + '_ {
        rect.cells().map(move |(x, y)| self.get(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_layout() {
        let mut grid = MotionGrid::new(2, 3);
        grid.set(2, 1, MotionBlock::new(-3, 4, 0x1234));

        let bytes = grid.as_bytes().to_vec();
        assert_eq!(bytes.len(), 2 * 3 * 4);

        // Unaligned view of the same data.
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        let copy = MotionGrid::from_bytes(2, 3, &shifted[1..]).unwrap();

        assert_eq!(copy, grid);
        assert_eq!(copy.get(2, 1).vx, -3);
        assert_eq!(copy.get(2, 1).sad, 0x1234);
    }

    #[test]
    fn bad_buffer_size() {
        let err = MotionGrid::from_bytes(2, 3, &[0; 23]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::BufferSize {
                expected: 24,
                got: 23
            })
        ));
        assert!(MotionGrid::from_blocks(2, 2, vec![MotionBlock::default(); 3]).is_err());
    }

    #[test]
    fn iteration_order() {
        let mut grid = MotionGrid::new(2, 2);
        grid.set(1, 0, MotionBlock::new(1, 0, 0));
        grid.set(0, 1, MotionBlock::new(2, 0, 0));

        let order = grid.iter().map(|(x, y, b)| (x, y, b.vx)).collect::<Vec<_>>();
        assert_eq!(order, vec![(0, 0, 0), (1, 0, 1), (0, 1, 2), (1, 1, 0)]);
        assert_eq!(grid.dim(), (2, 2));
    }

    #[test]
    fn magnitude() {
        assert_eq!(MotionBlock::new(-128, 127, 0).magnitude(), 255);
        assert_eq!(MotionBlock::new(3, -1, 0).magnitude(), 4);
    }
}
