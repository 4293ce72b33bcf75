use geo::{Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{errors::Result, try_tuple_cast};

/// Pixel bounds of one block of a raster.
///
/// Defined by:
///     - `offset`: Coords of top left pixel of the block,
///         with origin at top left pixel of raster.
///     - `shape`: (W, H) a.ka. column row.
///
/// In the underlying impl `offset` is given by `.min`,
/// and `shape` by `(.width, .height)`.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct BlockBounds(Rect<usize>);

impl BlockBounds {
    pub fn new(offset: (usize, usize), shape: (usize, usize)) -> Self {
        let offset = Coord::from(offset);
        let max = offset + Coord::from(shape);
        Self(Rect::new(offset, max))
    }

    /// Coords of the top left pixel of the block.
    pub fn offset(&self) -> Coord<usize> {
        self.0.min()
    }

    /// (width, height)
    pub fn shape(&self) -> Coord<usize> {
        Coord {
            x: self.0.width(),
            y: self.0.height(),
        }
    }

    /// Array shape (H, W)
    pub fn array_shape(&self) -> (usize, usize) {
        (self.0.height(), self.0.width())
    }

    /// Offset as the signed window origin GDAL expects.
    pub fn window(&self) -> Result<(isize, isize)> {
        try_tuple_cast(self.offset().x_y())
    }
}

/// Row-major sweep of blocks over a raster extent.
///
/// Blocks on the last row and column are clipped to the extent,
/// so the emitted blocks tile it with no gaps and no overlaps.
#[derive(Debug, Clone, Copy)]
pub struct BlockGrid {
    /// Raster (width, height).
    extent: (usize, usize),
    /// Nominal block (width, height).
    block: (usize, usize),
}

impl BlockGrid {
    pub fn new(extent: (usize, usize), block: (usize, usize)) -> Self {
        // Degenerate block sizes would never advance.
        let block = (block.0.max(1), block.1.max(1));
        Self { extent, block }
    }

    pub fn extent(&self) -> (usize, usize) {
        self.extent
    }

    pub fn block(&self) -> (usize, usize) {
        self.block
    }

    pub fn len(&self) -> usize {
        self.extent.0.div_ceil(self.block.0) * self.extent.1.div_ceil(self.block.1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Blocks {
        Blocks {
            grid: *self,
            offset: (0, 0),
        }
    }
}

impl IntoIterator for &BlockGrid {
    type Item = BlockBounds;
    type IntoIter = Blocks;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Blocks {
    grid: BlockGrid,
    /// Offset of the next block.
    offset: (usize, usize),
}

impl Iterator for Blocks {
    type Item = BlockBounds;

    fn next(&mut self) -> Option<Self::Item> {
        let (width, height) = self.grid.extent;
        let (block_width, block_height) = self.grid.block;
        let (x, y) = self.offset;
        if width == 0 || y >= height {
            return None;
        }

        let cols = block_width.min(width - x);
        let rows = block_height.min(height - y);

        self.offset = if x + block_width >= width {
            (0, y + block_height)
        } else {
            (x + block_width, y)
        };

        Some(BlockBounds::new((x, y), (cols, rows)))
    }
}
