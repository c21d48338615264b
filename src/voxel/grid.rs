//! Dense cubic voxel grid

use super::block::Block;
use super::gpu::VoxelTexture;

/// A cube of `SIZE³` voxels, one [`Block`] byte per cell, addressed
/// `x + SIZE * (y + SIZE * z)`.
///
/// Coordinates handed to the accessors must lie in `[0, SIZE)`; anything else
/// is a bug in the caller and panics. The optional GPU mirror is created by
/// [`VoxelGrid::upload_to_gpu`] and owned exclusively by the grid.
pub struct VoxelGrid<const SIZE: usize> {
    voxels: Box<[u8]>,
    pub(super) texture: Option<VoxelTexture>,
}

impl<const SIZE: usize> VoxelGrid<SIZE> {
    /// Number of cells
    pub const VOLUME: usize = SIZE * SIZE * SIZE;

    /// Create an all-air grid
    pub fn new() -> Self {
        assert!(SIZE >= 2, "voxel grid needs at least 2 cells per side");
        Self {
            voxels: vec![Block::Air.as_u8(); Self::VOLUME].into_boxed_slice(),
            texture: None,
        }
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < SIZE && y < SIZE && z < SIZE,
            "voxel ({x}, {y}, {z}) outside grid of side {SIZE}"
        );
        x + SIZE * (y + SIZE * z)
    }

    /// Block at a cell
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        // Only `set` writes bytes, and it writes valid blocks
        Block::from_u8(self.voxels[Self::index(x, y, z)]).unwrap_or_default()
    }

    /// Overwrite a cell
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) {
        self.voxels[Self::index(x, y, z)] = block.as_u8();
    }

    /// Write `block` only if the cell is currently air. Returns whether the
    /// write happened.
    #[inline]
    pub fn set_if_air(&mut self, x: usize, y: usize, z: usize, block: Block) -> bool {
        let cell = &mut self.voxels[Self::index(x, y, z)];
        if *cell == Block::Air.as_u8() {
            *cell = block.as_u8();
            true
        } else {
            false
        }
    }

    /// Scan a column from the top down for the first solid (non-air,
    /// non-water) voxel. Returns the y just above it.
    pub fn ground_level(&self, x: usize, z: usize) -> Option<usize> {
        (0..SIZE)
            .rev()
            .find(|&y| self.get(x, y, z).is_ground())
            .map(|y| y + 1)
    }

    /// Number of cells holding `block`
    pub fn count(&self, block: Block) -> usize {
        let byte = block.as_u8();
        self.voxels.iter().filter(|&&b| b == byte).count()
    }

    /// Raw voxel bytes in upload order
    pub fn as_bytes(&self) -> &[u8] {
        &self.voxels
    }

    /// GPU mirror, present after [`VoxelGrid::upload_to_gpu`]
    pub fn texture(&self) -> Option<&VoxelTexture> {
        self.texture.as_ref()
    }
}

impl<const SIZE: usize> Default for VoxelGrid<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Grid = VoxelGrid<8>;

    #[test]
    fn test_new_grid_is_air() {
        let grid = Grid::new();
        assert_eq!(grid.as_bytes().len(), 512);
        assert_eq!(grid.count(Block::Air), 512);
        assert!(grid.texture().is_none());
    }

    #[test]
    fn test_index_layout() {
        let mut grid = Grid::new();
        grid.set(1, 2, 3, Block::Stone);
        assert_eq!(grid.as_bytes()[1 + 8 * (2 + 8 * 3)], Block::Stone.as_u8());
        assert_eq!(grid.get(1, 2, 3), Block::Stone);
    }

    #[test]
    fn test_set_if_air() {
        let mut grid = Grid::new();
        assert!(grid.set_if_air(0, 0, 0, Block::Leaf));
        assert!(!grid.set_if_air(0, 0, 0, Block::Wood));
        assert_eq!(grid.get(0, 0, 0), Block::Leaf);
    }

    #[test]
    fn test_ground_level_skips_water() {
        let mut grid = Grid::new();
        assert_eq!(grid.ground_level(4, 4), None);

        grid.set(4, 0, 4, Block::Stone);
        grid.set(4, 1, 4, Block::Dirt);
        grid.set(4, 2, 4, Block::Water);
        grid.set(4, 3, 4, Block::Water);
        assert_eq!(grid.ground_level(4, 4), Some(2));

        grid.set(4, 7, 4, Block::Leaf);
        assert_eq!(grid.ground_level(4, 4), Some(8));
    }

    #[test]
    #[should_panic(expected = "outside grid")]
    fn test_out_of_range_panics() {
        let grid = Grid::new();
        grid.get(8, 0, 0);
    }
}
