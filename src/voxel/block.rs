//! Block types stored one byte per voxel

use serde::{Deserialize, Serialize};

/// Closed set of block types. The discriminant is the byte stored in the grid
/// and uploaded to the GPU, so the raymarch shader's palette is indexed by it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Wood = 4,
    Leaf = 5,
    Water = 6,
}

impl Block {
    pub const ALL: [Block; 7] = [
        Block::Air,
        Block::Grass,
        Block::Dirt,
        Block::Stone,
        Block::Wood,
        Block::Leaf,
        Block::Water,
    ];

    /// Decode a stored byte. Returns `None` for bytes no block maps to.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Solid ground for tree placement: anything but air and water
    #[inline]
    pub fn is_ground(self) -> bool {
        !matches!(self, Block::Air | Block::Water)
    }
}
