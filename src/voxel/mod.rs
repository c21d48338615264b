//! Voxel data structures and world generation

pub mod block;
pub mod grid;
pub mod gpu;
pub mod procgen;
pub mod world;

pub use block::Block;
pub use grid::VoxelGrid;
pub use gpu::VoxelTexture;
pub use procgen::{TreeParams, TreePlacer};
pub use world::{generate_world, WorldStats};

/// Side of the grid the viewer generates and renders
pub const WORLD_SIZE: usize = 256;

/// The viewer's world grid
pub type World = VoxelGrid<WORLD_SIZE>;
