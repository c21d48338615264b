//! Height-field terrain generation into a voxel grid

use serde::{Deserialize, Serialize};

use super::height::{HeightFunction, HeightModel, LayeredHeight, PerlinHeight, PerlinParams, SineHeight};
use crate::voxel::{Block, VoxelGrid};

/// Parameters controlling terrain generation.
///
/// Vertical quantities are fractions of the grid side so the same settings
/// produce comparable worlds at any grid size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Which height strategy to use
    pub height_model: HeightModel,
    pub sine: SineHeight,
    pub layered: LayeredHeight,
    pub perlin: PerlinParams,
    /// Thickness of the dirt band under the surface
    pub dirt_depth: f32,
    /// Columns whose surface is below this height are flooded up to it
    pub water_level: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height_model: HeightModel::default(),
            sine: SineHeight::default(),
            layered: LayeredHeight::default(),
            perlin: PerlinParams::default(),
            dirt_depth: 0.0625,
            water_level: 0.26,
        }
    }
}

impl TerrainParams {
    /// Dirt band thickness in voxels, at least one
    pub fn dirt_depth_voxels(&self, size: usize) -> usize {
        ((self.dirt_depth * size as f32) as usize).max(1)
    }

    /// Water surface height in voxels, never above the top cell
    pub fn water_level_voxels(&self, size: usize) -> usize {
        ((self.water_level.max(0.0) * size as f32) as usize).min(size - 1)
    }
}

/// Summary of one generation run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainStats {
    pub min_height: usize,
    pub max_height: usize,
    /// Columns whose surface is below water level
    pub flooded_columns: usize,
}

/// Fills every column of a grid from a [`HeightFunction`]
pub struct TerrainGenerator {
    params: TerrainParams,
    height: Box<dyn HeightFunction>,
}

impl TerrainGenerator {
    /// Create a generator using the strategy selected by `params.height_model`
    pub fn new(params: TerrainParams) -> Self {
        let height: Box<dyn HeightFunction> = match params.height_model {
            HeightModel::Sine => Box::new(params.sine.clone()),
            HeightModel::Layered => Box::new(params.layered.clone()),
            HeightModel::Perlin => Box::new(PerlinHeight::new(params.perlin.clone())),
        };
        Self { params, height }
    }

    /// Create a generator with a caller-supplied height strategy. Layering
    /// and water settings still come from `params`.
    pub fn with_height(params: TerrainParams, height: Box<dyn HeightFunction>) -> Self {
        Self { params, height }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Surface height of column `(x, z)`, clamped to `[1, size - 1]`
    pub fn column_height(&self, x: usize, z: usize, size: usize) -> usize {
        let fx = x as f32 / size as f32;
        let fz = z as f32 / size as f32;
        let raw = self.height.height(fx, fz, size);

        // NaN casts to 0 and is clamped like any other low value
        (raw as i64).clamp(1, size as i64 - 1) as usize
    }

    /// Fill every column of `grid`. Cells above the surface and above water
    /// are left untouched.
    pub fn generate<const SIZE: usize>(&self, grid: &mut VoxelGrid<SIZE>) -> TerrainStats {
        let dirt_depth = self.params.dirt_depth_voxels(SIZE);
        let water_level = self.params.water_level_voxels(SIZE);

        let mut stats = TerrainStats {
            min_height: SIZE,
            max_height: 0,
            flooded_columns: 0,
        };

        for z in 0..SIZE {
            for x in 0..SIZE {
                let height = self.column_height(x, z, SIZE);
                fill_column(grid, x, z, height, dirt_depth, water_level);

                stats.min_height = stats.min_height.min(height);
                stats.max_height = stats.max_height.max(height);
                if height < water_level {
                    stats.flooded_columns += 1;
                }
            }
        }

        stats
    }
}

/// Layer one column: grass (or dirt when submerged) on top, a dirt band,
/// stone below, then water from the surface up to `water_level`.
fn fill_column<const SIZE: usize>(
    grid: &mut VoxelGrid<SIZE>,
    x: usize,
    z: usize,
    height: usize,
    dirt_depth: usize,
    water_level: usize,
) {
    let top = height - 1;
    let dirt_start = height.saturating_sub(dirt_depth);

    for y in 0..height {
        let block = if y == top {
            if height >= water_level { Block::Grass } else { Block::Dirt }
        } else if y >= dirt_start {
            Block::Dirt
        } else {
            Block::Stone
        };
        grid.set(x, y, z, block);
    }

    for y in height..water_level {
        grid.set(x, y, z, Block::Water);
    }
}
