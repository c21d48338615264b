//! Terrain and trees in one pass

use std::time::{Duration, Instant};

use super::grid::VoxelGrid;
use super::procgen::{PlacementReport, TreeParams, TreePlacer};
use crate::terrain::{TerrainGenerator, TerrainParams, TerrainStats};

/// What a world generation run produced
#[derive(Clone, Copy, Debug)]
pub struct WorldStats {
    pub terrain: TerrainStats,
    pub trees: PlacementReport,
    pub elapsed: Duration,
}

/// Generate terrain then scatter trees into a fresh grid. The result depends
/// only on the parameters, never on time or global state.
pub fn generate_world<const SIZE: usize>(
    terrain: &TerrainParams,
    trees: &TreeParams,
) -> (VoxelGrid<SIZE>, WorldStats) {
    let start = Instant::now();
    let mut grid = VoxelGrid::<SIZE>::new();

    let generator = TerrainGenerator::new(terrain.clone());
    let terrain_stats = generator.generate(&mut grid);
    log::debug!(
        "Terrain heights {}..={}, {} flooded columns",
        terrain_stats.min_height,
        terrain_stats.max_height,
        terrain_stats.flooded_columns
    );

    let placer = TreePlacer::new(trees.clone(), terrain.water_level_voxels(SIZE));
    let report = placer.place_all(&mut grid);

    let elapsed = start.elapsed();
    log::info!(
        "Generated {}³ world in {:.1}ms: {}/{} trees placed, {} leaves",
        SIZE,
        elapsed.as_secs_f64() * 1000.0,
        report.placed,
        report.requested,
        report.leaves
    );
    if report.rejected() > 0 {
        log::debug!(
            "Tree sites rejected: {} no ground, {} no headroom, {} waterline, {} skipped",
            report.no_ground,
            report.no_headroom,
            report.waterline,
            report.skipped
        );
    }

    (
        grid,
        WorldStats {
            terrain: terrain_stats,
            trees: report,
            elapsed,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Block;

    #[test]
    fn test_world_has_every_layer() {
        let (grid, stats) =
            generate_world::<64>(&TerrainParams::default(), &TreeParams::for_grid(64));

        assert!(grid.count(Block::Stone) > 0);
        assert!(grid.count(Block::Grass) > 0);
        assert_eq!(stats.trees.requested, 30);
        assert_eq!(stats.trees.placed + stats.trees.rejected(), 30);
        assert_eq!(grid.count(Block::Leaf), stats.trees.leaves);
    }

    #[test]
    fn test_grass_never_below_water() {
        let terrain = TerrainParams::default();
        let (grid, _) = generate_world::<64>(&terrain, &TreeParams::for_grid(64));
        let water = terrain.water_level_voxels(64);

        for z in 0..64 {
            for x in 0..64 {
                for y in 0..water.saturating_sub(1) {
                    assert_ne!(grid.get(x, y, z), Block::Grass, "grass at ({x}, {y}, {z})");
                }
            }
        }
    }
}
