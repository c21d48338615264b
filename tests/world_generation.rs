//! Whole-world generation: determinism and the placement invariants

use voxglow::terrain::{TerrainGenerator, TerrainParams};
use voxglow::voxel::procgen::SiteOutcome;
use voxglow::voxel::{generate_world, Block, TreeParams, TreePlacer, VoxelGrid};

const SIZE: usize = 64;

fn params() -> (TerrainParams, TreeParams) {
    let trees = TreeParams::for_grid(SIZE);
    assert_eq!(trees.seed, 42);
    assert_eq!(trees.count, 30);
    (TerrainParams::default(), trees)
}

#[test]
fn test_world_is_byte_identical_across_runs() {
    let (terrain, trees) = params();
    let (a, stats_a) = generate_world::<SIZE>(&terrain, &trees);
    let (b, stats_b) = generate_world::<SIZE>(&terrain, &trees);

    assert_eq!(a.as_bytes(), b.as_bytes());
    assert_eq!(stats_a.trees, stats_b.trees);
    assert_eq!(stats_a.terrain, stats_b.terrain);
}

#[test]
fn test_seed_changes_forest() {
    let (terrain, trees) = params();
    let (a, _) = generate_world::<SIZE>(&terrain, &trees);
    let (b, _) = generate_world::<SIZE>(&terrain, &TreeParams { seed: 7, ..trees });

    let terrain_only = {
        let mut grid = VoxelGrid::<SIZE>::new();
        TerrainGenerator::new(terrain).generate(&mut grid);
        grid
    };
    // Both forests sit on the same terrain
    for (i, &t) in terrain_only.as_bytes().iter().enumerate() {
        if t != Block::Air.as_u8() && t != Block::Water.as_u8() {
            assert_eq!(a.as_bytes()[i], t);
            assert_eq!(b.as_bytes()[i], t);
        }
    }
    if a.count(Block::Wood) > 0 || b.count(Block::Wood) > 0 {
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}

#[test]
fn test_trees_only_fill_air_above_terrain() {
    let (terrain, trees) = params();
    let mut grid = VoxelGrid::<SIZE>::new();
    TerrainGenerator::new(terrain.clone()).generate(&mut grid);
    let before = grid.as_bytes().to_vec();

    let placer = TreePlacer::new(trees, terrain.water_level_voxels(SIZE));
    placer.place_all(&mut grid);

    for (i, (&old, &new)) in before.iter().zip(grid.as_bytes()).enumerate() {
        if new == Block::Leaf.as_u8() && old != new {
            assert_eq!(old, Block::Air.as_u8(), "leaf replaced block {old} at {i}");
        }
        if old != Block::Air.as_u8() && old != Block::Water.as_u8() {
            assert_eq!(old, new, "terrain changed at {i}");
        }
    }
}

#[test]
fn test_no_wood_below_ground() {
    let (terrain, trees) = params();
    let mut grid = VoxelGrid::<SIZE>::new();
    TerrainGenerator::new(terrain.clone()).generate(&mut grid);

    let ground: Vec<Option<usize>> = (0..SIZE * SIZE)
        .map(|i| grid.ground_level(i % SIZE, i / SIZE))
        .collect();

    TreePlacer::new(trees, terrain.water_level_voxels(SIZE)).place_all(&mut grid);

    for z in 0..SIZE {
        for x in 0..SIZE {
            let floor = ground[x + z * SIZE].unwrap_or(0);
            for y in 0..floor {
                assert_ne!(grid.get(x, y, z), Block::Wood, "wood below ground at ({x}, {y}, {z})");
            }
        }
    }
}

#[test]
fn test_waterline_site_rejected_without_writes() {
    let terrain = TerrainParams::default();
    let trees = TreeParams::for_grid(SIZE);
    let water_level = terrain.water_level_voxels(SIZE);

    // Flat stone with its surface 1 voxel below water level + margin
    let ground = water_level + trees.water_margin - 1;
    let mut grid = VoxelGrid::<SIZE>::new();
    for z in 0..SIZE {
        for x in 0..SIZE {
            for y in 0..ground {
                grid.set(x, y, z, Block::Stone);
            }
        }
    }
    let before = grid.as_bytes().to_vec();

    let placer = TreePlacer::new(trees, water_level);
    assert_eq!(
        placer.place_tree(&mut grid, SIZE / 2, SIZE / 2, 0),
        SiteOutcome::Waterline { ground }
    );
    assert_eq!(grid.as_bytes(), &before[..]);

    let report = placer.place_all(&mut grid);
    assert_eq!(report.placed, 0);
    assert_eq!(report.waterline, 30);
    assert_eq!(grid.as_bytes(), &before[..]);
}
