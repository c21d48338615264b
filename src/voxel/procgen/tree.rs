//! Deterministic tree scattering onto generated terrain
//!
//! Trees are a wooden trunk column topped by a layered canopy: a wide disk
//! for the lower layers and a narrow one for the top. Leaves only ever fill
//! air, so a tree can't eat into terrain or into another tree.

use serde::{Deserialize, Serialize};

use crate::voxel::{Block, VoxelGrid};

/// Simple deterministic RNG using hash function
#[derive(Clone, Debug)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.wrapping_add(1) }
    }

    /// Advance state and return next u32
    pub fn next_u32(&mut self) -> u32 {
        // PCG-like state update
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        // Output function
        let mut h = (self.state >> 32) as u32;
        h = h.wrapping_mul(0x45d9f3b);
        h ^= h >> 16;
        h = h.wrapping_mul(0x45d9f3b);
        h ^= h >> 16;
        h
    }

    /// Uniform integer in `[0, bound)`; zero when `bound` is zero
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        // Widening multiply avoids modulo bias for small bounds
        ((self.next_u32() as u64 * bound as u64) >> 32) as usize
    }
}

/// Grid side the default tree shape was tuned for
const REFERENCE_SIZE: usize = 256;

/// Parameters for tree scattering. Sizes are in voxels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// RNG seed; the whole forest is a function of this and the terrain
    pub seed: u64,
    /// Number of placement attempts
    pub count: u32,
    /// Distance from the grid edge that trunks keep, so canopies stay inside
    pub edge_margin: usize,
    /// Shortest trunk
    pub trunk_min: usize,
    /// Trunks are `trunk_min + [0, trunk_extra)` tall
    pub trunk_extra: usize,
    /// Number of canopy layers
    pub canopy_layers: usize,
    /// How far below the trunk top the canopy starts
    pub canopy_overlap: usize,
    /// Canopy disk radius for the lower layers
    pub wide_radius: usize,
    /// Canopy disk radius from `narrow_from_layer` upward
    pub narrow_radius: usize,
    pub narrow_from_layer: usize,
    /// Ground must be more than this far above the water level
    pub water_margin: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            seed: 42,
            count: 30,
            edge_margin: 12,
            trunk_min: 16,
            trunk_extra: 12,
            canopy_layers: 16,
            canopy_overlap: 4,
            wide_radius: 8,
            narrow_radius: 4,
            narrow_from_layer: 12,
            water_margin: 2,
        }
    }
}

impl TreeParams {
    /// Scale the default tree shape to a grid side. Seed, count and water
    /// margin are kept as is.
    pub fn for_grid(size: usize) -> Self {
        let reference = Self::default();
        let scale = |v: usize| ((v * size + REFERENCE_SIZE / 2) / REFERENCE_SIZE).max(1);

        let wide_radius = scale(reference.wide_radius);
        Self {
            edge_margin: scale(reference.edge_margin).max(wide_radius),
            trunk_min: scale(reference.trunk_min),
            trunk_extra: scale(reference.trunk_extra),
            canopy_layers: scale(reference.canopy_layers),
            canopy_overlap: scale(reference.canopy_overlap),
            wide_radius,
            narrow_radius: scale(reference.narrow_radius),
            narrow_from_layer: scale(reference.narrow_from_layer),
            ..reference
        }
    }

    /// Tallest trunk the RNG can produce
    pub fn trunk_max(&self) -> usize {
        self.trunk_min + self.trunk_extra.saturating_sub(1)
    }

    /// Cells from the ground to the top of the tallest possible tree
    pub fn max_height(&self) -> usize {
        let canopy_top = self.trunk_max().saturating_sub(self.canopy_overlap) + self.canopy_layers;
        canopy_top.max(self.trunk_max())
    }

    fn radius_for_layer(&self, layer: usize) -> usize {
        if layer < self.narrow_from_layer {
            self.wide_radius
        } else {
            self.narrow_radius
        }
    }
}

/// What happened at one candidate site
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteOutcome {
    Placed {
        ground: usize,
        trunk_height: usize,
        leaves: usize,
    },
    /// Column holds only air and water
    NoGround,
    /// Tallest possible tree would leave the grid
    NoHeadroom { ground: usize },
    /// Ground too close to (or below) the water surface
    Waterline { ground: usize },
}

/// Tally of one scattering run. Rejections are expected, not errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub requested: u32,
    pub placed: u32,
    pub no_ground: u32,
    pub no_headroom: u32,
    pub waterline: u32,
    /// Attempts skipped because the grid is smaller than twice the margin
    pub skipped: u32,
    pub leaves: usize,
}

impl PlacementReport {
    fn record(&mut self, outcome: SiteOutcome) {
        match outcome {
            SiteOutcome::Placed { leaves, .. } => {
                self.placed += 1;
                self.leaves += leaves;
            }
            SiteOutcome::NoGround => self.no_ground += 1,
            SiteOutcome::NoHeadroom { .. } => self.no_headroom += 1,
            SiteOutcome::Waterline { .. } => self.waterline += 1,
        }
    }

    pub fn rejected(&self) -> u32 {
        self.no_ground + self.no_headroom + self.waterline + self.skipped
    }
}

/// Scatters trees onto an already generated grid
pub struct TreePlacer {
    params: TreeParams,
    /// Water surface in voxels
    water_level: usize,
}

impl TreePlacer {
    pub fn new(params: TreeParams, water_level: usize) -> Self {
        Self { params, water_level }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Make `count` placement attempts with a freshly seeded RNG. Sites that
    /// fail validation are dropped without retry.
    pub fn place_all<const SIZE: usize>(&self, grid: &mut VoxelGrid<SIZE>) -> PlacementReport {
        let mut report = PlacementReport {
            requested: self.params.count,
            ..Default::default()
        };

        let margin = self.params.edge_margin;
        let Some(span) = SIZE.checked_sub(2 * margin).filter(|&s| s > 0) else {
            log::warn!(
                "Grid of side {} leaves no room for trees inside a {} voxel margin",
                SIZE,
                margin
            );
            report.skipped = self.params.count;
            return report;
        };

        let mut rng = SimpleRng::new(self.params.seed);
        for _ in 0..self.params.count {
            let tx = margin + rng.below(span);
            let tz = margin + rng.below(span);

            let outcome = match self.check_site(grid, tx, tz) {
                Ok(ground) => {
                    let trunk_height = self.params.trunk_min + rng.below(self.params.trunk_extra);
                    self.build(grid, tx, tz, ground, trunk_height)
                }
                Err(rejected) => rejected,
            };
            log::trace!("Tree site ({}, {}): {:?}", tx, tz, outcome);
            report.record(outcome);
        }

        report
    }

    /// Place a single tree with an explicit trunk height (clamped to the
    /// configured range). Rejected sites leave the grid untouched.
    pub fn place_tree<const SIZE: usize>(
        &self,
        grid: &mut VoxelGrid<SIZE>,
        tx: usize,
        tz: usize,
        trunk_height: usize,
    ) -> SiteOutcome {
        match self.check_site(grid, tx, tz) {
            Ok(ground) => {
                let trunk_height = trunk_height.clamp(self.params.trunk_min, self.params.trunk_max());
                self.build(grid, tx, tz, ground, trunk_height)
            }
            Err(rejected) => rejected,
        }
    }

    /// Validate a site before anything is written. Returns the ground level.
    fn check_site<const SIZE: usize>(
        &self,
        grid: &VoxelGrid<SIZE>,
        tx: usize,
        tz: usize,
    ) -> Result<usize, SiteOutcome> {
        let ground = grid.ground_level(tx, tz).ok_or(SiteOutcome::NoGround)?;

        if ground + self.params.max_height() >= SIZE {
            return Err(SiteOutcome::NoHeadroom { ground });
        }
        if ground <= self.water_level + self.params.water_margin {
            return Err(SiteOutcome::Waterline { ground });
        }
        Ok(ground)
    }

    fn build<const SIZE: usize>(
        &self,
        grid: &mut VoxelGrid<SIZE>,
        tx: usize,
        tz: usize,
        ground: usize,
        trunk_height: usize,
    ) -> SiteOutcome {
        let trunk_top = ground + trunk_height;
        for y in ground..trunk_top {
            grid.set(tx, y, tz, Block::Wood);
        }

        let leaf_base = trunk_top.saturating_sub(self.params.canopy_overlap).max(ground);
        let mut leaves = 0;

        for layer in 0..self.params.canopy_layers {
            let ly = leaf_base + layer;
            if ly >= SIZE {
                break;
            }

            let radius = self.params.radius_for_layer(layer) as i64;
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    if dx * dx + dz * dz > radius * radius {
                        continue;
                    }
                    if dx == 0 && dz == 0 && ly < trunk_top {
                        continue;
                    }

                    let lx = tx as i64 + dx;
                    let lz = tz as i64 + dz;
                    if lx < 0 || lz < 0 || lx >= SIZE as i64 || lz >= SIZE as i64 {
                        continue;
                    }

                    if grid.set_if_air(lx as usize, ly, lz as usize, Block::Leaf) {
                        leaves += 1;
                    }
                }
            }
        }

        SiteOutcome::Placed {
            ground,
            trunk_height,
            leaves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: usize = 32;
    type Grid = VoxelGrid<SIZE>;

    fn small_params() -> TreeParams {
        TreeParams {
            seed: 7,
            count: 10,
            edge_margin: 4,
            trunk_min: 4,
            trunk_extra: 3,
            canopy_layers: 5,
            canopy_overlap: 2,
            wide_radius: 3,
            narrow_radius: 1,
            narrow_from_layer: 3,
            water_margin: 2,
        }
    }

    /// Flat stone floor with its surface at `height`
    fn floor(height: usize) -> Grid {
        let mut grid = Grid::new();
        for z in 0..SIZE {
            for x in 0..SIZE {
                for y in 0..height {
                    grid.set(x, y, z, Block::Stone);
                }
            }
        }
        grid
    }

    #[test]
    fn test_rng_deterministic() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        let mut c = SimpleRng::new(43);
        assert_ne!(SimpleRng::new(42).next_u32(), c.next_u32());
    }

    #[test]
    fn test_rng_below_in_range() {
        let mut rng = SimpleRng::new(1);
        assert_eq!(rng.below(0), 0);
        for _ in 0..1000 {
            assert!(rng.below(7) < 7);
        }
    }

    #[test]
    fn test_for_grid_reference_size() {
        assert_eq!(TreeParams::for_grid(256), TreeParams::default());

        let small = TreeParams::for_grid(64);
        assert_eq!(small.trunk_min, 4);
        assert_eq!(small.wide_radius, 2);
        assert!(small.edge_margin >= small.wide_radius);
        assert_eq!(small.seed, 42);
    }

    #[test]
    fn test_max_height_covers_canopy() {
        let params = small_params();
        // trunk up to 6, canopy starts 2 below its top and spans 5 layers
        assert_eq!(params.trunk_max(), 6);
        assert_eq!(params.max_height(), 9);
    }

    #[test]
    fn test_tree_shape() {
        let placer = TreePlacer::new(small_params(), 0);
        let mut grid = floor(8);

        let outcome = placer.place_tree(&mut grid, 16, 16, 5);
        let SiteOutcome::Placed { ground, trunk_height, leaves } = outcome else {
            panic!("expected placement, got {outcome:?}");
        };
        assert_eq!(ground, 8);
        assert_eq!(trunk_height, 5);
        assert!(leaves > 0);

        for y in 8..13 {
            assert_eq!(grid.get(16, y, 16), Block::Wood);
        }
        // Canopy base at 13 - 2 = 11, wide radius 3 for layers 0..3
        assert_eq!(grid.get(19, 11, 16), Block::Leaf);
        assert_eq!(grid.get(19, 12, 19), Block::Air, "outside the disk");
        // Narrow layers (y 14, 15) have radius 1
        assert_eq!(grid.get(17, 14, 16), Block::Leaf);
        assert_eq!(grid.get(18, 14, 16), Block::Air);
        // Above the trunk the centre column is leaf
        assert_eq!(grid.get(16, 13, 16), Block::Leaf);
        assert_eq!(grid.count(Block::Leaf), leaves);
    }

    #[test]
    fn test_leaves_never_overwrite() {
        let placer = TreePlacer::new(small_params(), 0);
        let mut grid = floor(8);
        // A stone pillar inside the future canopy
        for y in 8..16 {
            grid.set(18, y, 16, Block::Stone);
        }
        let before = grid.as_bytes().to_vec();

        placer.place_tree(&mut grid, 16, 16, 6);

        for (i, (&old, &new)) in before.iter().zip(grid.as_bytes()).enumerate() {
            if old != new {
                assert_eq!(old, Block::Air.as_u8(), "cell {i} was overwritten");
            }
        }
        assert_eq!(grid.get(18, 12, 16), Block::Stone);
    }

    #[test]
    fn test_no_ground_rejected() {
        let placer = TreePlacer::new(small_params(), 0);
        let mut grid = Grid::new();
        assert_eq!(placer.place_tree(&mut grid, 10, 10, 5), SiteOutcome::NoGround);
        assert_eq!(grid.count(Block::Air), Grid::VOLUME);
    }

    #[test]
    fn test_no_headroom_rejected() {
        let placer = TreePlacer::new(small_params(), 0);
        // ground 23 + max height 9 = 32 >= SIZE
        let mut grid = floor(23);
        let before = grid.as_bytes().to_vec();
        assert_eq!(
            placer.place_tree(&mut grid, 10, 10, 4),
            SiteOutcome::NoHeadroom { ground: 23 }
        );
        assert_eq!(grid.as_bytes(), &before[..]);

        let mut grid = floor(22);
        assert!(matches!(placer.place_tree(&mut grid, 10, 10, 4), SiteOutcome::Placed { .. }));
    }

    #[test]
    fn test_waterline_rejection_is_idempotent() {
        let water_level = 6;
        let params = small_params();
        let placer = TreePlacer::new(params.clone(), water_level);

        // Ground one voxel below water level + margin
        let ground = water_level + params.water_margin - 1;
        let mut grid = floor(ground);
        let before = grid.as_bytes().to_vec();

        assert_eq!(placer.place_tree(&mut grid, 12, 12, 5), SiteOutcome::Waterline { ground });
        assert_eq!(placer.place_tree(&mut grid, 12, 12, 5), SiteOutcome::Waterline { ground });
        assert_eq!(grid.as_bytes(), &before[..]);

        // Exactly at the threshold is still rejected, one above is accepted
        let mut grid = floor(water_level + params.water_margin);
        assert!(matches!(placer.place_tree(&mut grid, 12, 12, 5), SiteOutcome::Waterline { .. }));
        let mut grid = floor(water_level + params.water_margin + 1);
        assert!(matches!(placer.place_tree(&mut grid, 12, 12, 5), SiteOutcome::Placed { .. }));
    }

    #[test]
    fn test_ground_detection_ignores_water() {
        let placer = TreePlacer::new(small_params(), 0);
        let mut grid = floor(6);
        for y in 6..9 {
            grid.set(12, y, 12, Block::Water);
        }
        assert!(matches!(
            placer.place_tree(&mut grid, 12, 12, 4),
            SiteOutcome::Placed { ground: 6, .. }
        ));
        // Trunk starts on the stone and replaces the water above it
        assert_eq!(grid.get(12, 5, 12), Block::Stone);
        assert_eq!(grid.get(12, 6, 12), Block::Wood);
        assert_eq!(grid.get(12, 9, 12), Block::Wood);
    }

    #[test]
    fn test_place_all_report_and_determinism() {
        let placer = TreePlacer::new(small_params(), 0);

        let mut a = floor(8);
        let report_a = placer.place_all(&mut a);
        let mut b = floor(8);
        let report_b = placer.place_all(&mut b);

        assert_eq!(report_a, report_b);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(report_a.requested, 10);
        assert_eq!(report_a.placed + report_a.rejected(), 10);
        assert!(report_a.placed > 0);
        assert_eq!(a.count(Block::Leaf), report_a.leaves);
    }

    #[test]
    fn test_no_wood_below_ground() {
        let placer = TreePlacer::new(small_params(), 0);
        let mut grid = floor(8);
        placer.place_all(&mut grid);
        for z in 0..SIZE {
            for x in 0..SIZE {
                for y in 0..8 {
                    assert_ne!(grid.get(x, y, z), Block::Wood);
                }
            }
        }
    }

    #[test]
    fn test_grid_too_small_for_margin() {
        let params = TreeParams { edge_margin: 16, ..small_params() };
        let placer = TreePlacer::new(params, 0);
        let mut grid = floor(8);
        let report = placer.place_all(&mut grid);
        assert_eq!(report.skipped, 10);
        assert_eq!(report.placed, 0);
    }
}
