//! Column height strategies
//!
//! A [`HeightFunction`] maps normalized column coordinates to a surface height
//! in voxels. [`TerrainGenerator`](super::TerrainGenerator) owns the clamping,
//! block layering and water fill, so strategies can be swapped freely.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::noise::NoiseBand;

/// Computes the unclamped surface height of one column
pub trait HeightFunction {
    /// `fx`, `fz` are column coordinates divided by the grid side (`0..1`).
    /// Returns a height in voxels for a grid of side `size`.
    fn height(&self, fx: f32, fz: f32, size: usize) -> f32;
}

/// Selects the height strategy in configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightModel {
    /// Three summed sine waves, no noise
    Sine,
    /// Continental + detail + ridged value-noise fBm
    #[default]
    Layered,
    /// Perlin fBm from the `noise` crate
    Perlin,
}

/// Rolling hills from three sine waves.
///
/// All heights are fractions of the grid side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SineHeight {
    pub base: f32,
    /// `(amplitude, cycles across the grid)` along x, along z, and diagonally
    pub x_wave: (f32, f32),
    pub z_wave: (f32, f32),
    pub diagonal_wave: (f32, f32),
}

impl Default for SineHeight {
    fn default() -> Self {
        Self {
            base: 0.25,
            x_wave: (0.094, 2.0),
            z_wave: (0.0625, 3.0),
            diagonal_wave: (0.047, 1.5),
        }
    }
}

impl HeightFunction for SineHeight {
    fn height(&self, fx: f32, fz: f32, size: usize) -> f32 {
        use std::f32::consts::TAU;

        let h = self.base
            + self.x_wave.0 * (fx * TAU * self.x_wave.1).sin()
            + self.z_wave.0 * (fz * TAU * self.z_wave.1).sin()
            + self.diagonal_wave.0 * ((fx + fz) * TAU * self.diagonal_wave.1).sin();
        h * size as f32
    }
}

/// Layered value-noise terrain.
///
/// `height = base + continental·w1 + detail·w2 + ridged·w3`, where `ridged` is
/// the `(1 - |n|)²` fold of its band. Base and weights are fractions of the
/// grid side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredHeight {
    pub base: f32,
    pub continental: NoiseBand,
    pub continental_weight: f32,
    pub detail: NoiseBand,
    pub detail_weight: f32,
    pub ridged: NoiseBand,
    pub ridged_weight: f32,
}

impl Default for LayeredHeight {
    fn default() -> Self {
        Self {
            base: 0.30,
            continental: NoiseBand::new(2.0, [0.0, 0.0], 4),
            continental_weight: 0.16,
            detail: NoiseBand::new(16.0, [31.7, 47.3], 3),
            detail_weight: 0.025,
            ridged: NoiseBand::new(5.0, [-19.1, 83.9], 4),
            ridged_weight: 0.14,
        }
    }
}

impl HeightFunction for LayeredHeight {
    fn height(&self, fx: f32, fz: f32, size: usize) -> f32 {
        let continental = self.continental.sample(fx, fz);
        let detail = self.detail.sample(fx, fz);
        let ridged = self.ridged.sample_ridged(fx, fz);

        let h = self.base
            + continental * self.continental_weight
            + detail * self.detail_weight
            + ridged * self.ridged_weight;
        h * size as f32
    }
}

/// Perlin fBm heights; the only strategy that takes a seed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerlinParams {
    pub seed: u32,
    /// Noise cycles across the grid side
    pub frequency: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Height of the noise zero crossing, fraction of grid side
    pub base: f32,
    /// Height swing for noise ±1, fraction of grid side
    pub amplitude: f32,
}

impl Default for PerlinParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            frequency: 3.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            base: 0.35,
            amplitude: 0.2,
        }
    }
}

pub struct PerlinHeight {
    params: PerlinParams,
    noise: Fbm<Perlin>,
}

impl PerlinHeight {
    pub fn new(params: PerlinParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves.max(1) as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }
}

impl HeightFunction for PerlinHeight {
    fn height(&self, fx: f32, fz: f32, size: usize) -> f32 {
        let nx = (fx * self.params.frequency) as f64;
        let nz = (fz * self.params.frequency) as f64;
        let n = self.noise.get([nx, nz]) as f32;

        (self.params.base + n * self.params.amplitude) * size as f32
    }
}
