//! Procedural terrain generation

pub mod noise;
pub mod height;
pub mod generator;

pub use generator::{TerrainGenerator, TerrainParams, TerrainStats};
pub use height::{HeightFunction, HeightModel, LayeredHeight, PerlinHeight, PerlinParams, SineHeight};
pub use self::noise::{fbm, hash, smooth_noise, NoiseBand};
