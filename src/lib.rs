//! Voxglow - procedural voxel terrain with a raymarch + bloom renderer

pub mod core;
pub mod terrain;
pub mod voxel;
pub mod render;
pub mod scene;
