//! Procedural content placed on top of generated terrain

pub mod tree;

pub use tree::{PlacementReport, SimpleRng, SiteOutcome, TreeParams, TreePlacer};
