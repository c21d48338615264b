//! Render pipelines

pub mod raymarch;
pub mod post;

pub use raymarch::{RaymarchPipeline, RaymarchUniforms};
pub use post::{PostParams, PostPipeline};
