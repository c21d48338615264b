//! Scene configuration

pub mod config;

pub use config::{RenderSettings, SceneConfig};
