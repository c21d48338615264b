//! Scene configuration loaded from JSON

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::camera::Camera;
use crate::core::types::{Result, Vec3};
use crate::terrain::TerrainParams;
use crate::voxel::TreeParams;

/// Switches and tunables for the raymarch + bloom pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Run bright-pass, blur and composite after the raymarch
    pub bloom: bool,
    /// Raymarch at half the window resolution
    pub half_resolution: bool,
    /// Luminance above which pixels feed the bloom
    pub bloom_threshold: f32,
    /// Weight of the blurred bloom added back in composite
    pub bloom_intensity: f32,
    /// Exposure applied before tone mapping
    pub exposure: f32,
    /// Direction towards the sun, normalized before use
    pub sun_direction: Vec3,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            bloom: true,
            half_resolution: true,
            bloom_threshold: 0.8,
            bloom_intensity: 0.6,
            exposure: 1.0,
            sun_direction: Vec3::new(0.4, 0.8, 0.3),
        }
    }
}

impl RenderSettings {
    /// Unit sun direction. Falls back to straight up for a zero vector.
    pub fn sun_dir(&self) -> Vec3 {
        self.sun_direction.try_normalize().unwrap_or(Vec3::Y)
    }
}

/// Everything the viewer needs to build and show a world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Terrain generation parameters
    pub terrain: TerrainParams,
    /// Tree scattering parameters
    pub trees: TreeParams,
    pub render: RenderSettings,
    /// Initial camera pose and projection
    pub camera: Camera,
    /// Camera movement speed in voxels per second
    pub camera_speed: f32,
    /// Mouse look sensitivity in degrees per pixel
    pub mouse_sensitivity: f32,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            trees: TreeParams::default(),
            render: RenderSettings::default(),
            // Outside the grid edge, above the hills, looking across
            camera: Camera::new(Vec3::new(128.0, 160.0, -40.0), 90.0, -25.0),
            camera_speed: 26.0,
            mouse_sensitivity: 0.1,
            window_width: 1280,
            window_height: 720,
        }
    }
}

impl SceneConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Effective config as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
