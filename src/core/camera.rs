//! Yaw/pitch fly camera

use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Vec3};

/// Narrowest zoom allowed by [`Camera::zoom`], in degrees
pub const MIN_FOV: f32 = 1.0;
/// Widest zoom allowed by [`Camera::zoom`], in degrees
pub const MAX_FOV: f32 = 45.0;
/// Pitch limit in degrees, keeps the view basis well defined
pub const PITCH_LIMIT: f32 = 89.0;

/// Camera with position, yaw/pitch orientation and projection parameters.
///
/// Angles are stored in degrees. Yaw 0 looks down +X, yaw 90 looks down +Z.
/// The renderer consumes the camera by value each frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation around the world Y axis, degrees
    pub yaw: f32,
    /// Elevation above the horizon, degrees
    pub pitch: f32,
    /// Vertical field of view, degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a camera at `position` looking along yaw/pitch
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: MAX_FOV,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Forward direction derived from yaw and pitch
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// Right direction (horizontal, perpendicular to forward)
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    /// Get projection matrix for a framebuffer aspect ratio
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Get inverse view-projection matrix (for ray generation)
    pub fn view_projection_inverse(&self, aspect: f32) -> Mat4 {
        self.view_projection(aspect).inverse()
    }

    /// Turn by yaw/pitch offsets in degrees; pitch is clamped
    pub fn rotate(&mut self, yaw_offset: f32, pitch_offset: f32) {
        self.yaw += yaw_offset;
        self.pitch = (self.pitch + pitch_offset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Narrow (positive offset) or widen the field of view
    pub fn zoom(&mut self, offset: f32) {
        self.fov = (self.fov - offset).clamp(MIN_FOV, MAX_FOV);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0)
    }
}
