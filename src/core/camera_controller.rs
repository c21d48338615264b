//! Fly-camera controller

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::core::camera::Camera;
use crate::core::input::InputState;

/// Keys held for sprinting
const SPRINT_KEYS: [KeyCode; 2] = [KeyCode::ControlLeft, KeyCode::ControlRight];

/// WASD along the view, Space/Shift along world up, mouse look while the
/// cursor is captured, scroll wheel zoom
pub struct FpsCameraController {
    /// Voxels per second
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse motion
    pub sensitivity: f32,
    /// Speed factor while a Ctrl key is held
    pub sprint_multiplier: f32,
}

impl FpsCameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            sprint_multiplier: 2.0,
        }
    }

    /// Unit movement direction requested by the held keys, zero if none or
    /// if opposing keys cancel out
    pub fn move_direction(camera: &Camera, input: &InputState) -> Vec3 {
        let axis = |plus: &[KeyCode], minus: &[KeyCode]| {
            let held = |keys: &[KeyCode]| keys.iter().any(|&k| input.is_key_pressed(k));
            held(plus) as i32 as f32 - held(minus) as i32 as f32
        };

        let forward = axis(&[KeyCode::KeyW], &[KeyCode::KeyS]);
        let strafe = axis(&[KeyCode::KeyD], &[KeyCode::KeyA]);
        let lift = axis(&[KeyCode::Space], &[KeyCode::ShiftLeft, KeyCode::ShiftRight]);

        (camera.forward() * forward + camera.right() * strafe + Vec3::Y * lift).normalize_or_zero()
    }

    /// Apply one frame of input to `camera`
    pub fn update(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        if input.is_mouse_captured() {
            let (dx, dy) = input.mouse_delta();
            // Screen y grows downward
            camera.rotate(dx * self.sensitivity, -dy * self.sensitivity);
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            camera.zoom(scroll);
        }

        let direction = Self::move_direction(camera, input);
        if direction != Vec3::ZERO {
            let sprinting = SPRINT_KEYS.iter().any(|&k| input.is_key_pressed(k));
            let speed = if sprinting { self.speed * self.sprint_multiplier } else { self.speed };
            camera.position += direction * speed * dt;
        }
    }
}

impl Default for FpsCameraController {
    fn default() -> Self {
        Self::new(26.0, 0.1)
    }
}
