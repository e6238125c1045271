//! First-person camera
//!
//! Yaw/pitch camera with keyboard movement and mouse-delta turning. All of
//! the trigonometry lives here; the renderer only ever asks for the derived
//! position/front/up vectors when it rebuilds the view matrix.

use crate::foundation::math::{utils, Vec3};
use glfw::Key;

/// First-person camera driven by key state and mouse deltas
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,

    /// Horizontal angle in degrees
    yaw: f32,
    /// Vertical angle in degrees, clamped to (-89, 89)
    pitch: f32,

    move_speed: f32,
    turn_speed: f32,
}

impl Camera {
    /// Create a camera at `position` with the given starting orientation
    pub fn new(
        position: Vec3,
        world_up: Vec3,
        yaw_degrees: f32,
        pitch_degrees: f32,
        move_speed: f32,
        turn_speed: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::new(0.0, 0.0, -1.0),
            up: world_up,
            right: Vec3::new(1.0, 0.0, 0.0),
            world_up,
            yaw: yaw_degrees,
            pitch: pitch_degrees,
            move_speed,
            turn_speed,
        };
        camera.update_vectors();
        camera
    }

    /// Apply movement from the currently pressed keys
    ///
    /// W/S move along the view direction, A/D strafe, Space/LeftControl move
    /// along the camera's up vector. Scaled by `delta_time` so movement speed
    /// is frame-rate independent.
    pub fn key_control(&mut self, keys: &[bool], delta_time: f32) {
        let velocity = self.move_speed * delta_time;

        if keys[Key::W as usize] {
            self.position += self.front * velocity;
        }
        if keys[Key::S as usize] {
            self.position -= self.front * velocity;
        }
        if keys[Key::A as usize] {
            self.position -= self.right * velocity;
        }
        if keys[Key::D as usize] {
            self.position += self.right * velocity;
        }
        if keys[Key::Space as usize] {
            self.position += self.up * velocity;
        }
        if keys[Key::LeftControl as usize] {
            self.position -= self.up * velocity;
        }
    }

    /// Apply turning from mouse movement deltas
    pub fn mouse_control(&mut self, x_change: f32, y_change: f32) {
        self.yaw += x_change * self.turn_speed;
        self.pitch += y_change * self.turn_speed;

        // Keep the camera from flipping over the vertical
        self.pitch = self.pitch.clamp(-89.0, 89.0);

        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let yaw = utils::deg_to_rad(self.yaw);
        let pitch = utils::deg_to_rad(self.pitch);

        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );

        self.front = front.normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalized view direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Camera up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Move the camera to a new position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::new(50.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            -90.0,
            0.0,
            10.0,
            0.5,
        )
    }

    #[test]
    fn front_vector_points_down_negative_z_at_minus_ninety_yaw() {
        let camera = test_camera();
        let front = camera.front();
        assert_relative_eq!(front.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(front.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(front.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_clamped_at_eighty_nine_degrees() {
        let mut camera = test_camera();
        camera.mouse_control(0.0, 10_000.0);
        // Front must stay short of straight up
        assert!(camera.front().y < 1.0);
        assert_relative_eq!(camera.front().y, 89f32.to_radians().sin(), epsilon = 1e-5);
    }

    #[test]
    fn key_control_moves_along_front() {
        let mut camera = test_camera();
        let mut keys = [false; 1024];
        keys[Key::W as usize] = true;

        camera.key_control(&keys, 0.5);

        // move_speed 10.0 * dt 0.5 = 5.0 units along front (0, 0, -1)
        let pos = camera.position();
        assert_relative_eq!(pos.x, 50.0, epsilon = 1e-4);
        assert_relative_eq!(pos.z, -5.0, epsilon = 1e-4);
    }

    #[test]
    fn strafe_is_perpendicular_to_front() {
        let mut camera = test_camera();
        let mut keys = [false; 1024];
        keys[Key::D as usize] = true;

        camera.key_control(&keys, 1.0);

        let moved = camera.position() - Vec3::new(50.0, 0.0, 0.0);
        assert_relative_eq!(moved.dot(&camera.front()), 0.0, epsilon = 1e-4);
        assert_relative_eq!(moved.norm(), 10.0, epsilon = 1e-4);
    }
}
