//! Scene models
//!
//! A [`Model`] owns the GPU meshes produced when its file was loaded, plus a
//! world transform rebuilt from position and orientation angles. Orientation
//! is chosen at construction through the [`Orientation`] variant: either
//! explicit Euler angles or a look-at target the angles are derived from.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::vulkan::Mesh;
use glfw::Key;

/// Orientation strategy selected when a model is spawned
#[derive(Debug, Clone, Copy)]
pub enum Orientation {
    /// Explicit angles in degrees: yaw about +Y, pitch about +Z
    Euler {
        /// Rotation about the Y axis in degrees
        yaw_degrees: f32,
        /// Rotation about the Z axis in degrees
        pitch_degrees: f32,
    },
    /// Face a world-space target point from the spawn position
    LookAt {
        /// Point the model should face
        target: Vec3,
    },
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Euler {
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
        }
    }
}

/// Parameters for placing a freshly loaded model in the scene
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelSpawn {
    /// World-space position
    pub position: Vec3,
    /// Orientation strategy
    pub orientation: Orientation,
    /// Whether the arrow/keypad keys move this model
    pub controllable: bool,
}

/// A loaded model instance in the scene
pub struct Model {
    meshes: Vec<Mesh>,
    transform: Mat4,
    position: Vec3,
    yaw_degrees: f32,
    pitch_degrees: f32,
    controllable: bool,
}

impl Model {
    /// Build a model from its GPU meshes and spawn parameters
    pub fn new(meshes: Vec<Mesh>, spawn: ModelSpawn) -> Self {
        let (yaw_degrees, pitch_degrees) = match spawn.orientation {
            Orientation::Euler {
                yaw_degrees,
                pitch_degrees,
            } => (yaw_degrees, pitch_degrees),
            Orientation::LookAt { target } => angles_toward(spawn.position, target),
        };

        let mut model = Self {
            meshes,
            transform: Mat4::identity(),
            position: spawn.position,
            yaw_degrees,
            pitch_degrees,
            controllable: spawn.controllable,
        };
        model.rebuild_transform();
        model
    }

    /// Number of meshes in this model
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Access a mesh by index
    ///
    /// # Panics
    /// Panics when `index` is out of range; an invalid mesh index is a
    /// programmer error, never a recoverable condition.
    pub fn mesh(&self, index: usize) -> &Mesh {
        assert!(
            index < self.meshes.len(),
            "mesh index {} out of range for model with {} meshes",
            index,
            self.meshes.len()
        );
        &self.meshes[index]
    }

    /// Iterate over the model's meshes
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter()
    }

    /// Current world transform
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Replace the world transform wholesale
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit vector the model is facing
    ///
    /// Zero yaw and pitch face down +X; yaw turns about +Y, pitch lifts
    /// toward +Y.
    pub fn facing(&self) -> Vec3 {
        let yaw = utils::deg_to_rad(self.yaw_degrees);
        let pitch = utils::deg_to_rad(self.pitch_degrees);
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// Whether this model responds to key control
    pub fn controllable(&self) -> bool {
        self.controllable
    }

    /// Apply movement and rotation from the currently pressed keys
    ///
    /// Arrow keys translate on the X/Y axes, keypad 4/6 yaw and keypad 8/2
    /// pitch. Does nothing for non-controllable models.
    pub fn key_control(&mut self, keys: &[bool], delta_time: f32, move_speed: f32, turn_speed: f32) {
        if !self.controllable {
            return;
        }

        if keys[Key::Left as usize] {
            self.position.x -= move_speed * delta_time;
        }
        if keys[Key::Right as usize] {
            self.position.x += move_speed * delta_time;
        }
        if keys[Key::Up as usize] {
            self.position.y += move_speed * delta_time;
        }
        if keys[Key::Down as usize] {
            self.position.y -= move_speed * delta_time;
        }

        if keys[Key::Kp4 as usize] {
            self.yaw_degrees -= turn_speed * delta_time;
        }
        if keys[Key::Kp6 as usize] {
            self.yaw_degrees += turn_speed * delta_time;
        }
        if keys[Key::Kp8 as usize] {
            self.pitch_degrees -= turn_speed * delta_time;
        }
        if keys[Key::Kp2 as usize] {
            self.pitch_degrees += turn_speed * delta_time;
        }

        self.rebuild_transform();
    }

    fn rebuild_transform(&mut self) {
        self.transform = Mat4::new_translation(&self.position)
            * Mat4::rotation_y(utils::deg_to_rad(self.yaw_degrees))
            * Mat4::rotation_z(utils::deg_to_rad(self.pitch_degrees));
    }
}

/// Derive (yaw, pitch) in degrees so that [`Model::facing`] points from
/// `position` toward `target`
fn angles_toward(position: Vec3, target: Vec3) -> (f32, f32) {
    let direction = target - position;
    if direction.norm() < f32::EPSILON {
        return (0.0, 0.0);
    }
    let direction = direction.normalize();
    let yaw = direction.z.atan2(direction.x);
    let pitch = direction.y.asin();
    (utils::rad_to_deg(yaw), utils::rad_to_deg(pitch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn_at(position: Vec3, orientation: Orientation) -> Model {
        Model::new(
            Vec::new(),
            ModelSpawn {
                position,
                orientation,
                controllable: false,
            },
        )
    }

    #[test]
    #[should_panic(expected = "mesh index 0 out of range")]
    fn mesh_access_at_list_size_panics() {
        let model = spawn_at(Vec3::zeros(), Orientation::default());
        let _ = model.mesh(model.mesh_count());
    }

    #[test]
    fn look_at_orientation_faces_the_target() {
        let position = Vec3::new(0.0, 0.0, 0.0);
        let target = Vec3::new(-1.0, 0.0, 0.0);
        let model = spawn_at(position, Orientation::LookAt { target });

        let facing = model.facing();
        assert_relative_eq!(facing.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(facing.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(facing.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn euler_orientation_defaults_to_positive_x() {
        let model = spawn_at(Vec3::zeros(), Orientation::default());
        let facing = model.facing();
        assert_relative_eq!(facing.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn spawn_position_lands_in_the_transform_translation() {
        let model = spawn_at(Vec3::new(200.0, -20.0, 0.0), Orientation::default());
        let transform = model.transform();
        assert_relative_eq!(transform[(0, 3)], 200.0, epsilon = 1e-5);
        assert_relative_eq!(transform[(1, 3)], -20.0, epsilon = 1e-5);
        assert_relative_eq!(transform[(2, 3)], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn uncontrollable_models_ignore_key_input() {
        let mut model = spawn_at(Vec3::zeros(), Orientation::default());
        let mut keys = [false; 1024];
        keys[Key::Right as usize] = true;

        model.key_control(&keys, 1.0, 8.0, 10.0);
        assert_relative_eq!(model.position().x, 0.0);
    }

    #[test]
    fn controllable_model_moves_with_arrow_keys() {
        let mut model = Model::new(
            Vec::new(),
            ModelSpawn {
                position: Vec3::zeros(),
                orientation: Orientation::default(),
                controllable: true,
            },
        );
        let mut keys = [false; 1024];
        keys[Key::Right as usize] = true;

        model.key_control(&keys, 0.5, 8.0, 10.0);
        assert_relative_eq!(model.position().x, 4.0, epsilon = 1e-5);
    }
}
