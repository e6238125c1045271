//! Scene lighting state and GPU uniform block layouts
//!
//! `SceneLighting` is the host-side description of the scene's ambient light
//! and single spotlight. The `*Ubo` structs mirror the shader's uniform block
//! layouts byte-for-byte; their field order and padding must not change
//! independently of the shaders.

use crate::foundation::math::{Mat4, Vec3};

/// View and projection matrices, set 0 binding 0 in the vertex stage
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ViewProjectionUbo {
    /// Projection matrix, column-major
    pub projection: [[f32; 4]; 4],
    /// View matrix, column-major
    pub view: [[f32; 4]; 4],
}

unsafe impl bytemuck::Pod for ViewProjectionUbo {}
unsafe impl bytemuck::Zeroable for ViewProjectionUbo {}

impl ViewProjectionUbo {
    /// Identity matrices; overwritten before the first frame
    pub fn identity() -> Self {
        Self {
            projection: Mat4::identity().into(),
            view: Mat4::identity().into(),
        }
    }
}

/// Spotlight block within [`LightingUbo`]
///
/// The trailing `_padding` keeps the struct at the 64-byte size the fragment
/// shader block declares.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpotlightUbo {
    /// Direction the spotlight points
    pub direction: [f32; 3],
    /// Diffuse intensity
    pub diffuse_strength: f32,
    /// Light color
    pub color: [f32; 3],
    /// Specular intensity
    pub specular_strength: f32,
    /// Specular shininess exponent
    pub shininess: f32,
    /// Cosine of the inner cone angle
    pub inner_cutoff: f32,
    /// Cosine of the outer cone angle
    pub outer_cutoff: f32,
    /// World-space position (w unused)
    pub position: [f32; 4],
    _padding: f32,
}

unsafe impl bytemuck::Pod for SpotlightUbo {}
unsafe impl bytemuck::Zeroable for SpotlightUbo {}

/// Lighting block, set 0 binding 1 in the fragment stage
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LightingUbo {
    /// Ambient light color
    pub ambient_color: [f32; 3],
    /// Ambient light intensity
    pub ambient_strength: f32,
    /// Spotlight array; a single light in this design
    pub spotlights: [SpotlightUbo; 1],
}

unsafe impl bytemuck::Pod for LightingUbo {}
unsafe impl bytemuck::Zeroable for LightingUbo {}

/// Host-side lighting state
///
/// Holds the scene's ambient term and one spotlight. The renderer repositions
/// the spotlight from a source model each frame and serializes the state into
/// a [`LightingUbo`] for upload.
#[derive(Debug, Clone)]
pub struct SceneLighting {
    /// Ambient light color
    pub ambient_color: Vec3,
    /// Ambient light intensity
    pub ambient_strength: f32,
    /// Spotlight world-space position
    pub spotlight_position: Vec3,
    /// Spotlight direction
    pub spotlight_direction: Vec3,
    /// Spotlight color
    pub spotlight_color: Vec3,
    /// Diffuse intensity
    pub diffuse_strength: f32,
    /// Specular intensity
    pub specular_strength: f32,
    /// Specular shininess exponent
    pub shininess: f32,
    /// Inner cone angle in degrees
    pub inner_cutoff_degrees: f32,
    /// Outer cone angle in degrees
    pub outer_cutoff_degrees: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::new(1.0, 1.0, 1.0),
            ambient_strength: 0.2,
            spotlight_position: Vec3::zeros(),
            spotlight_direction: Vec3::new(1.0, 0.0, 0.0),
            spotlight_color: Vec3::new(0.5, 0.5, 0.5),
            diffuse_strength: 0.8,
            specular_strength: 0.8,
            shininess: 12.0,
            inner_cutoff_degrees: 15.0,
            outer_cutoff_degrees: 25.0,
        }
    }
}

impl SceneLighting {
    /// Point the spotlight from `position` along `direction`
    pub fn set_spotlight(&mut self, position: Vec3, direction: Vec3) {
        self.spotlight_position = position;
        self.spotlight_direction = direction;
    }

    /// Serialize into the GPU uniform block layout
    pub fn to_ubo(&self) -> LightingUbo {
        LightingUbo {
            ambient_color: self.ambient_color.into(),
            ambient_strength: self.ambient_strength,
            spotlights: [SpotlightUbo {
                direction: self.spotlight_direction.into(),
                diffuse_strength: self.diffuse_strength,
                color: self.spotlight_color.into(),
                specular_strength: self.specular_strength,
                shininess: self.shininess,
                inner_cutoff: self.inner_cutoff_degrees.to_radians().cos(),
                outer_cutoff: self.outer_cutoff_degrees.to_radians().cos(),
                position: [
                    self.spotlight_position.x,
                    self.spotlight_position.y,
                    self.spotlight_position.z,
                    0.0,
                ],
                _padding: 0.0,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn ubo_sizes_match_shader_blocks() {
        assert_eq!(mem::size_of::<ViewProjectionUbo>(), 128);
        assert_eq!(mem::size_of::<SpotlightUbo>(), 64);
        assert_eq!(mem::size_of::<LightingUbo>(), 80);
    }

    #[test]
    fn cutoffs_are_stored_as_cosines() {
        let ubo = SceneLighting::default().to_ubo();
        let spot = &ubo.spotlights[0];
        assert!((spot.inner_cutoff - 15f32.to_radians().cos()).abs() < 1e-6);
        assert!((spot.outer_cutoff - 25f32.to_radians().cos()).abs() < 1e-6);
        // Inner cone is narrower, so its cosine is larger
        assert!(spot.inner_cutoff > spot.outer_cutoff);
    }

    #[test]
    fn serialization_is_idempotent() {
        let lighting = SceneLighting::default();
        let first = lighting.to_ubo();
        let second = lighting.to_ubo();
        assert_eq!(
            bytemuck::bytes_of(&first),
            bytemuck::bytes_of(&second),
            "identical state must serialize to identical bytes"
        );
    }
}
