//! Mesh data structures
//!
//! CPU-side vertex and mesh definitions. The vertex field order is load
//! bearing: the pipeline's vertex attribute offsets are derived from this
//! exact layout, so `position`, `color`, `tex_coord`, `normal` must stay in
//! declaration order.

/// Per-vertex data uploaded to the GPU
///
/// `#[repr(C)]` guarantees the field layout the vertex input attributes
/// describe byte-for-byte.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Vertex color
    pub color: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
    /// Normal vector
    pub normal: [f32; 3],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], color: [f32; 3], tex_coord: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            color,
            tex_coord,
            normal,
        }
    }
}

/// CPU-side mesh data as produced by the model loader
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Vertex list
    pub vertices: Vec<Vertex>,
    /// Triangle-list index buffer contents
    pub indices: Vec<u32>,
    /// Material table index, `None` when the file assigns no material
    pub material_id: Option<usize>,
}

impl MeshData {
    /// Whether the index list describes whole triangles
    pub fn is_triangle_list(&self) -> bool {
        !self.indices.is_empty() && self.indices.len() % 3 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn vertex_is_tightly_packed() {
        // 3 + 3 + 2 + 3 floats, no padding
        assert_eq!(mem::size_of::<Vertex>(), 44);
    }

    #[test]
    fn triangle_list_check_rejects_partial_triangles() {
        let mesh = MeshData {
            vertices: vec![Vertex::new([0.0; 3], [1.0; 3], [0.0; 2], [0.0; 3]); 3],
            indices: vec![0, 1, 2, 0],
            material_id: None,
        };
        assert!(!mesh.is_triangle_list());

        let mesh = MeshData {
            indices: vec![0, 1, 2],
            ..mesh
        };
        assert!(mesh.is_triangle_list());
    }
}
