//! OBJ model loading
//!
//! Parses an OBJ file (with its MTL companion when present) into a flat list
//! of per-mesh vertex/index data plus a material-to-texture-filename table.
//! An empty filename entry means "no texture, use the default".

use crate::assets::AssetError;
pub use crate::render::mesh::MeshData;
use crate::render::mesh::Vertex;
use std::path::Path;

/// A model file decoded into mesh data and material texture names
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// One entry per mesh in the file
    pub meshes: Vec<MeshData>,
    /// Diffuse texture filename per material id; empty string = no texture
    pub material_textures: Vec<String>,
}

/// Load an OBJ file and its materials
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<LoadedModel, AssetError> {
    let path_ref = path.as_ref();

    let (models, materials) = tobj::load_obj(path_ref, &tobj::GPU_LOAD_OPTIONS).map_err(|e| {
        AssetError::LoadFailed(format!("failed to load model {:?}: {}", path_ref, e))
    })?;

    // A missing MTL file is not fatal; the meshes fall back to texture id 0.
    let materials = materials.unwrap_or_default();

    let material_textures: Vec<String> = materials
        .iter()
        .map(|m| {
            m.diffuse_texture
                .as_deref()
                .map(strip_directories)
                .unwrap_or_default()
        })
        .collect();

    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        meshes.push(mesh_from_tobj(&model.mesh)?);
    }

    log::info!(
        "loaded model {:?}: {} meshes, {} materials",
        path_ref,
        meshes.len(),
        material_textures.len()
    );

    Ok(LoadedModel {
        meshes,
        material_textures,
    })
}

fn mesh_from_tobj(mesh: &tobj::Mesh) -> Result<MeshData, AssetError> {
    if mesh.positions.len() % 3 != 0 {
        return Err(AssetError::InvalidData(
            "vertex position stream is not a multiple of 3".to_string(),
        ));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(AssetError::InvalidData(
            "index stream does not describe whole triangles".to_string(),
        ));
    }

    let vertex_count = mesh.positions.len() / 3;
    let mut vertices = Vec::with_capacity(vertex_count);

    for i in 0..vertex_count {
        let position = [
            mesh.positions[i * 3],
            mesh.positions[i * 3 + 1],
            mesh.positions[i * 3 + 2],
        ];

        let tex_coord = if mesh.texcoords.len() >= (i + 1) * 2 {
            [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
        } else {
            [0.0, 0.0]
        };

        let normal = if mesh.normals.len() >= (i + 1) * 3 {
            [
                mesh.normals[i * 3],
                mesh.normals[i * 3 + 1],
                mesh.normals[i * 3 + 2],
            ]
        } else {
            [0.0, 0.0, 0.0]
        };

        // Vertex color is unused by the OBJ format; default to white.
        vertices.push(Vertex::new(position, [1.0, 1.0, 1.0], tex_coord, normal));
    }

    Ok(MeshData {
        vertices,
        indices: mesh.indices.clone(),
        material_id: mesh.material_id,
    })
}

/// Strip any directory components so texture names resolve against the
/// configured texture directory only
fn strip_directories(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    fn load_fixture(tag: &str, contents: &str) -> LoadedModel {
        let dir = std::env::temp_dir().join("torch_engine_model_loader_tests");
        std::fs::create_dir_all(&dir).expect("create fixture dir");
        let path = dir.join(format!("{}_{}.obj", tag, std::process::id()));
        std::fs::write(&path, contents).expect("write fixture");
        let loaded = load_obj(&path).expect("load fixture");
        let _ = std::fs::remove_file(&path);
        loaded
    }

    #[test]
    fn triangle_obj_loads_one_mesh_with_whole_triangles() {
        let loaded = load_fixture("triangle", TRIANGLE_OBJ);
        assert_eq!(loaded.meshes.len(), 1);

        let mesh = &loaded.meshes[0];
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.is_triangle_list());

        // OBJ carries no vertex colors; the loader defaults them to white.
        assert_eq!(mesh.vertices[0].color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_materials_produce_empty_table() {
        let loaded = load_fixture("no_materials", TRIANGLE_OBJ);
        assert!(loaded.material_textures.is_empty());
        assert_eq!(loaded.meshes[0].material_id, None);
    }

    #[test]
    fn strip_directories_keeps_bare_filenames() {
        assert_eq!(strip_directories("textures\\hull.png"), "hull.png");
        assert_eq!(strip_directories("a/b/hull.png"), "hull.png");
        assert_eq!(strip_directories("hull.png"), "hull.png");
    }
}
